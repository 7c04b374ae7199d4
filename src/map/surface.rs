// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interactive egui map canvas.
//!
//! Implements the rendering surface the view synchronizer drives: a tiled
//! Web Mercator map with pin markers, caption popups, drag to pan and
//! scroll or pinch to zoom.

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};
use log::info;
use plotter_core::projection::MAX_LATITUDE;
use plotter_core::{
    fit_bounds, BoundingBox, LatLon, MarkerIcon, RenderingSurface, SurfaceError, SurfaceHost, SurfaceOptions,
    TileLayer, WebMercator,
};

use super::tiles::{TileManager, TILE_SIZE};

/// Size assumed for fitting until the canvas has been measured
const DEFAULT_VIEWPORT: Vec2 = Vec2::new(800.0, 500.0);

/// Scroll distance that changes the zoom by one level
const SCROLL_PER_ZOOM_LEVEL: f32 = 60.0;

const PIN_FILL: Color32 = Color32::from_rgb(42, 129, 203);
const PIN_STROKE: Color32 = Color32::from_rgb(30, 80, 140);

#[derive(Debug, Clone)]
struct Marker {
    position: LatLon,
    label: String,
}

/// Map canvas state kept across frames
#[derive(Debug)]
pub struct EguiMapSurface {
    ctx: egui::Context,
    center: LatLon,
    zoom: u8,
    icon: MarkerIcon,
    tiles: Option<TileManager>,
    tile_cache_days: u64,
    markers: Vec<Marker>,
    open_caption: Option<usize>,
    viewport: Vec2,
    needs_measure: bool,
    fitted: Option<(BoundingBox, f32)>,
    scroll_accum: f32,
    pinch_accum: f32,
}

impl EguiMapSurface {
    fn new(ctx: egui::Context, options: &SurfaceOptions, tile_cache_days: u64) -> Self {
        Self {
            ctx,
            center: options.initial_center,
            zoom: options.initial_zoom,
            icon: options.marker_icon.clone(),
            tiles: None,
            tile_cache_days,
            markers: Vec::new(),
            open_caption: None,
            viewport: DEFAULT_VIEWPORT,
            needs_measure: true,
            fitted: None,
            scroll_accum: 0.0,
            pinch_accum: 0.0,
        }
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn max_zoom(&self) -> u8 {
        self.tiles.as_ref().map_or(TileLayer::default().max_zoom, |t| t.layer().max_zoom)
    }

    fn apply_fit(&mut self, bounds: BoundingBox, padding_px: f32) {
        let (center, zoom) = fit_bounds(&bounds, [self.viewport.x, self.viewport.y], padding_px, self.max_zoom());
        self.center = center;
        self.zoom = zoom;
    }

    fn measure(&mut self, size: Vec2) {
        self.needs_measure = false;
        if size == self.viewport {
            return;
        }
        self.viewport = size;
        // An untouched fit is redone against the real canvas size
        if let Some((bounds, padding)) = self.fitted {
            self.apply_fit(bounds, padding);
        }
    }

    fn set_zoom(&mut self, zoom: i32) {
        let zoom = zoom.clamp(0, i32::from(self.max_zoom()));
        self.zoom = u8::try_from(zoom).unwrap_or(self.zoom);
        self.fitted = None;
    }

    /// Draw the map into all space available in `ui`
    pub fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        if self.needs_measure {
            self.measure(rect.size());
        }

        self.handle_input(ui, &response);

        painter.rect_filled(rect, 0.0, Color32::from_rgb(200, 220, 240));
        self.paint_tiles(&painter, rect);

        let zoom = self.zoom;
        let (center_x, center_y) = WebMercator::project(self.center, zoom);
        let origin = rect.center();
        let to_screen = move |position: LatLon| -> Pos2 {
            let (x, y) = WebMercator::project(position, zoom);
            origin + screen_offset(x - center_x, y - center_y)
        };

        if response.clicked() {
            self.open_caption = response
                .interact_pointer_pos()
                .and_then(|click| self.marker_at(click, &to_screen));
        }

        for marker in &self.markers {
            let pos = to_screen(marker.position);
            if rect.expand(self.icon_size().y).contains(pos) {
                self.paint_pin(&painter, pos);
            }
        }

        if let Some(marker) = self.open_caption.and_then(|i| self.markers.get(i)) {
            self.paint_caption(&painter, to_screen(marker.position), &marker.label);
        }

        if let Some(tiles) = &self.tiles {
            painter.text(
                rect.right_bottom() + egui::vec2(-10.0, -10.0),
                Align2::RIGHT_BOTTOM,
                &tiles.layer().attribution,
                FontId::proportional(10.0),
                Color32::from_black_alpha(180),
            );

            let errors = tiles.get_error_count();
            if errors > 0 {
                painter.text(
                    rect.center_top() + egui::vec2(0.0, 12.0),
                    Align2::CENTER_TOP,
                    format!("Failed to load {errors} tiles"),
                    FontId::proportional(12.0),
                    Color32::from_rgb(220, 50, 50),
                );
            } else if tiles.has_loading_tiles() {
                painter.text(
                    rect.left_bottom() + egui::vec2(10.0, -10.0),
                    Align2::LEFT_BOTTOM,
                    "Loading tiles...",
                    FontId::proportional(10.0),
                    Color32::from_black_alpha(160),
                );
            }
        }

        response
    }

    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if response.dragged() {
            let delta = response.drag_delta();
            let (x, y) = WebMercator::project(self.center, self.zoom);
            let moved = WebMercator::unproject(x - f64::from(delta.x), y - f64::from(delta.y), self.zoom);
            self.center = LatLon::new(moved.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), wrap_longitude(moved.lon));
            self.fitted = None;
        }

        if !response.hovered() {
            return;
        }

        let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
        self.scroll_accum += scroll;
        if (pinch - 1.0).abs() > 0.001 {
            self.pinch_accum += pinch.log2();
        }

        let mut steps = 0;
        while self.scroll_accum >= SCROLL_PER_ZOOM_LEVEL {
            self.scroll_accum -= SCROLL_PER_ZOOM_LEVEL;
            steps += 1;
        }
        while self.scroll_accum <= -SCROLL_PER_ZOOM_LEVEL {
            self.scroll_accum += SCROLL_PER_ZOOM_LEVEL;
            steps -= 1;
        }
        while self.pinch_accum >= 1.0 {
            self.pinch_accum -= 1.0;
            steps += 1;
        }
        while self.pinch_accum <= -1.0 {
            self.pinch_accum += 1.0;
            steps -= 1;
        }

        if steps != 0 {
            self.set_zoom(i32::from(self.zoom) + steps);
        }
    }

    fn paint_tiles(&self, painter: &egui::Painter, rect: Rect) {
        let Some(tiles) = &self.tiles else {
            return;
        };
        let center = rect.center();
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

        for (coord, offset_x, offset_y) in tiles.get_visible_tiles(self.center, self.zoom, rect.width(), rect.height()) {
            if let Some(texture) = tiles.get_tile(coord, &self.ctx) {
                let tile_rect = Rect::from_min_size(
                    Pos2::new(center.x + offset_x, center.y + offset_y),
                    Vec2::splat(TILE_SIZE),
                );
                painter.image(texture.id(), tile_rect, uv, Color32::WHITE);
            }
        }
    }

    fn icon_size(&self) -> Vec2 {
        pixel_vec(self.icon.size.map(i64::from))
    }

    /// Screen rect of the pin icon whose anchor sits on `pos`
    fn icon_rect(&self, pos: Pos2) -> Rect {
        let anchor = pixel_vec(self.icon.anchor.map(i64::from));
        Rect::from_min_size(pos - anchor, self.icon_size())
    }

    fn marker_at(&self, click: Pos2, to_screen: &impl Fn(LatLon) -> Pos2) -> Option<usize> {
        // Topmost (last drawn) marker wins
        self.markers
            .iter()
            .rposition(|marker| self.icon_rect(to_screen(marker.position)).contains(click))
    }

    fn paint_pin(&self, painter: &egui::Painter, pos: Pos2) {
        let icon = self.icon_rect(pos);
        let radius = icon.width() / 2.0;
        let head = Pos2::new(icon.center().x, icon.top() + radius);

        painter.add(Shape::convex_polygon(
            vec![
                head + egui::vec2(-radius * 0.8, radius * 0.6),
                head + egui::vec2(radius * 0.8, radius * 0.6),
                pos,
            ],
            PIN_FILL,
            Stroke::new(1.0, PIN_STROKE),
        ));
        painter.circle_filled(head, radius, PIN_FILL);
        painter.circle_stroke(head, radius, Stroke::new(1.0, PIN_STROKE));
        painter.circle_filled(head, radius * 0.4, Color32::WHITE);
    }

    fn paint_caption(&self, painter: &egui::Painter, pos: Pos2, label: &str) {
        let popup_anchor = pixel_vec(self.icon.popup_anchor.map(i64::from));
        let tip = pos + popup_anchor;

        let galley = painter.layout_no_wrap(label.to_string(), FontId::proportional(12.0), Color32::BLACK);
        let padding = egui::vec2(8.0, 5.0);
        let bubble = Rect::from_center_size(
            tip - egui::vec2(0.0, galley.size().y / 2.0 + padding.y + 6.0),
            galley.size() + padding * 2.0,
        );

        painter.add(Shape::convex_polygon(
            vec![
                tip,
                Pos2::new(tip.x - 6.0, bubble.bottom()),
                Pos2::new(tip.x + 6.0, bubble.bottom()),
            ],
            Color32::WHITE,
            Stroke::NONE,
        ));
        painter.rect_filled(bubble, 4.0, Color32::WHITE);
        painter.text(bubble.center(), Align2::CENTER_CENTER, label, FontId::proportional(12.0), Color32::BLACK);
    }
}

#[allow(clippy::cast_precision_loss, reason = "icon geometry is a few dozen pixels")]
fn pixel_vec([x, y]: [i64; 2]) -> Vec2 {
    Vec2::new(x as f32, y as f32)
}

#[allow(clippy::cast_possible_truncation, reason = "offsets are bounded by the visible canvas")]
fn screen_offset(dx: f64, dy: f64) -> Vec2 {
    Vec2::new(dx as f32, dy as f32)
}

fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

impl RenderingSurface for EguiMapSurface {
    fn add_base_layer(&mut self, layer: &TileLayer) {
        info!("Using tiles from {}", layer.url_template);
        self.tiles = Some(TileManager::new(layer.clone(), self.tile_cache_days));
        self.zoom = self.zoom.min(layer.max_zoom);
    }

    fn place_marker(&mut self, position: LatLon, label: &str) -> Result<(), SurfaceError> {
        if !position.lat.is_finite() || !position.lon.is_finite() {
            return Err(SurfaceError::MarkerRejected {
                label: label.to_string(),
                reason: "position is not finite".to_string(),
            });
        }
        self.markers.push(Marker {
            position,
            label: label.to_string(),
        });
        Ok(())
    }

    fn remove_all_markers(&mut self) {
        self.markers.clear();
        self.open_caption = None;
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, padding_px: f32) {
        self.apply_fit(bounds, padding_px);
        self.fitted = Some((bounds, padding_px));
    }

    fn set_view(&mut self, center: LatLon, zoom: u8) {
        self.center = center;
        self.zoom = zoom.min(self.max_zoom());
        self.fitted = None;
    }

    fn invalidate_size(&mut self) {
        self.needs_measure = true;
        self.ctx.request_repaint();
    }
}

/// Builds the map canvas for the egui context it will draw into
#[derive(Debug)]
pub struct EguiSurfaceHost {
    ctx: egui::Context,
    tile_cache_days: u64,
}

impl EguiSurfaceHost {
    pub fn new(ctx: egui::Context, tile_cache_days: u64) -> Self {
        Self { ctx, tile_cache_days }
    }
}

impl SurfaceHost for EguiSurfaceHost {
    type Surface = EguiMapSurface;

    fn initialize(&mut self, options: &SurfaceOptions) -> Result<EguiMapSurface, SurfaceError> {
        if options.initial_zoom > options.base_layer.max_zoom {
            return Err(SurfaceError::Initialization(format!(
                "initial zoom {} exceeds tile layer maximum {}",
                options.initial_zoom, options.base_layer.max_zoom
            )));
        }
        Ok(EguiMapSurface::new(self.ctx.clone(), options, self.tile_cache_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> EguiMapSurface {
        EguiMapSurface::new(egui::Context::default(), &SurfaceOptions::default(), 7)
    }

    #[test]
    fn test_screen_offset() {
        assert_eq!(screen_offset(12.5, -40.0), Vec2::new(12.5, -40.0));
    }

    #[test]
    fn test_wrap_longitude() {
        assert!((wrap_longitude(190.0) - (-170.0)).abs() < 1e-9);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < 1e-9);
        assert!((wrap_longitude(45.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_markers_replace_on_reset() {
        let mut surface = surface();
        surface.place_marker(LatLon::new(1.0, 2.0), "a").unwrap();
        surface.place_marker(LatLon::new(3.0, 4.0), "b").unwrap();
        assert_eq!(surface.marker_count(), 2);

        surface.remove_all_markers();
        assert_eq!(surface.marker_count(), 0);
    }

    #[test]
    fn test_non_finite_marker_is_rejected() {
        let mut surface = surface();
        let err = surface.place_marker(LatLon::new(f64::NAN, 0.0), "x").unwrap_err();
        assert!(matches!(err, SurfaceError::MarkerRejected { .. }));
        assert_eq!(surface.marker_count(), 0);
    }

    #[test]
    fn test_set_view_after_fit_wins() {
        let mut surface = surface();
        let bounds = BoundingBox::from_positions([LatLon::new(10.0, 10.0), LatLon::new(20.0, 20.0)]).unwrap();
        surface.fit_bounds(bounds, 50.0);
        surface.set_view(LatLon::new(10.0, 10.0), 10);

        assert_eq!(surface.center(), LatLon::new(10.0, 10.0));
        assert_eq!(surface.zoom(), 10);
    }

    #[test]
    fn test_measure_refits_untouched_fit() {
        let mut surface = surface();
        let bounds = BoundingBox::from_positions([LatLon::new(0.0, -10.0), LatLon::new(0.0, 10.0)]).unwrap();
        surface.fit_bounds(bounds, 50.0);
        let zoom_at_default = surface.zoom();

        surface.measure(Vec2::new(3000.0, 2000.0));
        assert!(surface.zoom() > zoom_at_default);
    }

    #[test]
    fn test_host_rejects_zoom_beyond_layer() {
        let mut host = EguiSurfaceHost::new(egui::Context::default(), 7);
        let options = SurfaceOptions {
            initial_zoom: 25,
            ..SurfaceOptions::default()
        };
        assert!(matches!(host.initialize(&options), Err(SurfaceError::Initialization(_))));
        assert!(host.initialize(&SurfaceOptions::default()).is_ok());
    }
}
