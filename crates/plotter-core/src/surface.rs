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

//! Rendering surface contract.
//!
//! A rendering surface is the interactive map canvas that draws tiles and
//! markers. The core never draws anything itself; it drives a surface
//! through [`RenderingSurface`] and obtains one from a [`SurfaceHost`]
//! exactly once per session.

use thiserror::Error;

use crate::record::{BoundingBox, LatLon};

/// Failures reported by a rendering surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("map surface initialization failed: {0}")]
    Initialization(String),

    #[error("could not place marker '{label}': {reason}")]
    MarkerRejected { label: String, reason: String },
}

/// Marker icon geometry, in pixels relative to the icon's top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    /// Image resource identifying the icon.
    pub image: String,
    pub size: [u32; 2],
    /// Point of the icon that sits on the marker position.
    pub anchor: [i32; 2],
    /// Where the caption popup opens, relative to the anchor.
    pub popup_anchor: [i32; 2],
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self {
            image: "images/marker.svg".to_string(),
            size: [25, 41],
            anchor: [12, 41],
            popup_anchor: [1, -34],
        }
    }
}

/// Base tile layer drawn under the markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    /// URL with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            max_zoom: 18,
        }
    }
}

impl TileLayer {
    /// Expand the URL template for one tile.
    #[must_use]
    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// Everything a surface needs at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub initial_center: LatLon,
    pub initial_zoom: u8,
    pub marker_icon: MarkerIcon,
    pub base_layer: TileLayer,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            initial_center: LatLon::new(0.0, 0.0),
            initial_zoom: 2,
            marker_icon: MarkerIcon::default(),
            base_layer: TileLayer::default(),
        }
    }
}

/// Commands the view synchronizer issues to a map canvas.
pub trait RenderingSurface {
    /// Attach the base tile layer. Called once, right after construction.
    fn add_base_layer(&mut self, layer: &TileLayer);

    /// Place one marker with an interactive caption.
    fn place_marker(&mut self, position: LatLon, label: &str) -> Result<(), SurfaceError>;

    /// Remove every marker, leaving tile layers and other overlays alone.
    fn remove_all_markers(&mut self);

    /// Fit the viewport to `bounds` with `padding_px` on every side.
    fn fit_bounds(&mut self, bounds: BoundingBox, padding_px: f32);

    /// Center the viewport on `center` at `zoom`.
    fn set_view(&mut self, center: LatLon, zoom: u8);

    /// Recompute the surface's pixel size from its (settled) host layout.
    fn invalidate_size(&mut self);
}

/// Builds the rendering surface inside its host region.
pub trait SurfaceHost {
    type Surface: RenderingSurface;

    fn initialize(&mut self, options: &SurfaceOptions) -> Result<Self::Surface, SurfaceError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_expands_placeholders() {
        let layer = TileLayer::default();
        assert_eq!(
            layer.tile_url(3, 4, 5),
            "https://tile.openstreetmap.org/3/4/5.png"
        );
    }

    #[test]
    fn test_default_icon_geometry() {
        let icon = MarkerIcon::default();
        assert_eq!(icon.size, [25, 41]);
        assert_eq!(icon.anchor, [12, 41]);
        assert_eq!(icon.popup_anchor, [1, -34]);
    }
}
