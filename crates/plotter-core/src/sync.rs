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

//! View synchronization.
//!
//! Keeps a rendering surface consistent with the record set. Each
//! recomputation runs to completion against one store snapshot:
//!
//! 1. remove every marker previously placed
//! 2. place one marker per record, captioned with its label
//! 3. fit the viewport to the placed markers (skipped when there are none)
//! 4. re-center on the zoom intent, if any, at the focus zoom level
//! 5. schedule a size invalidation for the next idle tick
//!
//! The surface is built lazily by the first recomputation and reused
//! afterwards.

use log::{debug, info, warn};

use crate::record::{BoundingBox, CoordinateRecord, LatLon};
use crate::surface::{RenderingSurface, SurfaceError, SurfaceHost, SurfaceOptions};

/// Padding kept around fitted bounds, in pixels.
pub const DEFAULT_FIT_PADDING_PX: f32 = 50.0;

/// Zoom level used when centering on a zoom intent.
pub const DEFAULT_FOCUS_ZOOM: u8 = 10;

/// Tunables for the fit and focus steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub fit_padding_px: f32,
    pub focus_zoom: u8,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            fit_padding_px: DEFAULT_FIT_PADDING_PX,
            focus_zoom: DEFAULT_FOCUS_ZOOM,
        }
    }
}

/// Outcome of one recomputation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeReport {
    pub markers_placed: usize,
    /// Per-record placement failures; they do not stop the recomputation.
    pub warnings: Vec<SurfaceError>,
    /// Bounds the viewport was fitted to, if any.
    pub fitted: Option<BoundingBox>,
    /// Position the viewport was re-centered on, if any.
    pub focused: Option<LatLon>,
}

/// Drives a rendering surface from the record set and view intents.
pub struct ViewSynchronizer<H: SurfaceHost> {
    host: H,
    surface_options: SurfaceOptions,
    view_options: ViewOptions,
    surface: Option<H::Surface>,
    resize_pending: bool,
}

impl<H: SurfaceHost> std::fmt::Debug for ViewSynchronizer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSynchronizer")
            .field("view_options", &self.view_options)
            .field("initialized", &self.surface.is_some())
            .field("resize_pending", &self.resize_pending)
            .finish_non_exhaustive()
    }
}

impl<H: SurfaceHost> ViewSynchronizer<H> {
    #[must_use]
    pub fn new(host: H, surface_options: SurfaceOptions, view_options: ViewOptions) -> Self {
        Self {
            host,
            surface_options,
            view_options,
            surface: None,
            resize_pending: false,
        }
    }

    /// Run one recomputation against `records`.
    ///
    /// Fails only if the surface has not been built yet and the host cannot
    /// build it; the next recomputation will try again.
    pub fn recompute(
        &mut self,
        records: &[CoordinateRecord],
        zoom_intent: Option<&CoordinateRecord>,
    ) -> Result<RecomputeReport, SurfaceError> {
        let mut surface = match self.surface.take() {
            Some(surface) => surface,
            None => self.build_surface()?,
        };

        let report = self.apply(&mut surface, records, zoom_intent);
        self.surface = Some(surface);
        self.resize_pending = true;

        Ok(report)
    }

    /// Perform work deferred to the host's idle tick.
    ///
    /// Returns `true` if a size invalidation was issued.
    pub fn run_idle(&mut self) -> bool {
        if !self.resize_pending {
            return false;
        }
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        self.resize_pending = false;
        surface.invalidate_size();
        true
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    #[must_use]
    pub fn has_pending_resize(&self) -> bool {
        self.resize_pending
    }

    #[must_use]
    pub fn surface(&self) -> Option<&H::Surface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut H::Surface> {
        self.surface.as_mut()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[must_use]
    pub fn view_options(&self) -> ViewOptions {
        self.view_options
    }

    fn build_surface(&mut self) -> Result<H::Surface, SurfaceError> {
        let mut surface = self.host.initialize(&self.surface_options)?;
        surface.add_base_layer(&self.surface_options.base_layer);
        info!(
            "Map surface initialized at {} (zoom {})",
            self.surface_options.initial_center, self.surface_options.initial_zoom
        );
        Ok(surface)
    }

    fn apply(
        &self,
        surface: &mut H::Surface,
        records: &[CoordinateRecord],
        zoom_intent: Option<&CoordinateRecord>,
    ) -> RecomputeReport {
        let mut report = RecomputeReport::default();

        surface.remove_all_markers();

        let mut bounds: Option<BoundingBox> = None;
        for record in records {
            match surface.place_marker(record.position(), record.label()) {
                Ok(()) => {
                    report.markers_placed += 1;
                    match bounds.as_mut() {
                        Some(b) => b.extend(record.position()),
                        None => bounds = Some(BoundingBox::around(record.position())),
                    }
                }
                Err(e) => {
                    warn!("Skipping marker: {e}");
                    report.warnings.push(e);
                }
            }
        }

        if let Some(bounds) = bounds {
            surface.fit_bounds(bounds, self.view_options.fit_padding_px);
            report.fitted = Some(bounds);
        }

        if let Some(target) = zoom_intent {
            surface.set_view(target.position(), self.view_options.focus_zoom);
            report.focused = Some(target.position());
        }

        debug!(
            "Recomputed view: {} markers, {} warnings",
            report.markers_placed,
            report.warnings.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{RecordingHost, SurfaceCommand};
    use crate::validate;

    fn record(lat: &str, lon: &str, label: &str) -> CoordinateRecord {
        validate(lat, lon, Some(label)).unwrap()
    }

    fn synchronizer(host: RecordingHost) -> ViewSynchronizer<RecordingHost> {
        ViewSynchronizer::new(host, SurfaceOptions::default(), ViewOptions::default())
    }

    #[test]
    fn test_surface_initialized_once() {
        let mut sync = synchronizer(RecordingHost::default());
        assert!(!sync.is_initialized());

        sync.recompute(&[], None).unwrap();
        sync.recompute(&[record("1", "2", "a")], None).unwrap();
        sync.recompute(&[], None).unwrap();

        assert!(sync.is_initialized());
        assert_eq!(sync.host().initializations, 1);
        let surface = sync.surface().unwrap();
        assert_eq!(surface.layers.len(), 1);
        assert_eq!(
            surface
                .commands
                .iter()
                .filter(|c| **c == SurfaceCommand::AddBaseLayer)
                .count(),
            1
        );
    }

    #[test]
    fn test_command_order() {
        let mut sync = synchronizer(RecordingHost::default());
        let records = [record("10", "20", "a"), record("30", "40", "b")];

        sync.recompute(&records, Some(&records[0])).unwrap();

        let commands = &sync.surface().unwrap().commands;
        assert_eq!(commands[0], SurfaceCommand::AddBaseLayer);
        assert_eq!(commands[1], SurfaceCommand::RemoveAllMarkers);
        assert!(matches!(commands[2], SurfaceCommand::PlaceMarker(_, ref l) if l == "a"));
        assert!(matches!(commands[3], SurfaceCommand::PlaceMarker(_, ref l) if l == "b"));
        assert!(matches!(commands[4], SurfaceCommand::FitBounds(_, p) if (p - 50.0).abs() < f32::EPSILON));
        assert!(matches!(commands[5], SurfaceCommand::SetView(_, 10)));
        assert_eq!(commands.len(), 6);
    }

    #[test]
    fn test_markers_match_store_after_each_recompute() {
        let mut sync = synchronizer(RecordingHost::default());
        let first = [record("1", "1", "a"), record("2", "2", "b"), record("3", "3", "c")];
        let second = [record("4", "4", "d")];

        sync.recompute(&first, None).unwrap();
        assert_eq!(sync.surface().unwrap().markers.len(), 3);

        sync.recompute(&second, None).unwrap();
        let surface = sync.surface().unwrap();
        assert_eq!(surface.markers.len(), 1);
        assert_eq!(surface.markers[0].1, "d");

        sync.recompute(&[], None).unwrap();
        let surface = sync.surface().unwrap();
        assert!(surface.markers.is_empty());
        assert_eq!(surface.layers.len(), 1, "tile layer must survive marker removal");
    }

    #[test]
    fn test_empty_store_skips_fit() {
        let mut sync = synchronizer(RecordingHost::default());
        let report = sync.recompute(&[], None).unwrap();

        assert_eq!(report.fitted, None);
        let surface = sync.surface().unwrap();
        assert!(!surface
            .commands
            .iter()
            .any(|c| matches!(c, SurfaceCommand::FitBounds(..))));
        assert_eq!(surface.center, LatLon::new(0.0, 0.0));
        assert_eq!(surface.zoom, 2);
    }

    #[test]
    fn test_fit_covers_all_markers() {
        let mut sync = synchronizer(RecordingHost::default());
        let records = [record("10", "-20", "a"), record("-5", "40", "b"), record("0", "0", "c")];

        let report = sync.recompute(&records, None).unwrap();
        let bounds = report.fitted.unwrap();
        assert_eq!(bounds.north, 10.0);
        assert_eq!(bounds.south, -5.0);
        assert_eq!(bounds.west, -20.0);
        assert_eq!(bounds.east, 40.0);
        assert_eq!(report.focused, None);
    }

    #[test]
    fn test_zoom_intent_overrides_fit() {
        let mut sync = synchronizer(RecordingHost::default());
        let records = [record("51.5074", "-0.1278", "London"), record("40.7128", "-74.006", "NYC")];

        sync.recompute(&records, Some(&records[0])).unwrap();

        let surface = sync.surface().unwrap();
        assert!(surface
            .commands
            .iter()
            .any(|c| matches!(c, SurfaceCommand::FitBounds(..))));
        assert_eq!(surface.center, records[0].position());
        assert_eq!(surface.zoom, 10);
    }

    #[test]
    fn test_marker_failure_is_a_warning() {
        let mut sync = synchronizer(RecordingHost::failing_on(&["bad"]));
        let records = [record("1", "1", "ok"), record("2", "2", "bad"), record("3", "3", "also ok")];

        let report = sync.recompute(&records, None).unwrap();

        assert_eq!(report.markers_placed, 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            SurfaceError::MarkerRejected { label, .. } if label == "bad"
        ));
        let bounds = report.fitted.unwrap();
        assert_eq!(bounds.north, 3.0);
        assert_eq!(bounds.south, 1.0);
        assert_eq!(sync.surface().unwrap().markers.len(), 2);
    }

    #[test]
    fn test_resize_is_deferred_to_idle() {
        let mut sync = synchronizer(RecordingHost::default());
        assert!(!sync.run_idle(), "nothing to do before the first recompute");

        sync.recompute(&[record("1", "2", "a")], None).unwrap();
        assert!(sync.has_pending_resize());
        assert!(!sync
            .surface()
            .unwrap()
            .commands
            .contains(&SurfaceCommand::InvalidateSize));

        assert!(sync.run_idle());
        assert_eq!(
            sync.surface().unwrap().commands.last(),
            Some(&SurfaceCommand::InvalidateSize)
        );
        assert!(!sync.run_idle());
    }

    #[test]
    fn test_failed_initialization_retries() {
        let mut sync = synchronizer(RecordingHost {
            fail: true,
            ..RecordingHost::default()
        });

        let err = sync.recompute(&[], None).unwrap_err();
        assert!(matches!(err, SurfaceError::Initialization(_)));
        assert!(!sync.is_initialized());
        assert!(!sync.has_pending_resize());
    }
}
