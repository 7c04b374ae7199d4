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

//! Web Mercator projection and bounds fitting.
//!
//! Surfaces built on slippy-map tiles use these helpers to turn a
//! [`BoundingBox`] into a center and an integer zoom level.

use std::f64::consts::PI;

use crate::record::{BoundingBox, LatLon};

/// Tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which the Web Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to a fractional tile Y coordinate at `zoom`
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        y * tile_count(zoom)
    }

    /// Convert longitude to a fractional tile X coordinate at `zoom`
    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        ((lon + 180.0) / 360.0) * tile_count(zoom)
    }

    /// Convert tile coordinates back to latitude
    #[must_use]
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let lat_rad = (PI * (1.0 - 2.0 * y / tile_count(zoom))).sinh().atan();
        lat_rad.to_degrees()
    }

    /// Convert tile coordinates back to longitude
    #[must_use]
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        x / tile_count(zoom) * 360.0 - 180.0
    }

    /// Position to world pixel coordinates at `zoom`.
    #[must_use]
    pub fn project(position: LatLon, zoom: u8) -> (f64, f64) {
        (
            Self::lon_to_x(position.lon, zoom) * TILE_SIZE,
            Self::lat_to_y(position.lat, zoom) * TILE_SIZE,
        )
    }

    /// World pixel coordinates at `zoom` back to a position.
    #[must_use]
    pub fn unproject(x: f64, y: f64, zoom: u8) -> LatLon {
        LatLon::new(
            Self::tile_to_lat(y / TILE_SIZE, zoom),
            Self::tile_to_lon(x / TILE_SIZE, zoom),
        )
    }
}

fn tile_count(zoom: u8) -> f64 {
    2_f64.powi(i32::from(zoom))
}

/// Center and zoom showing all of `bounds` inside a `viewport` (pixels),
/// keeping `padding` pixels free on every side.
///
/// The zoom is the largest integer level at which the box fits, clamped to
/// `0..=max_zoom`. A box that is a single point gets `max_zoom`.
#[must_use]
pub fn fit_bounds(bounds: &BoundingBox, viewport: [f32; 2], padding: f32, max_zoom: u8) -> (LatLon, u8) {
    let (west_x, north_y) = WebMercator::project(bounds.north_west(), 0);
    let (east_x, south_y) = WebMercator::project(bounds.south_east(), 0);

    let center = WebMercator::unproject((west_x + east_x) / 2.0, (north_y + south_y) / 2.0, 0);

    let available_w = f64::from((viewport[0] - 2.0 * padding).max(1.0));
    let available_h = f64::from((viewport[1] - 2.0 * padding).max(1.0));

    let scale = |available: f64, extent: f64| {
        if extent > 0.0 {
            available / extent
        } else {
            f64::INFINITY
        }
    };
    let max_scale = scale(available_w, east_x - west_x).min(scale(available_h, south_y - north_y));

    let zoom = if max_scale.is_infinite() {
        max_zoom
    } else {
        zoom_for_scale(max_scale, max_zoom)
    };

    (center, zoom)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "clamped to 0..=max_zoom before the cast"
)]
fn zoom_for_scale(scale: f64, max_zoom: u8) -> u8 {
    scale.log2().floor().clamp(0.0, f64::from(max_zoom)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_round_trip_at_zoom() {
        let position = LatLon::new(37.7749, -122.4194);
        let (x, y) = WebMercator::project(position, 10);
        let back = WebMercator::unproject(x, y, 10);
        assert!((back.lat - position.lat).abs() < 1e-9);
        assert!((back.lon - position.lon).abs() < 1e-9);
    }

    #[test]
    fn test_origin_projects_to_world_center() {
        let (x, y) = WebMercator::project(LatLon::new(0.0, 0.0), 0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_poles_are_clamped() {
        let (_, y) = WebMercator::project(LatLon::new(90.0, 0.0), 0);
        assert!(y.is_finite());
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_fit_horizontal_span() {
        let bounds = BoundingBox::from_positions([LatLon::new(0.0, -10.0), LatLon::new(0.0, 10.0)]).unwrap();
        let (center, zoom) = fit_bounds(&bounds, [800.0, 500.0], 50.0, 18);

        // 20 degrees is ~14.2px at zoom 0; 700px available allows 2^5.
        assert_eq!(zoom, 5);
        assert!(center.lat.abs() < 1e-9);
        assert!(center.lon.abs() < 1e-9);
    }

    #[test]
    fn test_fit_single_point_uses_max_zoom() {
        let bounds = BoundingBox::around(LatLon::new(48.8566, 2.3522));
        let (center, zoom) = fit_bounds(&bounds, [800.0, 500.0], 50.0, 18);
        assert_eq!(zoom, 18);
        assert!((center.lat - 48.8566).abs() < 1e-9);
        assert!((center.lon - 2.3522).abs() < 1e-9);
    }

    #[test]
    fn test_fit_whole_world_is_zoom_zero() {
        let bounds = BoundingBox::from_positions([LatLon::new(-90.0, -180.0), LatLon::new(90.0, 180.0)]).unwrap();
        let (_, zoom) = fit_bounds(&bounds, [800.0, 500.0], 50.0, 18);
        assert_eq!(zoom, 0);
    }

    #[test]
    fn test_padding_reduces_zoom() {
        let bounds = BoundingBox::from_positions([LatLon::new(0.0, -10.0), LatLon::new(0.0, 10.0)]).unwrap();
        let (_, without_padding) = fit_bounds(&bounds, [460.0, 460.0], 0.0, 18);
        let (_, with_padding) = fit_bounds(&bounds, [460.0, 460.0], 50.0, 18);
        assert!(with_padding < without_padding);
    }
}
