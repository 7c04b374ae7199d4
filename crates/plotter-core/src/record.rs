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

//! Coordinate record and geographic primitives.

use std::fmt;
use std::ops::RangeInclusive;

/// Valid latitude range in degrees, inclusive at both ends.
pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees, inclusive at both ends.
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Axis-aligned box in degrees covering a set of positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Degenerate box around a single position.
    #[must_use]
    pub const fn around(position: LatLon) -> Self {
        Self {
            south: position.lat,
            west: position.lon,
            north: position.lat,
            east: position.lon,
        }
    }

    /// Smallest box covering every position, or `None` for an empty set.
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLon>,
    {
        let mut positions = positions.into_iter();
        let first = positions.next()?;
        Some(positions.fold(Self::around(first), |mut bounds, position| {
            bounds.extend(position);
            bounds
        }))
    }

    /// Grow the box so it covers `position`.
    pub fn extend(&mut self, position: LatLon) {
        self.south = self.south.min(position.lat);
        self.north = self.north.max(position.lat);
        self.west = self.west.min(position.lon);
        self.east = self.east.max(position.lon);
    }

    #[must_use]
    pub fn north_west(&self) -> LatLon {
        LatLon::new(self.north, self.west)
    }

    #[must_use]
    pub fn south_east(&self) -> LatLon {
        LatLon::new(self.south, self.east)
    }

    #[must_use]
    pub fn contains(&self, position: LatLon) -> bool {
        (self.south..=self.north).contains(&position.lat)
            && (self.west..=self.east).contains(&position.lon)
    }
}

/// One validated point.
///
/// Records are only produced by [`crate::validate`], so the latitude and
/// longitude are always finite and inside [`LATITUDE_RANGE`] and
/// [`LONGITUDE_RANGE`], and the label is never empty. They cannot be
/// modified once created.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRecord {
    latitude: f64,
    longitude: f64,
    label: String,
}

impl CoordinateRecord {
    pub(crate) fn new(latitude: f64, longitude: f64, label: String) -> Self {
        Self {
            latitude,
            longitude,
            label,
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_empty_set() {
        assert_eq!(BoundingBox::from_positions(Vec::new()), None);
    }

    #[test]
    fn test_bounds_cover_all_positions() {
        let bounds = BoundingBox::from_positions(vec![
            LatLon::new(10.0, 20.0),
            LatLon::new(-5.0, 40.0),
            LatLon::new(3.0, -30.0),
        ])
        .unwrap();

        assert_eq!(bounds.south, -5.0);
        assert_eq!(bounds.north, 10.0);
        assert_eq!(bounds.west, -30.0);
        assert_eq!(bounds.east, 40.0);
        assert!(bounds.contains(LatLon::new(0.0, 0.0)));
        assert!(!bounds.contains(LatLon::new(11.0, 0.0)));
    }

    #[test]
    fn test_single_position_is_degenerate_box() {
        let bounds = BoundingBox::from_positions([LatLon::new(1.5, 2.5)]).unwrap();
        assert_eq!(bounds.north_west(), bounds.south_east());
    }
}
