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

//! Coordinate validation.
//!
//! Turns a raw `(latitude, longitude, label)` triple, as typed into a form or
//! read from a CSV cell, into a [`CoordinateRecord`]. Validation is total:
//! every input produces either a record or a [`Rejection`] value.

use std::fmt;
use std::ops::RangeInclusive;

use log::debug;

use crate::record::{CoordinateRecord, LATITUDE_RANGE, LONGITUDE_RANGE};

/// Which coordinate component a rejection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Latitude,
    Longitude,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latitude => f.write_str("latitude"),
            Self::Longitude => f.write_str("longitude"),
        }
    }
}

/// Why a raw triple did not produce a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The text is not a decimal number.
    NotANumber { field: Field, raw: String },
    /// The number lies outside the field's valid range.
    OutOfRange { field: Field, value: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber { field, raw } => write!(f, "{field} '{raw}' is not a number"),
            Self::OutOfRange { field, value } => write!(f, "{field} {value} is out of range"),
        }
    }
}

/// Validate one raw triple.
///
/// When the label is absent or blank it defaults to `"<lat>, <lon>"` built
/// from the trimmed input text, so `"12.50"` stays `"12.50"` in the label.
pub fn validate(
    latitude: &str,
    longitude: &str,
    label: Option<&str>,
) -> Result<CoordinateRecord, Rejection> {
    let lat_text = latitude.trim();
    let lon_text = longitude.trim();

    let lat = parse_component(lat_text, Field::Latitude, &LATITUDE_RANGE)?;
    let lon = parse_component(lon_text, Field::Longitude, &LONGITUDE_RANGE)?;

    let label = match label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => format!("{lat_text}, {lon_text}"),
    };

    Ok(CoordinateRecord::new(lat, lon, label))
}

fn parse_component(
    text: &str,
    field: Field,
    range: &RangeInclusive<f64>,
) -> Result<f64, Rejection> {
    let not_a_number = || Rejection::NotANumber {
        field,
        raw: text.to_string(),
    };

    let value = text.parse::<f64>().map_err(|e| {
        debug!("{field} {text:?} is not a number: {e}");
        not_a_number()
    })?;
    if value.is_nan() {
        return Err(not_a_number());
    }
    if !range.contains(&value) {
        return Err(Rejection::OutOfRange { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_values_inside_range() {
        let record = validate("33.9425", "-118.4081", Some("LAX")).unwrap();
        assert!((record.latitude() - 33.9425).abs() < 1e-12);
        assert!((record.longitude() - (-118.4081)).abs() < 1e-12);
        assert_eq!(record.label(), "LAX");
    }

    #[test]
    fn test_range_is_inclusive() {
        for (lat, lon) in [("90", "180"), ("-90", "-180"), ("0", "0")] {
            assert!(validate(lat, lon, None).is_ok(), "{lat}, {lon} should be valid");
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            validate("90.0001", "0", None),
            Err(Rejection::OutOfRange { field: Field::Latitude, .. })
        ));
        assert!(matches!(
            validate("0", "-180.5", None),
            Err(Rejection::OutOfRange { field: Field::Longitude, .. })
        ));
        assert!(matches!(
            validate("inf", "0", None),
            Err(Rejection::OutOfRange { field: Field::Latitude, .. })
        ));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(matches!(
            validate("abc", "10", None),
            Err(Rejection::NotANumber { field: Field::Latitude, .. })
        ));
        assert!(matches!(
            validate("10", "", None),
            Err(Rejection::NotANumber { field: Field::Longitude, .. })
        ));
        assert!(matches!(
            validate("NaN", "10", None),
            Err(Rejection::NotANumber { field: Field::Latitude, .. })
        ));
    }

    #[test]
    fn test_default_label_keeps_input_text() {
        let record = validate("12.5", "45.25", Some("")).unwrap();
        assert_eq!(record.label(), "12.5, 45.25");

        let record = validate(" 12.50 ", "45.250", None).unwrap();
        assert_eq!(record.label(), "12.50, 45.250");
    }

    #[test]
    fn test_blank_label_uses_default() {
        let record = validate("1", "2", Some("   ")).unwrap();
        assert_eq!(record.label(), "1, 2");
    }
}
