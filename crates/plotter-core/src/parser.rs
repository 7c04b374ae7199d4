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

//! CSV parsing for bulk coordinate import.
//!
//! The first non-blank line is the header. Header names are matched
//! case-insensitively and must include `latitude` and `longitude`; `label`
//! is optional and any other column is carried along but ignored by the
//! importer. Fields may be double-quoted to embed commas, and surrounding
//! whitespace is trimmed from every field.
//!
//! Cells are kept as text. Numeric conversion is left to [`crate::validate`].

use std::borrow::Cow;
use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::PlotterError;

pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const LABEL_COLUMN: &str = "label";

const REQUIRED_COLUMNS: [&str; 2] = [LATITUDE_COLUMN, LONGITUDE_COLUMN];

/// One data row, keyed by lower-cased column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    cells: HashMap<String, String>,
}

impl CsvRow {
    fn from_record(headers: &[String], record: &StringRecord) -> Self {
        let mut cells = HashMap::with_capacity(headers.len());
        for (header, value) in headers.iter().zip(record.iter()) {
            // Duplicate columns: the leftmost one wins.
            cells
                .entry(header.clone())
                .or_insert_with(|| value.to_string());
        }
        Self { cells }
    }

    /// Cell for `column`, matched case-insensitively.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(&column.to_lowercase()).map(String::as_str)
    }

    /// Latitude cell, empty if the row is short.
    #[must_use]
    pub fn latitude(&self) -> &str {
        self.get(LATITUDE_COLUMN).unwrap_or_default()
    }

    /// Longitude cell, empty if the row is short.
    #[must_use]
    pub fn longitude(&self) -> &str {
        self.get(LONGITUDE_COLUMN).unwrap_or_default()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.get(LABEL_COLUMN)
    }
}

/// Parse CSV text into rows.
///
/// Fails with [`PlotterError::MissingColumns`] when the header lacks a
/// required column, in which case no rows are returned at all.
pub fn parse_csv(text: &str) -> Result<Vec<CsvRow>, PlotterError> {
    let body = strip_space_before_quotes(skip_leading_blank_lines(text));

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PlotterError::Parse(e.to_string()))?
        .iter()
        .map(str::to_lowercase)
        .collect();

    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .collect();
    if !missing.is_empty() {
        return Err(PlotterError::MissingColumns { missing });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PlotterError::Parse(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(CsvRow::from_record(&headers, &record));
    }

    Ok(rows)
}

/// Drop blanks between a field's start and its opening quote.
///
/// The reader only honours a quote as the first byte of a field, so
/// `1, "New York, NY"` must become `1,"New York, NY"` before splitting. A
/// quote toggles the quoted state wherever it appears, and delimiters inside
/// quotes are content.
fn strip_space_before_quotes(text: &str) -> Cow<'_, str> {
    if !text.contains('"') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut in_quotes = false;
    let mut field_start = true;

    for c in text.chars() {
        if in_quotes {
            out.push(c);
            if c == '"' {
                in_quotes = false;
            }
            continue;
        }

        match c {
            ' ' | '\t' if field_start => {
                pending.push(c);
                continue;
            }
            '"' => {
                if field_start {
                    pending.clear();
                }
                in_quotes = true;
            }
            _ => {}
        }

        out.push_str(&pending);
        pending.clear();
        out.push(c);
        field_start = matches!(c, ',' | '\n' | '\r');
    }
    out.push_str(&pending);

    Cow::Owned(out)
}

fn skip_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    rest
}
