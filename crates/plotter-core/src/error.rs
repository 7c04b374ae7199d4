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

//! User-facing error taxonomy.
//!
//! Every error is recovered where it occurs and turned into a single message
//! for display; none of them abort the session.

use thiserror::Error;

use crate::surface::SurfaceError;

/// Errors reported to the user by the plotting session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotterError {
    /// The CSV header lacks required columns; nothing was imported.
    #[error("CSV must contain \"latitude\" and \"longitude\" columns (missing: {})", .missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },

    /// Manual entry failed validation; the form is left untouched.
    #[error("Invalid coordinates. Please check your input.")]
    ManualEntryInvalid,

    /// The dropped or selected file could not be read as text.
    #[error("Error reading CSV file {path}: {reason}")]
    FileRead { path: String, reason: String },

    /// The CSV text could not be parsed structurally.
    #[error("Error parsing CSV: {0}")]
    Parse(String),

    /// A dropped or selected file is not a CSV file.
    #[error("Only .csv files are accepted (got {name})")]
    UnsupportedFile { name: String },

    /// The rendering surface could not be brought up.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
