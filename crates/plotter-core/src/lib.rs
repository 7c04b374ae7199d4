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

//! Coordinate ingestion and map-view synchronization.
//!
//! This library holds the logic behind the coordinate plotter. It is split
//! into layers that can be used on their own:
//!
//! - **Parsing**: tolerant CSV parsing with case-insensitive headers and
//!   quote-aware fields ([`parse_csv`])
//! - **Validation**: range and numeric checks producing immutable
//!   [`CoordinateRecord`]s ([`validate`])
//! - **Store**: the ordered, append-or-clear record set ([`CoordinateStore`])
//! - **View synchronization**: drives any [`RenderingSurface`] so its markers
//!   and viewport always match the record set ([`ViewSynchronizer`])
//! - **Session**: wires the layers together behind user actions
//!   ([`PlotterSession`]), with background file reads via [`FileLoader`]
//!
//! # Parsing and validating
//!
//! ```
//! use plotter_core::{parse_csv, validate};
//!
//! let rows = parse_csv("Latitude,Longitude,Label\n1,2,\"New York, NY\"\n").unwrap();
//! let record = validate(rows[0].latitude(), rows[0].longitude(), rows[0].label()).unwrap();
//!
//! assert_eq!(record.label(), "New York, NY");
//! assert!(validate("91", "0", None).is_err());
//! ```

pub mod error;
pub mod loader;
pub mod parser;
pub mod projection;
pub mod record;
pub mod session;
pub mod store;
pub mod surface;
pub mod sync;
pub mod validator;

pub use error::PlotterError;
pub use loader::{FileLoader, FileReadOutcome};
pub use parser::{parse_csv, CsvRow};
pub use projection::{fit_bounds, WebMercator};
pub use record::{BoundingBox, CoordinateRecord, LatLon};
pub use session::{ImportSummary, ManualEntryForm, PlotterSession};
pub use store::CoordinateStore;
pub use surface::{MarkerIcon, RenderingSurface, SurfaceError, SurfaceHost, SurfaceOptions, TileLayer};
pub use sync::{RecomputeReport, ViewOptions, ViewSynchronizer};
pub use validator::{validate, Field, Rejection};
