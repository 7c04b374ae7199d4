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

//! Plotting session.
//!
//! Owns the record store, the zoom intent and the layout flag, and triggers
//! a view recomputation after every change to any of them. Errors from
//! imports and manual entry are recovered here and kept as the single most
//! recent message for display.

use std::fmt;

use log::{debug, error, info, warn};

use crate::error::PlotterError;
use crate::parser::parse_csv;
use crate::record::CoordinateRecord;
use crate::store::CoordinateStore;
use crate::surface::{SurfaceError, SurfaceHost, SurfaceOptions};
use crate::sync::{RecomputeReport, ViewOptions, ViewSynchronizer};
use crate::validator::validate;

/// Text fields of the manual entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntryForm {
    pub latitude: String,
    pub longitude: String,
    pub label: String,
}

impl ManualEntryForm {
    pub fn clear(&mut self) {
        self.latitude.clear();
        self.longitude.clear();
        self.label.clear();
    }
}

/// Aggregate result of one bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub rejected: usize,
}

impl ImportSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.added + self.rejected
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imported {} of {} rows", self.added, self.total())?;
        if self.rejected > 0 {
            write!(f, " ({} rejected)", self.rejected)?;
        }
        Ok(())
    }
}

/// State of one plotting session.
pub struct PlotterSession<H: SurfaceHost> {
    store: CoordinateStore,
    zoom_intent: Option<CoordinateRecord>,
    expanded: bool,
    synchronizer: ViewSynchronizer<H>,
    last_error: Option<PlotterError>,
    last_import: Option<ImportSummary>,
    last_report: Option<RecomputeReport>,
}

impl<H: SurfaceHost> fmt::Debug for PlotterSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotterSession")
            .field("records", &self.store.len())
            .field("zoom_intent", &self.zoom_intent)
            .field("expanded", &self.expanded)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<H: SurfaceHost> PlotterSession<H> {
    #[must_use]
    pub fn new(host: H, surface_options: SurfaceOptions, view_options: ViewOptions) -> Self {
        Self {
            store: CoordinateStore::new(),
            zoom_intent: None,
            expanded: false,
            synchronizer: ViewSynchronizer::new(host, surface_options, view_options),
            last_error: None,
            last_import: None,
            last_report: None,
        }
    }

    /// Bring the view in line with the current state.
    ///
    /// Hosts call this once their map region exists; it builds the surface
    /// on first use.
    pub fn refresh(&mut self) {
        self.recompute();
    }

    /// Validate the form and add its record.
    ///
    /// On success the form is cleared; on failure it is left as typed.
    pub fn submit_manual(&mut self, form: &mut ManualEntryForm) -> Result<(), PlotterError> {
        let record = match validate(&form.latitude, &form.longitude, Some(form.label.as_str())) {
            Ok(record) => record,
            Err(rejection) => {
                debug!("Manual entry rejected: {rejection}");
                return Err(self.fail(PlotterError::ManualEntryInvalid));
            }
        };

        info!("Added {} at {}", record.label(), record.position());
        self.store.append(record);
        self.zoom_intent = None;
        self.last_import = None;
        self.last_error = None;
        form.clear();
        self.recompute();
        Ok(())
    }

    /// Import CSV text, pasted or read from a file.
    ///
    /// Rows that fail validation are dropped and only counted. A structural
    /// failure leaves the session untouched apart from the error message.
    pub fn import_csv_text(&mut self, text: &str) -> Result<ImportSummary, PlotterError> {
        let rows = parse_csv(text).map_err(|e| self.fail(e))?;

        let mut added = Vec::with_capacity(rows.len());
        let mut rejected = 0;
        for row in &rows {
            match validate(row.latitude(), row.longitude(), row.label()) {
                Ok(record) => added.push(record),
                Err(rejection) => {
                    debug!("Dropping CSV row: {rejection}");
                    rejected += 1;
                }
            }
        }

        let summary = ImportSummary {
            added: added.len(),
            rejected,
        };
        info!("{summary}");

        self.zoom_intent = added.first().cloned();
        self.store.append_all(added);
        self.last_import = Some(summary);
        self.last_error = None;
        self.recompute();

        Ok(summary)
    }

    /// Remove every record.
    pub fn clear_all(&mut self) {
        info!("Clearing {} coordinates", self.store.len());
        self.store.clear();
        self.zoom_intent = None;
        self.last_import = None;
        self.last_error = None;
        self.recompute();
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
        self.recompute();
    }

    /// Set the layout flag, recomputing only if it changes.
    pub fn set_expanded(&mut self, expanded: bool) {
        if self.expanded != expanded {
            self.toggle_expanded();
        }
    }

    /// Run work deferred until the host's layout has settled.
    pub fn run_idle_tasks(&mut self) -> bool {
        self.synchronizer.run_idle()
    }

    /// Record an error raised by an outer collaborator, such as a file read.
    pub fn report_error(&mut self, error: PlotterError) {
        self.fail(error);
    }

    #[must_use]
    pub fn snapshot(&self) -> &[CoordinateRecord] {
        self.store.snapshot()
    }

    #[must_use]
    pub fn zoom_intent(&self) -> Option<&CoordinateRecord> {
        self.zoom_intent.as_ref()
    }

    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&PlotterError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn last_import(&self) -> Option<ImportSummary> {
        self.last_import
    }

    /// Marker placement warnings from the latest recomputation.
    #[must_use]
    pub fn warnings(&self) -> &[SurfaceError] {
        self.last_report
            .as_ref()
            .map(|report| report.warnings.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn surface(&self) -> Option<&H::Surface> {
        self.synchronizer.surface()
    }

    pub fn surface_mut(&mut self) -> Option<&mut H::Surface> {
        self.synchronizer.surface_mut()
    }

    #[must_use]
    pub fn synchronizer(&self) -> &ViewSynchronizer<H> {
        &self.synchronizer
    }

    fn fail(&mut self, error: PlotterError) -> PlotterError {
        warn!("{error}");
        self.last_import = None;
        self.last_error = Some(error.clone());
        error
    }

    fn recompute(&mut self) {
        let snapshot = self.store.snapshot();
        match self.synchronizer.recompute(snapshot, self.zoom_intent.as_ref()) {
            Ok(report) => self.last_report = Some(report),
            Err(e) => {
                error!("View update failed: {e}");
                self.last_error = Some(e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{RecordingHost, SurfaceCommand};

    fn session() -> PlotterSession<RecordingHost> {
        let mut session = PlotterSession::new(
            RecordingHost::default(),
            SurfaceOptions::default(),
            ViewOptions::default(),
        );
        session.refresh();
        session
    }

    fn form(lat: &str, lon: &str, label: &str) -> ManualEntryForm {
        ManualEntryForm {
            latitude: lat.to_string(),
            longitude: lon.to_string(),
            label: label.to_string(),
        }
    }

    fn marker_count(session: &PlotterSession<RecordingHost>) -> usize {
        session.surface().unwrap().markers.len()
    }

    #[test]
    fn test_manual_entry_success_clears_form() {
        let mut session = session();
        let mut entry = form("12.5", "45.25", "");

        session.submit_manual(&mut entry).unwrap();

        assert_eq!(entry, ManualEntryForm::default());
        assert_eq!(session.snapshot().len(), 1);
        assert_eq!(session.snapshot()[0].label(), "12.5, 45.25");
        assert_eq!(marker_count(&session), 1);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_manual_entry_failure_keeps_form() {
        let mut session = session();
        let mut entry = form("95", "10", "Nowhere");

        let err = session.submit_manual(&mut entry).unwrap_err();

        assert_eq!(err, PlotterError::ManualEntryInvalid);
        assert_eq!(entry, form("95", "10", "Nowhere"));
        assert!(session.snapshot().is_empty());
        assert_eq!(session.last_error(), Some(&PlotterError::ManualEntryInvalid));
    }

    #[test]
    fn test_import_adds_valid_rows_and_sets_intent() {
        let mut session = session();
        let summary = session
            .import_csv_text("latitude,longitude,label\n10,20,Home\n100,20,Bad\n30,40,\n")
            .unwrap();

        assert_eq!(summary, ImportSummary { added: 2, rejected: 1 });
        assert_eq!(summary.to_string(), "Imported 2 of 3 rows (1 rejected)");
        let labels: Vec<&str> = session.snapshot().iter().map(CoordinateRecord::label).collect();
        assert_eq!(labels, ["Home", "30, 40"]);
        assert_eq!(session.zoom_intent().map(CoordinateRecord::label), Some("Home"));
        assert_eq!(marker_count(&session), 2);
    }

    #[test]
    fn test_import_appends_after_existing_records() {
        let mut session = session();
        session.submit_manual(&mut form("1", "1", "first")).unwrap();
        session
            .import_csv_text("latitude,longitude,label\n2,2,second\n3,3,third\n")
            .unwrap();

        let labels: Vec<&str> = session.snapshot().iter().map(CoordinateRecord::label).collect();
        assert_eq!(labels, ["first", "second", "third"]);
        assert_eq!(session.zoom_intent().map(CoordinateRecord::label), Some("second"));
    }

    #[test]
    fn test_missing_columns_leaves_store_unchanged() {
        let mut session = session();
        session
            .import_csv_text("latitude,longitude,label\n1,2,a\n")
            .unwrap();
        let commands_before = session.surface().unwrap().commands.len();

        let err = session.import_csv_text("lat,lng\n1,2\n").unwrap_err();

        assert!(matches!(err, PlotterError::MissingColumns { .. }));
        assert_eq!(session.snapshot().len(), 1);
        assert_eq!(session.zoom_intent().map(CoordinateRecord::label), Some("a"));
        assert_eq!(session.surface().unwrap().commands.len(), commands_before);
        assert!(matches!(session.last_error(), Some(PlotterError::MissingColumns { .. })));
    }

    #[test]
    fn test_import_without_valid_rows_clears_intent() {
        let mut session = session();
        session.import_csv_text("latitude,longitude\n5,5\n").unwrap();
        assert!(session.zoom_intent().is_some());

        let summary = session.import_csv_text("latitude,longitude\nx,y\n").unwrap();
        assert_eq!(summary, ImportSummary { added: 0, rejected: 1 });
        assert!(session.zoom_intent().is_none());
    }

    #[test]
    fn test_manual_add_clears_intent() {
        let mut session = session();
        session.import_csv_text("latitude,longitude\n5,5\n6,6\n").unwrap();
        session.submit_manual(&mut form("7", "7", "")).unwrap();

        assert!(session.zoom_intent().is_none());
        assert_eq!(session.snapshot().len(), 3);
    }

    #[test]
    fn test_clear_all_then_empty_view() {
        let mut session = session();
        session.import_csv_text("latitude,longitude\n5,5\n6,6\n").unwrap();

        session.clear_all();

        assert!(session.snapshot().is_empty());
        assert!(session.zoom_intent().is_none());
        assert_eq!(marker_count(&session), 0);

        let commands = &session.surface().unwrap().commands;
        let last_clear = commands
            .iter()
            .rposition(|c| *c == SurfaceCommand::RemoveAllMarkers)
            .unwrap();
        assert!(!commands[last_clear..]
            .iter()
            .any(|c| matches!(c, SurfaceCommand::FitBounds(..))));
    }

    #[test]
    fn test_successful_action_clears_error() {
        let mut session = session();
        let _ = session.submit_manual(&mut form("abc", "0", ""));
        assert!(session.last_error().is_some());

        session.import_csv_text("latitude,longitude\n1,1\n").unwrap();
        assert!(session.last_error().is_none());
        assert_eq!(
            session.last_import(),
            Some(ImportSummary { added: 1, rejected: 0 })
        );
    }

    #[test]
    fn test_only_latest_error_is_kept() {
        let mut session = session();
        let _ = session.submit_manual(&mut form("abc", "0", ""));
        let _ = session.import_csv_text("foo,bar\n");

        assert!(matches!(session.last_error(), Some(PlotterError::MissingColumns { .. })));
    }

    #[test]
    fn test_layout_toggle_recomputes_and_keeps_intent() {
        let mut session = session();
        session
            .import_csv_text("latitude,longitude,label\n10,10,a\n20,20,b\n")
            .unwrap();
        session.run_idle_tasks();
        let before = session.surface().unwrap().commands.len();

        session.toggle_expanded();

        assert!(session.is_expanded());
        let surface = session.surface().unwrap();
        assert!(surface.commands.len() > before);
        assert_eq!(surface.center, session.snapshot()[0].position());
        assert_eq!(surface.zoom, 10);

        assert!(session.run_idle_tasks());
        assert_eq!(
            session.surface().unwrap().commands.last(),
            Some(&SurfaceCommand::InvalidateSize)
        );
    }

    #[test]
    fn test_set_expanded_is_idempotent() {
        let mut session = session();
        session.run_idle_tasks();
        session.set_expanded(false);
        assert!(!session.run_idle_tasks(), "no change means no recompute");

        session.set_expanded(true);
        assert!(session.is_expanded());
        assert!(session.run_idle_tasks());
    }

    #[test]
    fn test_marker_failures_surface_as_warnings() {
        let mut session = PlotterSession::new(
            RecordingHost::failing_on(&["bad"]),
            SurfaceOptions::default(),
            ViewOptions::default(),
        );
        session
            .import_csv_text("latitude,longitude,label\n1,1,good\n2,2,bad\n")
            .unwrap();

        assert_eq!(session.snapshot().len(), 2, "store is not affected");
        assert_eq!(session.warnings().len(), 1);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_surface_failure_is_reported() {
        let mut session = PlotterSession::new(
            RecordingHost {
                fail: true,
                ..RecordingHost::default()
            },
            SurfaceOptions::default(),
            ViewOptions::default(),
        );
        session.refresh();

        assert!(matches!(session.last_error(), Some(PlotterError::Surface(_))));
        assert!(session.surface().is_none());
    }
}
