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

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use plotter_core::loader::{decode_csv_bytes, is_csv_path, read_csv_file};
use plotter_core::{FileLoader, PlotterError, PlotterSession};
use tokio::runtime::Handle;

use crate::config::AppConfig;
use crate::map::EguiSurfaceHost;
use crate::ui::{coordinates_table, InputAction, InputPanel, PanelStatus};

/// How often to check for a finished background read
const LOADER_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct PlotterApp {
    session: PlotterSession<EguiSurfaceHost>,
    loader: FileLoader,
    runtime: Handle,
    input: InputPanel,
}

impl std::fmt::Debug for PlotterApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotterApp")
            .field("session", &self.session)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl PlotterApp {
    pub fn new(
        ctx: &egui::Context,
        config: &AppConfig,
        runtime: Handle,
        expanded: bool,
        initial_files: &[PathBuf],
    ) -> Self {
        let host = EguiSurfaceHost::new(ctx.clone(), config.tile_cache_days);
        let mut session = PlotterSession::new(host, config.surface_options(), config.view_options());
        session.set_expanded(expanded || config.start_expanded);

        let mut app = Self {
            session,
            loader: FileLoader::new(runtime.clone()),
            runtime,
            input: InputPanel::new(),
        };

        // First render builds the map even when nothing is loaded
        app.session.refresh();

        for path in initial_files {
            app.import_startup_file(path);
        }

        app
    }

    /// Files named on the command line are read in order, each one fully
    fn import_startup_file(&mut self, path: &Path) {
        if !is_csv_path(path) {
            self.session.report_error(PlotterError::UnsupportedFile {
                name: path.display().to_string(),
            });
            return;
        }
        match self.runtime.block_on(read_csv_file(path)) {
            Ok(text) => self.import_text(&text, &path.display().to_string()),
            Err(e) => self.session.report_error(e),
        }
    }

    fn import_text(&mut self, text: &str, source: &str) {
        // Failures are recorded on the session for display
        if let Ok(summary) = self.session.import_csv_text(text) {
            debug!("{source}: {summary}");
        }
    }

    fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::AddCoordinate => {
                if self.session.submit_manual(&mut self.input.form).is_ok() {
                    debug!("Added manual coordinate");
                }
            }
            InputAction::ClearAll => self.session.clear_all(),
            InputAction::OpenFile(path) => self.request_file(path),
            InputAction::ProcessPaste(text) => self.import_text(&text, "pasted text"),
        }
    }

    fn request_file(&mut self, path: PathBuf) {
        match self.loader.request(path) {
            Ok(generation) => info!("Reading file (request {generation})"),
            Err(e) => self.session.report_error(e),
        }
    }

    fn poll_loader(&mut self) {
        if let Some(outcome) = self.loader.poll() {
            match outcome.result {
                Ok(text) => self.import_text(&text, &outcome.path.display().to_string()),
                Err(e) => {
                    error!("Failed to read {}: {e}", outcome.path.display());
                    self.session.report_error(e);
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        if dropped.iter().all(|file| file.path.is_some()) {
            let paths = dropped.into_iter().filter_map(|file| file.path);
            if let Some(Err(e)) = self.loader.accept_dropped(paths) {
                self.session.report_error(e);
            }
            return;
        }

        // Without a path the drop carries the file contents directly
        if dropped.len() > 1 {
            warn!("Only one file can be imported at a time; ignoring {} extra file(s)", dropped.len() - 1);
        }
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if !is_csv_path(Path::new(&file.name)) {
            self.session.report_error(PlotterError::UnsupportedFile { name: file.name });
            return;
        }
        let Some(bytes) = file.bytes else {
            self.session.report_error(PlotterError::FileRead {
                path: file.name,
                reason: "no file contents were provided".to_string(),
            });
            return;
        };
        match decode_csv_bytes(&file.name, bytes.to_vec()) {
            Ok(text) => self.import_text(&text, &file.name),
            Err(e) => self.session.report_error(e),
        }
    }

    fn draw_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Coordinate Plotter");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.session.is_expanded() {
                    "⤡ Show Panels"
                } else {
                    "⤢ Expand Map"
                };
                if ui.button(label).clicked() {
                    self.session.toggle_expanded();
                }
            });
        });
    }
}

impl eframe::App for PlotterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        self.handle_dropped_files(ctx);

        if !self.session.is_expanded() {
            let mut action = None;
            egui::SidePanel::left("input_panel")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        let status = PanelStatus {
                            error: self.session.last_error(),
                            import: self.session.last_import(),
                            warnings: self.session.warnings(),
                            loading: self.loader.is_pending(),
                        };
                        action = self.input.show(ui, status);
                    });
                });

            egui::TopBottomPanel::bottom("coordinates_table")
                .resizable(true)
                .default_height(200.0)
                .show(ctx, |ui| {
                    coordinates_table::show(ui, self.session.snapshot());
                });

            if let Some(action) = action {
                self.apply(action);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_header(ui);
            ui.add_space(4.0);
            if let Some(surface) = self.session.surface_mut() {
                surface.show(ui);
            }
        });

        // Deferred resize runs once layout for this frame is settled
        if self.session.run_idle_tasks() {
            ctx.request_repaint();
        }

        if self.loader.is_pending() {
            ctx.request_repaint_after(LOADER_POLL_INTERVAL);
        }
    }
}
