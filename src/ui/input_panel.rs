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

use std::path::PathBuf;

use plotter_core::{ImportSummary, ManualEntryForm, PlotterError, SurfaceError};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 70, 70);
const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(60, 160, 90);
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 160, 40);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvTab {
    #[default]
    Upload,
    Paste,
}

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    AddCoordinate,
    ClearAll,
    OpenFile(PathBuf),
    ProcessPaste(String),
}

/// Feedback shown under the inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStatus<'a> {
    pub error: Option<&'a PlotterError>,
    pub import: Option<ImportSummary>,
    pub warnings: &'a [SurfaceError],
    pub loading: bool,
}

/// Manual entry form plus CSV upload and paste tabs
#[derive(Debug, Default)]
pub struct InputPanel {
    pub form: ManualEntryForm,
    pub tab: CsvTab,
    pub paste_text: String,
}

impl InputPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, status: PanelStatus<'_>) -> Option<InputAction> {
        let mut action = None;

        ui.heading("Add Coordinates");
        ui.add_space(6.0);

        egui::Grid::new("manual_entry")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Latitude");
                ui.add(egui::TextEdit::singleline(&mut self.form.latitude).hint_text("e.g. 40.7128"));
                ui.end_row();

                ui.label("Longitude");
                ui.add(egui::TextEdit::singleline(&mut self.form.longitude).hint_text("e.g. -74.0060"));
                ui.end_row();

                ui.label("Label");
                ui.add(egui::TextEdit::singleline(&mut self.form.label).hint_text("optional"));
                ui.end_row();
            });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("Add Coordinate").clicked() {
                action = Some(InputAction::AddCoordinate);
            }
            if ui.button("Clear All").clicked() {
                action = Some(InputAction::ClearAll);
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.heading("Import CSV");
        ui.label(
            egui::RichText::new("Columns: latitude, longitude, label (optional)")
                .small()
                .weak(),
        );
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, CsvTab::Upload, "Upload");
            ui.selectable_value(&mut self.tab, CsvTab::Paste, "Paste");
        });
        ui.add_space(4.0);

        let tab_action = match self.tab {
            CsvTab::Upload => Self::show_upload(ui, status.loading),
            CsvTab::Paste => self.show_paste(ui),
        };
        action = action.or(tab_action);

        ui.add_space(12.0);
        Self::show_status(ui, &status);

        action
    }

    fn show_upload(ui: &mut egui::Ui, loading: bool) -> Option<InputAction> {
        let mut action = None;
        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());

        let stroke_color = if hovering {
            egui::Color32::from_rgb(100, 180, 220)
        } else {
            egui::Color32::from_gray(120)
        };

        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.5, stroke_color))
            .inner_margin(egui::Margin::same(16))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    let prompt = if hovering {
                        "Drop the CSV file here"
                    } else {
                        "Drag and drop a CSV file here"
                    };
                    ui.label(prompt);
                    ui.add_space(4.0);
                    if ui.button("Browse...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("CSV Files", &["csv"])
                            .pick_file()
                        {
                            action = Some(InputAction::OpenFile(path));
                        }
                    }
                    if loading {
                        ui.add_space(4.0);
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Reading file...");
                        });
                    }
                });
            });

        action
    }

    fn show_paste(&mut self, ui: &mut egui::Ui) -> Option<InputAction> {
        ui.add(
            egui::TextEdit::multiline(&mut self.paste_text)
                .hint_text("latitude,longitude,label\n40.7128,-74.0060,New York")
                .code_editor()
                .desired_rows(8)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(4.0);

        ui.button("Process CSV")
            .clicked()
            .then(|| InputAction::ProcessPaste(self.paste_text.clone()))
    }

    fn show_status(ui: &mut egui::Ui, status: &PanelStatus<'_>) {
        if let Some(error) = status.error {
            egui::Frame::new()
                .fill(ERROR_COLOR.gamma_multiply(0.15))
                .stroke(egui::Stroke::new(1.0, ERROR_COLOR))
                .corner_radius(4.0)
                .inner_margin(egui::Margin::same(8))
                .show(ui, |ui| {
                    ui.colored_label(ERROR_COLOR, error.to_string());
                });
        }

        if let Some(summary) = status.import {
            let color = if summary.rejected == 0 { SUCCESS_COLOR } else { WARNING_COLOR };
            ui.colored_label(color, summary.to_string());
        }

        for warning in status.warnings {
            ui.colored_label(WARNING_COLOR, format!("⚠ {warning}"));
        }
    }
}
