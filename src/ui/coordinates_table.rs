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

use egui_extras::{Column, TableBuilder};
use plotter_core::CoordinateRecord;

const ROW_HEIGHT: f32 = 20.0;

/// Read-only table of every plotted coordinate
pub fn show(ui: &mut egui::Ui, records: &[CoordinateRecord]) {
    ui.horizontal(|ui| {
        ui.strong("Coordinates");
        ui.label(egui::RichText::new(format!("({})", records.len())).weak());
    });

    if records.is_empty() {
        ui.label(egui::RichText::new("No coordinates yet").weak().italics());
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::remainder())
        .header(ROW_HEIGHT, |mut header| {
            header.col(|ui| {
                ui.strong("Latitude");
            });
            header.col(|ui| {
                ui.strong("Longitude");
            });
            header.col(|ui| {
                ui.strong("Label");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, records.len(), |mut row| {
                let record = &records[row.index()];
                row.col(|ui| {
                    ui.monospace(format!("{:.6}", record.latitude()));
                });
                row.col(|ui| {
                    ui.monospace(format!("{:.6}", record.longitude()));
                });
                row.col(|ui| {
                    ui.label(record.label());
                });
            });
        });
}
