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

mod app;
mod config;
mod map;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use log::info;
use mimalloc::MiMalloc;

use app::PlotterApp;
use config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Plot latitude/longitude points on an interactive map
#[derive(Debug, Parser)]
#[command(name = "coordinate-plotter", version, about)]
struct Args {
    /// CSV files to import at startup, in order
    files: Vec<PathBuf>,

    /// Start with the input panel and table hidden
    #[arg(long)]
    expanded: bool,

    /// Write the default configuration file and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.write_default_config {
        AppConfig::default().save()?;
        info!("Wrote default configuration to {}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let config = AppConfig::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    let handle = runtime.handle().clone();

    info!("Starting Coordinate Plotter...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Coordinate Plotter")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Coordinate Plotter",
        options,
        Box::new(move |cc| {
            Ok(Box::new(PlotterApp::new(
                &cc.egui_ctx,
                &config,
                handle,
                args.expanded,
                &args.files,
            )))
        }),
    )?;

    drop(runtime);
    Ok(())
}
