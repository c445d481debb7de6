mod app;
mod color;
mod config;
mod data;
mod logging;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::TileLabelerApp;
use clap::Parser;
use config::{Config, DEFAULT_CONFIG_PATH};
use eframe::egui;
use state::AppState;

/// Page through image tiles of a Parquet dataset and label them by clicking.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Settings file, created with defaults if missing
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log file, truncated on start; receives debug output
    #[arg(long, default_value = logging::DEFAULT_LOG_PATH)]
    log_file: PathBuf,

    /// Dataset to open on start instead of asking with a file dialog
    dataset: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_file)?;

    let config = Config::load_or_create(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;

    // Fit the grid plus the side panel and control bar.
    let tile = config.tile_size as f32;
    let width = config.x_size as f32 * tile + 260.0;
    let height = config.y_size as f32 * tile + 120.0;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width.max(900.0), height.max(500.0)])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let state = AppState::new(config, args.config);
    let dataset = args.dataset;

    eframe::run_native(
        "Tile Labeler",
        options,
        Box::new(move |_cc| Ok(Box::new(TileLabelerApp::new(state, dataset)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
