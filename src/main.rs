//! # Voxel Streamer Demo
//!
//! Runs the engine headless: an observer walks in a straight line while
//! chunks stream, light and mesh around it, and counters are logged.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- [config.json] [frames]
//! ```

use std::process::ExitCode;

use log::{error, info};
use voxel_streamer::config::EngineConfig;

const DEFAULT_FRAMES: usize = 600;

fn main() -> ExitCode {
    voxel_streamer::init_logging();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match EngineConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    match voxel_streamer::run_headless(config, frames) {
        Ok(summary) => {
            info!("Final counters: {:?}", summary.counters);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
