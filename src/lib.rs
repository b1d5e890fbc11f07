#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streamer
//!
//! The streaming and meshing core of a voxel engine: it keeps a set of
//! fixed-height chunks loaded around a moving observer, lights them, builds
//! their meshes on a worker pool and hands finished vertex lists to a
//! rendering collaborator.
//!
//! ## Key Modules
//!
//! * `config` - Engine tunables, loadable from JSON
//! * `engine_state` - The world, lighting, meshing, scheduling and streaming
//! * `error` - Error types
//!
//! ## Architecture
//!
//! One owning thread holds every chunk. Mesh workers only ever see copies
//! taken at submission time and hand results back through a queue that the
//! owning thread drains once per frame. Nothing in the crate talks to a GPU;
//! a `RenderSink` receives the packed vertices.
//!
//! ## Usage
//!
//! ```ignore
//! voxel_streamer::init_logging();
//! let summary = voxel_streamer::run_headless(EngineConfig::default(), 600)?;
//! ```
//!
//! ## Performance Considerations
//!
//! * Chunks are pooled and reused instead of reallocated
//! * Mesh builds run in parallel, bounded by a per-tick submission budget
//! * Light is recomputed only around new chunks and edits
//! * Distant chunks mesh at reduced level of detail

use cgmath::Vector3;
use log::info;

pub mod config;
pub mod engine_state;
pub mod error;

use config::EngineConfig;
use engine_state::observability::CounterSnapshot;
use engine_state::rendering::vertex::VoxelVertex;
use engine_state::rendering::{RenderPass, RenderSink};
use engine_state::voxels::coords::ChunkCoord;
use engine_state::EngineState;
use error::EngineError;

/// Name of the stopwatch the demo binary reports.
pub const HEADLESS_RUN_STOPWATCH: &str = "Headless Run";

/// Installs `env_logger` writing to stdout, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls, or a logger installed by the
/// embedding application, win.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let initialized = log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();
    if initialized {
        info!("Logger initialized");
    }
}

/// Totals of a headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadlessSummary {
    /// Frames run.
    pub frames: usize,
    /// `upload_and_draw` calls made.
    pub draw_calls: usize,
    /// Vertices handed to the sink across all frames.
    pub vertices_drawn: usize,
    /// Counters after the last frame.
    pub counters: CounterSnapshot,
}

/// Render sink that only counts what it is given.
#[derive(Debug, Default)]
pub struct CountingSink {
    /// `upload_and_draw` calls made.
    pub draw_calls: usize,
    /// Vertices received.
    pub vertices: usize,
    /// Calls made for the transparent pass.
    pub transparent_calls: usize,
}

impl RenderSink for CountingSink {
    fn upload_and_draw(&mut self, _coord: ChunkCoord, pass: RenderPass, vertices: &[VoxelVertex]) {
        self.draw_calls += 1;
        self.vertices += vertices.len();
        if pass == RenderPass::Transparent {
            self.transparent_calls += 1;
        }
    }
}

/// Walks an observer along +X for `frames` frames without any GPU.
///
/// The observer moves a quarter block per frame at a fixed height, so chunks
/// stream in ahead and out behind.
///
/// # Arguments
/// * `config` - Engine configuration
/// * `frames` - Number of frames to run
///
/// # Returns
/// Draw totals and the final counters, or why the engine could not start.
pub fn run_headless(config: EngineConfig, frames: usize) -> Result<HeadlessSummary, EngineError> {
    let mut engine = EngineState::with_defaults(config)?;
    let mut sink = CountingSink::default();
    let start = web_time::Instant::now();

    for frame in 0..frames {
        let observer = Vector3::new(frame as f32 * 0.25, 80.0, 8.0);
        engine.frame(observer, &mut sink);
    }

    let counters = engine.streamer.counters();
    info!(
        "{}: {} frames in {:?}, {} draw calls, {} vertices",
        HEADLESS_RUN_STOPWATCH,
        frames,
        start.elapsed(),
        sink.draw_calls,
        sink.vertices
    );
    Ok(HeadlessSummary {
        frames,
        draw_calls: sink.draw_calls,
        vertices_drawn: sink.vertices,
        counters,
    })
}
