//! # Engine State Module
//!
//! The core engine module that ties the voxel world, the mesh workers and
//! the rendering collaborator together into a frame loop.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the streamer and runs one frame at a time
//! * `behavior` - Listeners notified when voxels appear or disappear
//! * `observability` - Build failure reporting and engine counters
//! * `rendering` - Meshing, the mesh task scheduler and the render sink
//! * `task_management` - The worker pool mesh builds run on
//! * `voxels` - Voxel data, chunks, lighting, generation and streaming
//!
//! ## Frame Order
//!
//! Every frame runs, on the owning thread:
//!
//! 1. `WorldStreamer::update` - unload, load, relight, submit
//! 2. `WorldStreamer::drain_completed` - attach finished meshes
//! 3. `WorldStreamer::render` - hand vertex lists to the sink
//! 4. a counter report to the observer, at most once per interval

use std::sync::Arc;

use cgmath::Vector3;
use log::info;
use web_time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::EngineError;
use observability::LogObserver;
use rendering::scheduler::DrainReport;
use rendering::texture::TextureAtlasMapping;
use rendering::RenderSink;
use voxels::generation::PerlinTerrain;
use voxels::persistence::{ChunkStore, DirectoryChunkStore, MemoryChunkStore};
use voxels::streaming::{UpdateReport, WorldStreamer};

pub mod behavior;
pub mod observability;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// What one frame did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Streaming tick result.
    pub update: UpdateReport,
    /// Mesh results drained this frame.
    pub drained: DrainReport,
}

/// The main state container for the voxel engine.
///
/// # Examples
///
/// ```ignore
/// let mut engine = EngineState::with_defaults(EngineConfig::default())?;
///
/// // Main loop
/// loop {
///     engine.frame(observer_position, &mut sink);
/// }
/// ```
pub struct EngineState {
    /// Loaded chunks, lighting, meshing and persistence
    pub streamer: WorldStreamer,
    /// When counters were last reported
    last_report: Instant,
    /// Time between counter reports
    report_interval: Duration,
}

impl EngineState {
    /// Creates an engine around an existing streamer.
    ///
    /// # Arguments
    /// * `streamer` - Configured world streamer
    pub fn new(streamer: WorldStreamer) -> Self {
        let report_interval = Duration::try_from_secs_f32(streamer.config().counters_interval_secs)
            .unwrap_or(Duration::from_secs(1));
        EngineState {
            streamer,
            last_report: Instant::now(),
            report_interval,
        }
    }

    /// Creates an engine with Perlin terrain, the default texture atlas and
    /// the store named by the configuration.
    ///
    /// # Arguments
    /// * `config` - Engine configuration, validated here
    ///
    /// # Returns
    /// The engine, or why the configuration or save directory is unusable.
    pub fn with_defaults(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let store: Box<dyn ChunkStore> = match &config.save_directory {
            Some(dir) => {
                info!("Saving edited chunks to {}", dir.display());
                Box::new(DirectoryChunkStore::new(dir)?)
            }
            None => Box::new(MemoryChunkStore::new(config.memory_store_capacity)),
        };
        let streamer = WorldStreamer::new(
            config.clone(),
            Arc::new(TextureAtlasMapping::default_atlas()),
            Box::new(PerlinTerrain::new(config.world_seed)),
            store,
            Box::new(LogObserver),
        );
        Ok(Self::new(streamer))
    }

    /// Runs one frame: stream, drain, render, report.
    ///
    /// # Arguments
    /// * `observer_pos` - Observer position in world space
    /// * `sink` - Rendering collaborator
    pub fn frame(&mut self, observer_pos: Vector3<f32>, sink: &mut dyn RenderSink) -> FrameReport {
        let update = self.streamer.update(observer_pos);
        let drained = self.streamer.drain_completed();
        self.streamer.render(sink);

        if self.last_report.elapsed() >= self.report_interval {
            self.last_report = Instant::now();
            self.streamer.report_counters();
        }

        FrameReport { update, drained }
    }
}
