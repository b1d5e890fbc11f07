//! # World Streaming
//!
//! `WorldStreamer` owns the loaded-chunk set and keeps it centered on an
//! observer. Each tick it:
//!
//! 1. unloads chunks farther than the unload radius (saving edited ones),
//! 2. loads missing chunks inside the load radius, from the store if one was
//!    saved and from the content source otherwise,
//! 3. relights the new chunks and the ring around them,
//! 4. marks chunks whose mesh LOD no longer matches their distance dirty,
//! 5. submits dirty chunks inside the load radius to the mesh scheduler,
//!    closest first, up to the per-tick budget.
//!
//! The gap between the two radii is the hysteresis band: a chunk loaded at
//! the edge of the load radius is not unloaded until the observer has moved
//! past the unload radius.
//!
//! Edits go through `set_block`, which relights the affected region before
//! returning so the next submission never meshes stale light.

use std::collections::BTreeSet;
use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::{debug, info, warn};

use super::block::{block_type::BlockType, Block};
use super::coords::{y_in_range, ChunkCoord};
use super::generation::ContentSource;
use super::lighting::LightPropagator;
use super::persistence::ChunkStore;
use super::world::World;
use crate::config::EngineConfig;
use crate::engine_state::behavior::{BehaviorListener, BehaviorRegistry};
use crate::engine_state::observability::{CounterSnapshot, EngineCounters, EngineObserver};
use crate::engine_state::rendering::meshing::lod::LodLevel;
use crate::engine_state::rendering::meshing::{MeshBuilder, MeshOptions};
use crate::engine_state::rendering::scheduler::{DrainReport, MeshTaskScheduler, SubmitOutcome};
use crate::engine_state::rendering::texture::TextureMapping;
use crate::engine_state::rendering::{RenderPass, RenderSink};

/// What one `update` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Chunks unloaded this tick.
    pub unloaded: usize,
    /// Chunks loaded this tick.
    pub loaded: usize,
    /// Chunks loaded from the store rather than generated.
    pub restored: usize,
    /// Mesh tasks submitted this tick.
    pub submitted: usize,
}

/// Keeps the loaded-chunk set around an observer and drives meshing.
pub struct WorldStreamer {
    config: EngineConfig,
    world: World,
    scheduler: MeshTaskScheduler,
    content: Box<dyn ContentSource>,
    store: Box<dyn ChunkStore>,
    lighting: LightPropagator,
    behaviors: BehaviorRegistry,
    observer: Box<dyn EngineObserver>,
    counters: EngineCounters,
    observer_chunk: Option<ChunkCoord>,
}

impl WorldStreamer {
    /// Creates a streamer and starts its mesh workers.
    ///
    /// # Arguments
    /// * `config` - Validated engine configuration
    /// * `textures` - Block-to-layer lookup used by every mesh build
    /// * `content` - Source for chunks that have nothing stored
    /// * `store` - Storage for edited chunks
    /// * `observer` - Sink for build failures and counters
    pub fn new(
        config: EngineConfig,
        textures: Arc<dyn TextureMapping + Send + Sync>,
        content: Box<dyn ContentSource>,
        store: Box<dyn ChunkStore>,
        observer: Box<dyn EngineObserver>,
    ) -> Self {
        let builder = MeshBuilder::new(textures, MeshOptions::from(&config));
        let scheduler = MeshTaskScheduler::new(
            builder,
            config.resolved_worker_threads(),
            config.task_queue_capacity,
        );
        info!(
            "World streamer: load radius {}, unload radius {}, {} mesh workers",
            config.load_radius,
            config.unload_radius,
            scheduler.num_workers()
        );
        WorldStreamer {
            world: World::new(config.chunk_pool_capacity),
            scheduler,
            content,
            store,
            lighting: LightPropagator::new(),
            behaviors: BehaviorRegistry::new(),
            observer,
            counters: EngineCounters::default(),
            observer_chunk: None,
            config,
        }
    }

    /// Adds a behavior listener.
    pub fn register_listener(&mut self, listener: Box<dyn BehaviorListener>) {
        self.behaviors.register(listener);
    }

    /// Runs one streaming tick for an observer at a continuous world position.
    pub fn update(&mut self, observer_pos: Vector3<f32>) -> UpdateReport {
        self.update_chunk(ChunkCoord::from_world(observer_pos))
    }

    /// Runs one streaming tick for an observer inside chunk `center`.
    pub fn update_chunk(&mut self, center: ChunkCoord) -> UpdateReport {
        if self.observer_chunk != Some(center) {
            debug!("Observer entered chunk {:?}", center);
            self.observer_chunk = Some(center);
        }

        let mut report = UpdateReport {
            unloaded: self.unload_distant(center),
            ..UpdateReport::default()
        };

        let loaded = self.load_missing(center, &mut report);
        if !loaded.is_empty() {
            let targets: BTreeSet<ChunkCoord> = loaded
                .iter()
                .flat_map(|&coord| std::iter::once(coord).chain(coord.ring_neighbors()))
                .filter(|&coord| self.world.is_loaded(coord))
                .collect();
            let targets: Vec<ChunkCoord> = targets.into_iter().collect();
            self.lighting.relight(&mut self.world, &targets);
        }

        self.refresh_lods(center);
        report.submitted = self.submit_dirty(center);
        report
    }

    fn unload_distant(&mut self, center: ChunkCoord) -> usize {
        let mut distant: Vec<ChunkCoord> = self
            .world
            .coords()
            .filter(|&coord| coord.chebyshev_distance(center) > self.config.unload_radius)
            .collect();
        distant.sort();

        for &coord in &distant {
            let Some(chunk) = self.world.remove_chunk(coord) else {
                continue;
            };
            self.behaviors.notify_chunk_unloaded(&chunk);
            if chunk.is_modified() {
                if let Err(err) = self.store.save_chunk(&chunk) {
                    warn!("Could not save chunk {:?}: {}", coord, err);
                }
            }
            self.scheduler.forget(coord);
            self.world.release_chunk(chunk);
            debug!("Unloaded chunk {:?}", coord);
        }
        distant.len()
    }

    fn load_missing(&mut self, center: ChunkCoord, report: &mut UpdateReport) -> Vec<ChunkCoord> {
        let mut missing: Vec<ChunkCoord> = center
            .square_around(self.config.load_radius)
            .filter(|&coord| !self.world.is_loaded(coord))
            .collect();
        missing.sort_by_key(|&coord| (coord.chebyshev_distance(center), coord));

        for &coord in &missing {
            let mut chunk = self.world.acquire_chunk(coord);
            let restored = match self.store.load_chunk(coord, &mut chunk) {
                Ok(found) => found,
                Err(err) => {
                    warn!("Stored chunk {:?} is unusable, generating fresh: {}", coord, err);
                    false
                }
            };
            if restored {
                report.restored += 1;
            } else {
                self.content.populate(&mut chunk, coord);
            }
            chunk.clear_modified();
            chunk.mark_dirty();

            self.behaviors.notify_chunk_loaded(&chunk);
            self.world.insert_chunk(chunk);
            for neighbor in coord.face_neighbors() {
                self.world.mark_dirty(neighbor);
            }
            debug!("Loaded chunk {:?} (restored: {})", coord, restored);
        }
        report.loaded = missing.len();
        missing
    }

    fn refresh_lods(&mut self, center: ChunkCoord) {
        let lod_distances = self.config.lod_distances;
        let stale: Vec<ChunkCoord> = self
            .world
            .chunks()
            .filter(|chunk| !chunk.is_dirty())
            .filter(|chunk| {
                let distance = chunk.coord().chebyshev_distance(center);
                let desired = LodLevel::for_distance(distance, lod_distances);
                chunk.mesh_lod().is_some_and(|lod| lod != desired)
            })
            .map(|chunk| chunk.coord())
            .collect();
        for coord in stale {
            self.world.mark_dirty(coord);
        }
    }

    fn submit_dirty(&mut self, center: ChunkCoord) -> usize {
        let mut candidates: Vec<ChunkCoord> = self
            .world
            .chunks()
            .filter(|chunk| chunk.is_dirty())
            .map(|chunk| chunk.coord())
            .filter(|&coord| coord.chebyshev_distance(center) <= self.config.load_radius)
            .filter(|&coord| !self.scheduler.is_in_flight(coord))
            .collect();
        candidates.sort_by_key(|&coord| (coord.chebyshev_distance(center), coord));

        let mut submitted = 0;
        for coord in candidates {
            if submitted >= self.config.max_rebuilds_per_tick {
                break;
            }
            let distance = coord.chebyshev_distance(center);
            let lod = LodLevel::for_distance(distance, self.config.lod_distances);
            if self.scheduler.submit(&self.world, coord, lod) == SubmitOutcome::Submitted {
                submitted += 1;
            }
        }
        submitted
    }

    /// Attaches finished meshes and updates the counters. Never blocks.
    pub fn drain_completed(&mut self) -> DrainReport {
        let report = self
            .scheduler
            .drain_completed(&mut self.world, self.observer.as_ref());
        for &vertices in &report.vertex_counts {
            self.counters.record_rebuild(vertices);
        }
        self.counters.record_failures(report.failed);
        self.counters.record_truncations(report.truncated);
        report
    }

    /// Edits one voxel by world position and relights around it.
    ///
    /// # Returns
    /// The previous type if the world changed; `None` if the chunk is not
    /// loaded, `y` is outside the column, or the voxel already had `block_type`.
    pub fn set_block(&mut self, pos: Point3<i32>, block_type: BlockType) -> Option<BlockType> {
        if !y_in_range(pos.y) {
            return None;
        }
        let old = self.world.set_block(pos, Block::new(block_type))?;
        let coord = ChunkCoord::from_block(pos);
        let targets: Vec<ChunkCoord> = std::iter::once(coord)
            .chain(coord.ring_neighbors())
            .filter(|&neighbor| self.world.is_loaded(neighbor))
            .collect();
        self.lighting.relight(&mut self.world, &targets);

        let old_type = old.get_type().unwrap_or(BlockType::AIR);
        self.behaviors.notify_edit(pos, old_type, block_type);
        Some(old_type)
    }

    /// Type of the voxel at a world position. Air if not loaded.
    pub fn get_block(&self, pos: Point3<i32>) -> BlockType {
        self.world.get_block(pos).get_type().unwrap_or(BlockType::AIR)
    }

    /// Draws every visible chunk: all opaque passes, then all transparent
    /// passes from far to near.
    pub fn render(&self, sink: &mut dyn RenderSink) {
        let Some(center) = self.observer_chunk else {
            return;
        };
        let mut visible: Vec<_> = self
            .world
            .chunks()
            .filter(|chunk| chunk.coord().chebyshev_distance(center) <= self.config.load_radius)
            .collect();
        visible.sort_by_key(|chunk| (chunk.coord().chebyshev_distance(center), chunk.coord()));

        for chunk in &visible {
            let vertices = chunk.opaque_vertices();
            if !vertices.is_empty() {
                sink.upload_and_draw(chunk.coord(), RenderPass::Opaque, vertices);
            }
        }
        for chunk in visible.iter().rev() {
            let vertices = chunk.transparent_vertices();
            if !vertices.is_empty() {
                sink.upload_and_draw(chunk.coord(), RenderPass::Transparent, vertices);
            }
        }
    }

    /// Saves every loaded chunk edited since it was loaded.
    ///
    /// # Returns
    /// The number of chunks saved.
    pub fn save_all(&mut self) -> usize {
        let mut saved = 0;
        for chunk in self.world.chunks() {
            if !chunk.is_modified() {
                continue;
            }
            match self.store.save_chunk(chunk) {
                Ok(()) => saved += 1,
                Err(err) => warn!("Could not save chunk {:?}: {}", chunk.coord(), err),
            }
        }
        saved
    }

    /// Current counter values.
    pub fn counters(&mut self) -> CounterSnapshot {
        self.counters.snapshot(
            self.scheduler.queue_depth(),
            self.scheduler.in_flight(),
            self.world.len(),
            self.world.pooled_chunks(),
        )
    }

    /// Reports the current counters to the observer.
    pub fn report_counters(&mut self) {
        let snapshot = self.counters();
        self.observer.on_counters(&snapshot);
    }

    /// The loaded-chunk set.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The mesh scheduler.
    pub fn scheduler(&self) -> &MeshTaskScheduler {
        &self.scheduler
    }

    /// Chunk the observer was in at the last update.
    pub fn observer_chunk(&self) -> Option<ChunkCoord> {
        self.observer_chunk
    }

    /// Configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for WorldStreamer {
    fn drop(&mut self) {
        let saved = self.save_all();
        if saved > 0 {
            info!("Saved {} edited chunks on shutdown", saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::observability::LogObserver;
    use crate::engine_state::rendering::texture::TextureAtlasMapping;
    use crate::engine_state::voxels::generation::FlatTerrain;
    use crate::engine_state::voxels::persistence::MemoryChunkStore;

    fn streamer(load_radius: i32, unload_radius: i32) -> WorldStreamer {
        let config = EngineConfig {
            load_radius,
            unload_radius,
            worker_threads: Some(1),
            ..EngineConfig::default()
        };
        WorldStreamer::new(
            config,
            Arc::new(TextureAtlasMapping::default_atlas()),
            Box::new(FlatTerrain::default()),
            Box::new(MemoryChunkStore::new(16)),
            Box::new(LogObserver),
        )
    }

    #[test]
    fn test_first_tick_loads_square() {
        let mut streamer = streamer(1, 2);
        let report = streamer.update_chunk(ChunkCoord::new(10, -10));
        assert_eq!(report.loaded, 9);
        assert_eq!(report.unloaded, 0);
        assert_eq!(report.submitted, 8);
        assert!(streamer.world().is_loaded(ChunkCoord::new(11, -9)));
        assert!(!streamer.world().is_loaded(ChunkCoord::new(12, -10)));
    }

    #[test]
    fn test_edit_outside_column_is_ignored() {
        let mut streamer = streamer(0, 1);
        streamer.update_chunk(ChunkCoord::new(0, 0));
        assert_eq!(streamer.set_block(Point3::new(0, 256, 0), BlockType::STONE), None);
        assert_eq!(streamer.set_block(Point3::new(0, -1, 0), BlockType::STONE), None);
        assert_eq!(streamer.set_block(Point3::new(40, 10, 0), BlockType::STONE), None);
    }

    #[test]
    fn test_edit_returns_previous_type() {
        let mut streamer = streamer(0, 1);
        streamer.update_chunk(ChunkCoord::new(0, 0));
        let pos = Point3::new(3, 2, 3);
        assert_eq!(streamer.get_block(pos), BlockType::STONE);
        assert_eq!(streamer.set_block(pos, BlockType::GLASS), Some(BlockType::STONE));
        assert_eq!(streamer.set_block(pos, BlockType::GLASS), None);
        assert_eq!(streamer.get_block(pos), BlockType::GLASS);
        assert!(streamer.world().get_chunk(ChunkCoord::new(0, 0)).unwrap().is_modified());
    }
}
