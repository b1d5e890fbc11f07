//! # Observability
//!
//! Advisory reporting: build failures, truncated meshes and periodic
//! counters. Nothing here influences control flow.

use std::collections::VecDeque;

use log::{error, info, warn};
use web_time::{Duration, Instant};

use super::voxels::coords::ChunkCoord;

/// Sink for engine events that operators care about.
pub trait EngineObserver {
    /// A mesh build failed. The chunk stays dirty and will be retried.
    fn on_build_failed(&self, coord: ChunkCoord, message: &str);

    /// A mesh hit the vertex cap and faces were dropped.
    fn on_mesh_truncated(&self, _coord: ChunkCoord, _vertex_count: usize) {}

    /// Periodic counter snapshot.
    fn on_counters(&self, _counters: &CounterSnapshot) {}
}

/// Observer that writes everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl EngineObserver for LogObserver {
    fn on_build_failed(&self, coord: ChunkCoord, message: &str) {
        error!("Mesh build for chunk {:?} failed: {}", coord, message);
    }

    fn on_mesh_truncated(&self, coord: ChunkCoord, vertex_count: usize) {
        warn!(
            "Mesh for chunk {:?} truncated at {} vertices",
            coord, vertex_count
        );
    }

    fn on_counters(&self, counters: &CounterSnapshot) {
        info!(
            "chunks={} pooled={} queue={} in_flight={} rebuilds/s={:.1} \
             verts/chunk={:.0} (last {}) failures={} truncations={}",
            counters.loaded_chunks,
            counters.pooled_chunks,
            counters.queue_depth,
            counters.in_flight,
            counters.rebuilds_per_sec,
            counters.average_vertices_per_chunk,
            counters.last_vertices_per_chunk,
            counters.build_failures,
            counters.truncated_meshes,
        );
    }
}

/// Point-in-time view of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CounterSnapshot {
    /// Tasks waiting for a worker.
    pub queue_depth: usize,
    /// Tasks submitted and not yet drained.
    pub in_flight: usize,
    /// Meshes attached per second over the sliding window.
    pub rebuilds_per_sec: f32,
    /// Mean vertex count of all attached meshes.
    pub average_vertices_per_chunk: f32,
    /// Vertex count of the last attached mesh.
    pub last_vertices_per_chunk: usize,
    /// Total failed builds.
    pub build_failures: u64,
    /// Total meshes that hit the vertex cap.
    pub truncated_meshes: u64,
    /// Chunks currently loaded.
    pub loaded_chunks: usize,
    /// Chunks waiting in the pool.
    pub pooled_chunks: usize,
}

/// Running counters kept by the streamer.
#[derive(Debug)]
pub struct EngineCounters {
    window: Duration,
    rebuild_times: VecDeque<Instant>,
    total_rebuilds: u64,
    total_vertices: u64,
    last_vertices: usize,
    build_failures: u64,
    truncated_meshes: u64,
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl EngineCounters {
    /// Creates counters that measure rebuild rate over `window`.
    pub fn new(window: Duration) -> Self {
        EngineCounters {
            window,
            rebuild_times: VecDeque::new(),
            total_rebuilds: 0,
            total_vertices: 0,
            last_vertices: 0,
            build_failures: 0,
            truncated_meshes: 0,
        }
    }

    /// Records one attached mesh.
    pub fn record_rebuild(&mut self, vertex_count: usize) {
        self.record_rebuild_at(Instant::now(), vertex_count);
    }

    fn record_rebuild_at(&mut self, now: Instant, vertex_count: usize) {
        self.rebuild_times.push_back(now);
        self.prune(now);
        self.total_rebuilds += 1;
        self.total_vertices += vertex_count as u64;
        self.last_vertices = vertex_count;
    }

    /// Records failed builds.
    pub fn record_failures(&mut self, count: usize) {
        self.build_failures += count as u64;
    }

    /// Records truncated meshes.
    pub fn record_truncations(&mut self, count: usize) {
        self.truncated_meshes += count as u64;
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.rebuild_times.front() {
            if now.duration_since(oldest) > self.window {
                self.rebuild_times.pop_front();
            } else {
                break;
            }
        }
    }

    /// Total meshes attached.
    pub fn total_rebuilds(&self) -> u64 {
        self.total_rebuilds
    }

    /// Builds a snapshot. Queue and world sizes come from their owners.
    pub fn snapshot(
        &mut self,
        queue_depth: usize,
        in_flight: usize,
        loaded_chunks: usize,
        pooled_chunks: usize,
    ) -> CounterSnapshot {
        self.prune(Instant::now());
        let average = if self.total_rebuilds == 0 {
            0.0
        } else {
            self.total_vertices as f32 / self.total_rebuilds as f32
        };
        CounterSnapshot {
            queue_depth,
            in_flight,
            rebuilds_per_sec: self.rebuild_times.len() as f32 / self.window.as_secs_f32(),
            average_vertices_per_chunk: average,
            last_vertices_per_chunk: self.last_vertices,
            build_failures: self.build_failures,
            truncated_meshes: self.truncated_meshes,
            loaded_chunks,
            pooled_chunks,
        }
    }
}
