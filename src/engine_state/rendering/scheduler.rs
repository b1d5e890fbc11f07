//! # Mesh Task Scheduler
//!
//! Runs `MeshBuilder` off the owning thread, at most one task per chunk.
//!
//! ## Protocol
//!
//! 1. `submit` copies the chunk and its border into a `PaddedChunk` and
//!    publishes a `MeshBuildTask`. The chunk is now in flight; submitting it
//!    again is a no-op until its result has been drained.
//! 2. A worker flips the chunk's status `Pending -> Building`, builds, and
//!    records `Complete` or `Failed`.
//! 3. `drain_completed`, called once per frame on the owning thread, attaches
//!    finished meshes to their chunks. A result whose chunk was unloaded or
//!    recycled is discarded. A failed chunk stays dirty and is retried by a
//!    later submission.
//!
//! The status map is the only mutable state shared with the workers.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use super::meshing::lod::LodLevel;
use super::meshing::MeshBuilder;
use super::tasks::chunk_mesh_generation_task::{MeshBuildOutput, MeshBuildTask};
use crate::engine_state::observability::EngineObserver;
use crate::engine_state::task_management::task::TaskId;
use crate::engine_state::task_management::TaskManager;
use crate::engine_state::voxels::chunk::padded::PaddedChunk;
use crate::engine_state::voxels::coords::{ChunkCoord, ChunkHandle};
use crate::engine_state::voxels::world::World;

/// Build state of a chunk's most recent task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// A worker is building the mesh.
    Building,
    /// The build finished.
    Complete,
    /// The build failed with a message.
    Failed(String),
}

/// Status map shared between the scheduler and its tasks.
pub type TaskStatusMap = Arc<Mutex<HashMap<ChunkCoord, TaskStatus>>>;

/// What `submit` did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A task was published.
    Submitted,
    /// The chunk already has a task whose result has not been drained.
    AlreadyInFlight,
    /// The chunk's mesh is up to date.
    Clean,
    /// No chunk is loaded at that coordinate.
    NotLoaded,
}

/// Summary of one `drain_completed` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Meshes attached to their chunks.
    pub attached: usize,
    /// Builds that failed.
    pub failed: usize,
    /// Results dropped because their chunk is gone or was recycled.
    pub discarded: usize,
    /// Attached meshes that hit the vertex cap.
    pub truncated: usize,
    /// Vertex count of each attached mesh, in drain order.
    pub vertex_counts: Vec<usize>,
}

/// Worker pool front end for mesh builds.
pub struct MeshTaskScheduler {
    task_manager: TaskManager<MeshBuildOutput>,
    builder: Arc<MeshBuilder>,
    statuses: TaskStatusMap,
    active: HashMap<ChunkCoord, TaskId>,
    tasks: HashMap<TaskId, ChunkHandle>,
}

impl MeshTaskScheduler {
    /// Creates a scheduler and starts its workers.
    ///
    /// # Arguments
    /// * `builder` - Mesh builder shared by every task
    /// * `num_workers` - Worker thread count
    /// * `queue_capacity` - Capacity of the shared task queue
    pub fn new(builder: MeshBuilder, num_workers: usize, queue_capacity: usize) -> Self {
        MeshTaskScheduler {
            task_manager: TaskManager::new(num_workers, queue_capacity),
            builder: Arc::new(builder),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            active: HashMap::new(),
            tasks: HashMap::new(),
        }
    }

    /// Requests a rebuild of the chunk at `coord`.
    ///
    /// # Arguments
    /// * `world` - Loaded chunks, read to take the snapshot
    /// * `coord` - Chunk to rebuild
    /// * `lod` - Level of detail to build at
    pub fn submit(&mut self, world: &World, coord: ChunkCoord, lod: LodLevel) -> SubmitOutcome {
        let Some(chunk) = world.get_chunk(coord) else {
            return SubmitOutcome::NotLoaded;
        };
        if !chunk.is_dirty() {
            return SubmitOutcome::Clean;
        }
        if self.active.contains_key(&coord) {
            return SubmitOutcome::AlreadyInFlight;
        }
        let Some(snapshot) = PaddedChunk::capture(world, coord) else {
            return SubmitOutcome::NotLoaded;
        };
        let handle = snapshot.handle();

        self.statuses.lock().insert(coord, TaskStatus::Pending);
        let task = MeshBuildTask::new(
            snapshot,
            lod,
            Arc::clone(&self.builder),
            Arc::clone(&self.statuses),
        );
        let id = self.task_manager.publish_task(Box::new(task));
        self.active.insert(coord, id);
        self.tasks.insert(id, handle);
        SubmitOutcome::Submitted
    }

    /// Attaches every finished mesh to its chunk. Never blocks.
    ///
    /// Also moves backlogged tasks onto the worker queue.
    pub fn drain_completed(
        &mut self,
        world: &mut World,
        observer: &dyn EngineObserver,
    ) -> DrainReport {
        self.task_manager.process_queued_tasks();

        let mut report = DrainReport::default();
        for completion in self.task_manager.drain_completed() {
            let Some(handle) = self.tasks.remove(&completion.id) else {
                continue;
            };
            if self.active.get(&handle.coord) == Some(&completion.id) {
                self.active.remove(&handle.coord);
            }

            let output = match completion.result {
                Ok(output) => output,
                Err(panic) => {
                    let message = format!("worker panicked: {panic}");
                    if let Some(status) = self.statuses.lock().get_mut(&handle.coord) {
                        *status = TaskStatus::Failed(message.clone());
                    }
                    report.failed += 1;
                    observer.on_build_failed(handle.coord, &message);
                    continue;
                }
            };

            let mesh = match output.result {
                Ok(mesh) => mesh,
                Err(err) => {
                    report.failed += 1;
                    observer.on_build_failed(handle.coord, &err.to_string());
                    continue;
                }
            };

            let Some(chunk) = world.resolve_mut(handle) else {
                report.discarded += 1;
                continue;
            };
            if !chunk.attach_mesh(&mesh, output.revision) {
                report.discarded += 1;
                continue;
            }

            report.attached += 1;
            report.vertex_counts.push(mesh.vertex_count());
            if mesh.truncated {
                report.truncated += 1;
                observer.on_mesh_truncated(handle.coord, mesh.vertex_count());
            }
            if mesh.missing_textures > 0 {
                warn!(
                    "Chunk {:?}: {} faces used the placeholder texture",
                    handle.coord, mesh.missing_textures
                );
            }
        }
        report
    }

    /// Status of the chunk's most recent task.
    pub fn status(&self, coord: ChunkCoord) -> Option<TaskStatus> {
        self.statuses.lock().get(&coord).cloned()
    }

    /// Returns true if the chunk has a task whose result has not been drained.
    pub fn is_in_flight(&self, coord: ChunkCoord) -> bool {
        self.active.contains_key(&coord)
    }

    /// Drops the status record of an unloaded chunk.
    pub fn forget(&mut self, coord: ChunkCoord) {
        self.statuses.lock().remove(&coord);
    }

    /// Tasks waiting for a worker.
    pub fn queue_depth(&self) -> usize {
        self.task_manager.queue_depth()
    }

    /// Tasks whose results have not been drained.
    pub fn in_flight(&self) -> usize {
        self.task_manager.in_flight()
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.task_manager.num_workers()
    }
}
