//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `MeshBuildTask`, which runs `MeshBuilder` against
//! a `PaddedChunk` snapshot on a worker thread. This keeps the owning thread
//! responsive while meshing is performed.

use std::sync::Arc;

use crate::engine_state::rendering::meshing::lod::LodLevel;
use crate::engine_state::rendering::meshing::{MeshBuilder, MeshData};
use crate::engine_state::rendering::scheduler::{TaskStatus, TaskStatusMap};
use crate::engine_state::task_management::task::Task;
use crate::engine_state::voxels::chunk::padded::PaddedChunk;
use crate::engine_state::voxels::coords::ChunkHandle;
use crate::error::MeshError;

/// A task that builds the mesh of one chunk snapshot.
///
/// This task is responsible for:
/// 1. Flagging its chunk as `Building` in the shared status map
/// 2. Running the mesh builder on its private snapshot
/// 3. Recording `Complete` or `Failed` and returning the result
pub struct MeshBuildTask {
    /// Copy of the chunk and its border, taken at submission
    snapshot: PaddedChunk,
    /// Level of detail to build at
    lod: LodLevel,
    /// Shared, immutable mesh builder
    builder: Arc<MeshBuilder>,
    /// Per-chunk status map shared with the scheduler
    statuses: TaskStatusMap,
}

impl MeshBuildTask {
    /// Creates a new mesh build task.
    ///
    /// # Arguments
    /// * `snapshot` - The chunk data to mesh
    /// * `lod` - Level of detail to build at
    /// * `builder` - Mesh builder shared between workers
    /// * `statuses` - Status map updated as the task progresses
    pub fn new(
        snapshot: PaddedChunk,
        lod: LodLevel,
        builder: Arc<MeshBuilder>,
        statuses: TaskStatusMap,
    ) -> Self {
        MeshBuildTask {
            snapshot,
            lod,
            builder,
            statuses,
        }
    }

    fn set_status(&self, status: TaskStatus) {
        if let Some(entry) = self.statuses.lock().get_mut(&self.snapshot.coord()) {
            *entry = status;
        }
    }
}

/// The result of a mesh build task.
#[derive(Debug)]
pub struct MeshBuildOutput {
    /// The chunk use the snapshot was taken from
    pub handle: ChunkHandle,
    /// Chunk revision at snapshot time
    pub revision: u64,
    /// The mesh, or why the snapshot could not be meshed
    pub result: Result<MeshData, MeshError>,
}

impl Task for MeshBuildTask {
    type Output = MeshBuildOutput;

    fn process(self: Box<Self>) -> MeshBuildOutput {
        self.set_status(TaskStatus::Building);

        let result = self.builder.build(&self.snapshot, self.lod);
        match &result {
            Ok(_) => self.set_status(TaskStatus::Complete),
            Err(err) => self.set_status(TaskStatus::Failed(err.to_string())),
        }

        MeshBuildOutput {
            handle: self.snapshot.handle(),
            revision: self.snapshot.revision(),
            result,
        }
    }
}
