//! Rendering side of the engine.
//!
//! This module turns chunk voxel data into vertex lists and hands them to a
//! rendering collaborator. It owns no GPU state: meshes are built on worker
//! threads by the `scheduler`, attached to chunks on the owning thread, and
//! then passed to a `RenderSink` once per frame.

pub mod meshing;
pub mod scheduler;
pub mod tasks;
pub mod texture;
pub mod vertex;

use super::voxels::coords::ChunkCoord;
use vertex::VoxelVertex;

/// Which vertex list of a chunk is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Opaque-solid geometry, drawn first.
    Opaque,
    /// Semi-transparent and partially transparent geometry, drawn after every opaque pass.
    Transparent,
}

/// Rendering collaborator that receives finished vertex lists.
///
/// Called from the owning thread only, after `drain_completed`, once per
/// visible chunk and pass. Empty lists are never passed.
pub trait RenderSink {
    /// Uploads and draws one vertex list.
    ///
    /// # Arguments
    /// * `coord` - Chunk the vertices belong to; positions are local to it
    /// * `pass` - Pass the vertices belong to
    /// * `vertices` - Packed vertices, two triangles per face
    fn upload_and_draw(&mut self, coord: ChunkCoord, pass: RenderPass, vertices: &[VoxelVertex]);
}
