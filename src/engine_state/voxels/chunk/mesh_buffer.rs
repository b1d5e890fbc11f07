//! Cached vertex storage for one render pass of a chunk.

use crate::engine_state::rendering::vertex::VoxelVertex;

/// A growable vertex list that never gives back capacity below its peak.
///
/// Repeated small edits rebuild the same chunk many times with similar vertex
/// counts; keeping the allocation avoids a realloc on every attach.
#[derive(Debug, Default)]
pub struct MeshBuffer {
    vertices: Vec<VoxelVertex>,
    peak: usize,
}

impl MeshBuffer {
    /// Replaces the contents with `vertices`.
    pub fn replace(&mut self, vertices: &[VoxelVertex]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.peak = self.peak.max(vertices.len());
    }

    /// Empties the buffer and forgets its peak. Capacity is retained.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.peak = 0;
    }

    /// Live vertices.
    pub fn vertices(&self) -> &[VoxelVertex] {
        &self.vertices
    }

    /// Live vertex count.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the buffer holds no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Allocated capacity in vertices.
    pub fn capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// Largest vertex count held since the last `clear`.
    pub fn peak(&self) -> usize {
        self.peak
    }
}
