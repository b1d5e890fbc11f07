//! Level-of-detail selection for distant chunks.

/// Meshing resolution of a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LodLevel {
    /// Every voxel, with ambient occlusion.
    #[default]
    Full,
    /// One sample per 2x2x2 cell.
    Half,
    /// One sample per 4x4x4 cell.
    Quarter,
}

impl LodLevel {
    /// Side length of the cell sampled per emitted voxel.
    pub const fn stride(self) -> i32 {
        match self {
            LodLevel::Full => 1,
            LodLevel::Half => 2,
            LodLevel::Quarter => 4,
        }
    }

    /// Picks the level for a chunk at Chebyshev `distance` from the observer.
    ///
    /// # Arguments
    /// * `distance` - Distance in chunks
    /// * `lod_distances` - `[full_until, half_until]`, both inclusive
    pub fn for_distance(distance: i32, lod_distances: [i32; 2]) -> Self {
        if distance <= lod_distances[0] {
            LodLevel::Full
        } else if distance <= lod_distances[1] {
            LodLevel::Half
        } else {
            LodLevel::Quarter
        }
    }
}
