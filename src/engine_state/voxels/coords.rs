//! # Chunk Coordinates
//!
//! Chunks are addressed by a 2-D integer pair in the horizontal plane; the
//! vertical axis is a fixed-height column. Block positions are world-space
//! `Point3<i32>` values, and local positions are offsets inside one chunk.

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::chunk::{CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};

/// Position of a chunk in chunk units (not blocks).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk X.
    pub x: i32,
    /// Chunk Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkCoord { x, z }
    }

    /// Returns the chunk containing the world block position.
    pub fn from_block(pos: Point3<i32>) -> Self {
        ChunkCoord {
            x: pos.x.div_euclid(CHUNK_WIDTH as i32),
            z: pos.z.div_euclid(CHUNK_DEPTH as i32),
        }
    }

    /// Returns the chunk containing a continuous world position, such as the observer's.
    pub fn from_world(pos: Vector3<f32>) -> Self {
        ChunkCoord {
            x: (pos.x / CHUNK_WIDTH as f32).floor() as i32,
            z: (pos.z / CHUNK_DEPTH as f32).floor() as i32,
        }
    }

    /// Chebyshev (max-axis) distance between two chunks.
    pub fn chebyshev_distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Returns the chunk offset by `(dx, dz)`.
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        ChunkCoord {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// The 4 face-adjacent chunks: -X, +X, -Z, +Z.
    pub fn face_neighbors(self) -> [ChunkCoord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// All 8 surrounding chunks, face-adjacent and diagonal.
    pub fn ring_neighbors(self) -> [ChunkCoord; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }

    /// Every coordinate within Chebyshev `radius` of `self`, row by row.
    pub fn square_around(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        (-radius..=radius)
            .flat_map(move |dz| (-radius..=radius).map(move |dx| self.offset(dx, dz)))
    }

    /// World position of the block at local `(0, 0, 0)` of this chunk.
    pub fn origin(self) -> Point3<i32> {
        Point3::new(self.x * CHUNK_WIDTH as i32, 0, self.z * CHUNK_DEPTH as i32)
    }

    /// Converts a local position in this chunk to a world block position.
    pub fn to_world(self, local: Point3<i32>) -> Point3<i32> {
        let origin = self.origin();
        Point3::new(origin.x + local.x, local.y, origin.z + local.z)
    }
}

/// Splits a world block position into its chunk and the local position inside it.
///
/// The local y is the world y unchanged; it may be out of `0..CHUNK_HEIGHT`.
pub fn split_block_pos(pos: Point3<i32>) -> (ChunkCoord, Point3<i32>) {
    let coord = ChunkCoord::from_block(pos);
    let local = Point3::new(
        pos.x.rem_euclid(CHUNK_WIDTH as i32),
        pos.y,
        pos.z.rem_euclid(CHUNK_DEPTH as i32),
    );
    (coord, local)
}

/// Returns true if the world y lies inside the fixed-height column.
pub fn y_in_range(y: i32) -> bool {
    (0..CHUNK_HEIGHT as i32).contains(&y)
}

/// Identity of one use of a chunk: its coordinate plus the epoch assigned
/// when the chunk was created or recycled.
///
/// Other subsystems hold handles instead of references. A handle whose epoch
/// no longer matches the loaded chunk refers to content that has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHandle {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// Epoch of this use of the chunk.
    pub epoch: u64,
}
