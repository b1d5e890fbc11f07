//! # Padded Chunk Snapshot
//!
//! A `PaddedChunk` is a detached copy of one chunk's blocks and light plus a
//! one-voxel border taken from its 8 horizontal neighbors. It is the only
//! input `MeshBuilder` reads, so a mesh build never touches live chunk data.
//!
//! The padded grid spans local x and z in `-1..=16` and y in `0..256`.
//! Positions above or below the column are answered analytically: above the
//! top is open sky, below the floor is unlit air.

use cgmath::Point3;

use super::{VoxelChunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH, SECTION_COUNT};
use crate::engine_state::voxels::block::{Block, LightLevel};
use crate::engine_state::voxels::coords::{ChunkCoord, ChunkHandle};
use crate::engine_state::voxels::world::{VoxelLookup, World};

/// Width of the padded grid (chunk plus one voxel on each side).
pub const PADDED_WIDTH: usize = CHUNK_WIDTH + 2;
/// Depth of the padded grid.
pub const PADDED_DEPTH: usize = CHUNK_DEPTH + 2;
/// Number of voxels in the padded grid.
pub const PADDED_VOLUME: usize = PADDED_WIDTH * PADDED_DEPTH * CHUNK_HEIGHT;

/// Read-only copy of a chunk and its border, taken at submission time.
#[derive(Debug, Clone)]
pub struct PaddedChunk {
    handle: ChunkHandle,
    revision: u64,
    blocks: Vec<Block>,
    light: Vec<LightLevel>,
    section_empty: [bool; SECTION_COUNT],
}

impl PaddedChunk {
    /// Copies the loaded chunk at `coord` and its border out of `world`.
    ///
    /// # Returns
    /// `None` if the chunk is not loaded.
    pub fn capture(world: &World, coord: ChunkCoord) -> Option<Self> {
        let center = world.get_chunk(coord)?;
        Some(Self::capture_with(center, |neighbor| world.get_chunk(neighbor)))
    }

    /// Copies a chunk with no loaded neighbors. Every border voxel is air.
    pub fn isolated(center: &VoxelChunk) -> Self {
        Self::capture_with(center, |_| None)
    }

    /// Copies `center` and takes border columns from whatever `neighbor`
    /// returns. Columns of missing neighbors are air lit by open sky.
    pub fn capture_with<'a, F>(center: &'a VoxelChunk, neighbor: F) -> Self
    where
        F: Fn(ChunkCoord) -> Option<&'a VoxelChunk>,
    {
        let coord = center.coord();
        let mut blocks = vec![Block::AIR; PADDED_VOLUME];
        let mut light = vec![LightLevel::OPEN_SKY; PADDED_VOLUME];

        for pz in 0..PADDED_DEPTH as i32 {
            for px in 0..PADDED_WIDTH as i32 {
                let (lx, lz) = (px - 1, pz - 1);
                let dx = chunk_step(lx, CHUNK_WIDTH as i32);
                let dz = chunk_step(lz, CHUNK_DEPTH as i32);
                let source = if dx == 0 && dz == 0 {
                    Some(center)
                } else {
                    neighbor(coord.offset(dx, dz))
                };
                let Some(source) = source else {
                    continue;
                };

                let sx = lx.rem_euclid(CHUNK_WIDTH as i32);
                let sz = lz.rem_euclid(CHUNK_DEPTH as i32);
                for y in 0..CHUNK_HEIGHT as i32 {
                    let src = VoxelChunk::index(Point3::new(sx, y, sz));
                    let dst = Self::padded_index(lx, y, lz);
                    blocks[dst] = source.blocks()[src];
                    light[dst] = source.light()[src];
                }
            }
        }

        let mut section_empty = [true; SECTION_COUNT];
        for (section, empty) in section_empty.iter_mut().enumerate() {
            *empty = center.is_section_empty(section);
        }

        PaddedChunk {
            handle: center.handle(),
            revision: center.revision(),
            blocks,
            light,
            section_empty,
        }
    }

    fn padded_index(x: i32, y: i32, z: i32) -> usize {
        (y as usize * PADDED_DEPTH + (z + 1) as usize) * PADDED_WIDTH + (x + 1) as usize
    }

    fn in_padded_bounds(x: i32, z: i32) -> bool {
        (-1..=CHUNK_WIDTH as i32).contains(&x) && (-1..=CHUNK_DEPTH as i32).contains(&z)
    }

    /// Handle of the chunk the snapshot was taken from.
    pub fn handle(&self) -> ChunkHandle {
        self.handle
    }

    /// Chunk coordinate of the snapshot.
    pub fn coord(&self) -> ChunkCoord {
        self.handle.coord
    }

    /// Chunk revision at capture time.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of stored voxels.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the snapshot holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of stored light values.
    pub fn light_len(&self) -> usize {
        self.light.len()
    }

    /// Returns true if `section` of the center chunk is all air.
    pub fn is_section_empty(&self, section: usize) -> bool {
        self.section_empty[section]
    }

    /// Block at a local position, x and z in `-1..=16`.
    pub fn block(&self, x: i32, y: i32, z: i32) -> Block {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) || !Self::in_padded_bounds(x, z) {
            return Block::AIR;
        }
        self.blocks[Self::padded_index(x, y, z)]
    }

    /// Light at a local position, x and z in `-1..=16`.
    pub fn light(&self, x: i32, y: i32, z: i32) -> LightLevel {
        if y >= CHUNK_HEIGHT as i32 {
            return LightLevel::OPEN_SKY;
        }
        if y < 0 {
            return LightLevel::DARK;
        }
        if !Self::in_padded_bounds(x, z) {
            return LightLevel::OPEN_SKY;
        }
        self.light[Self::padded_index(x, y, z)]
    }

    /// Overwrites one stored block. Used to build corrupt inputs in tests and
    /// by tools that patch snapshots.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) {
        if (0..CHUNK_HEIGHT as i32).contains(&y) && Self::in_padded_bounds(x, z) {
            self.blocks[Self::padded_index(x, y, z)] = block;
            if (0..CHUNK_WIDTH as i32).contains(&x) && (0..CHUNK_DEPTH as i32).contains(&z) {
                self.section_empty[y as usize / super::SECTION_HEIGHT] = false;
            }
        }
    }

    fn to_local(&self, pos: Point3<i32>) -> Point3<i32> {
        let origin = self.handle.coord.origin();
        Point3::new(pos.x - origin.x, pos.y, pos.z - origin.z)
    }
}

impl VoxelLookup for PaddedChunk {
    fn block_at(&self, pos: Point3<i32>) -> Block {
        let local = self.to_local(pos);
        self.block(local.x, local.y, local.z)
    }

    fn light_at(&self, pos: Point3<i32>) -> LightLevel {
        let local = self.to_local(pos);
        self.light(local.x, local.y, local.z)
    }
}

fn chunk_step(local: i32, size: i32) -> i32 {
    if local < 0 {
        -1
    } else if local >= size {
        1
    } else {
        0
    }
}
