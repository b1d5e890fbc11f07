//! # Chunk Content Generation
//!
//! Content sources fill a freshly acquired chunk before it joins the world.
//! A source must populate the whole grid; the streamer marks the chunk
//! loaded only after `populate` returns.
//!
//! Available sources:
//! - `PerlinTerrain`: Perlin heightmap with layered soil, shallow water and caves
//! - `FlatTerrain`: a flat slab, mostly for tests and benchmarks
//! - `EmptyTerrain`: all air

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use super::block::{block_type::BlockType, Block};
use super::chunk::{VoxelChunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use super::coords::ChunkCoord;

/// Threshold above which 3D Perlin noise carves a cave.
pub const PERLIN_CAVE_THRESHOLD: f64 = 0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// Fills a chunk with its initial content.
pub trait ContentSource {
    /// Populates every voxel of `chunk`, which is all air on entry.
    fn populate(&self, chunk: &mut VoxelChunk, coord: ChunkCoord);
}

/// Terrain shaped by Perlin noise.
///
/// A 2D sample per column picks the surface height; a 3D sample carves caves
/// below the soil. Columns whose surface ends below `sea_level` are topped
/// with water up to it.
pub struct PerlinTerrain {
    perlin: Perlin,
    /// Surface height where the noise is zero.
    pub base_height: i32,
    /// Maximum distance of the surface from `base_height`.
    pub amplitude: f64,
    /// Water fills air up to this height.
    pub sea_level: i32,
    /// Carve caves under the surface.
    pub caves: bool,
}

impl PerlinTerrain {
    /// Creates terrain with default shape parameters.
    ///
    /// # Arguments
    /// * `seed` - Noise seed; equal seeds produce equal terrain
    pub fn new(seed: u32) -> Self {
        PerlinTerrain {
            perlin: Perlin::new(seed),
            base_height: 64,
            amplitude: 24.0,
            sea_level: 58,
            caves: true,
        }
    }

    /// Surface height of the world column at `(x, z)`.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let sample = self.perlin.get([
            x as f64 * PERLIN_SCALE_FACTOR,
            z as f64 * PERLIN_SCALE_FACTOR,
        ]);
        let height = self.base_height as f64 + sample * self.amplitude;
        (height.round() as i32).clamp(1, CHUNK_HEIGHT as i32 - 1)
    }

    fn is_cave(&self, pos: Point3<i32>) -> bool {
        let sample = self.perlin.get([
            pos.x as f64 * PERLIN_SCALE_FACTOR * 2.0,
            pos.y as f64 * PERLIN_SCALE_FACTOR * 2.0,
            pos.z as f64 * PERLIN_SCALE_FACTOR * 2.0,
        ]);
        sample > PERLIN_CAVE_THRESHOLD
    }

    fn block_for(&self, pos: Point3<i32>, surface: i32) -> BlockType {
        let y = pos.y;
        if y == 0 {
            return BlockType::STONE;
        }
        if y > surface {
            return if y <= self.sea_level {
                BlockType::WATER
            } else {
                BlockType::AIR
            };
        }
        if self.caves && y < surface - 4 && self.is_cave(pos) {
            return BlockType::AIR;
        }
        let beach = surface <= self.sea_level + 1;
        if y == surface {
            if beach {
                BlockType::SAND
            } else {
                BlockType::GRASS
            }
        } else if y > surface - 4 {
            if beach {
                BlockType::SAND
            } else {
                BlockType::DIRT
            }
        } else {
            BlockType::STONE
        }
    }
}

impl ContentSource for PerlinTerrain {
    fn populate(&self, chunk: &mut VoxelChunk, coord: ChunkCoord) {
        let top = self.sea_level.max(self.base_height + self.amplitude.ceil() as i32);
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let world = coord.to_world(Point3::new(x, 0, z));
                let surface = self.surface_height(world.x, world.z);
                for y in 0..=top.min(CHUNK_HEIGHT as i32 - 1) {
                    let block_type = self.block_for(Point3::new(world.x, y, world.z), surface);
                    if block_type != BlockType::AIR {
                        chunk.set_block(Point3::new(x, y, z), Block::new(block_type));
                    }
                }
            }
        }
    }
}

/// A flat slab of one block type.
#[derive(Debug, Clone, Copy)]
pub struct FlatTerrain {
    /// Number of filled layers, starting at y = 0.
    pub height: i32,
    /// Block the slab is made of.
    pub block: BlockType,
}

impl Default for FlatTerrain {
    fn default() -> Self {
        FlatTerrain {
            height: 4,
            block: BlockType::STONE,
        }
    }
}

impl ContentSource for FlatTerrain {
    fn populate(&self, chunk: &mut VoxelChunk, _coord: ChunkCoord) {
        if self.height <= 0 || self.block == BlockType::AIR {
            return;
        }
        let top = self.height.min(CHUNK_HEIGHT as i32) - 1;
        chunk.fill(
            Point3::new(0, 0, 0),
            Point3::new(CHUNK_WIDTH as i32 - 1, top, CHUNK_DEPTH as i32 - 1),
            Block::new(self.block),
        );
    }
}

/// Leaves every chunk empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyTerrain;

impl ContentSource for EmptyTerrain {
    fn populate(&self, _chunk: &mut VoxelChunk, _coord: ChunkCoord) {}
}
