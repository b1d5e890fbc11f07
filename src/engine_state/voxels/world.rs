//! # World Module
//!
//! This module provides the `World` struct, the single owner of every loaded
//! chunk. It serves as the central point for chunk insertion, removal and
//! voxel access by world position.
//!
//! ## Ownership
//!
//! Chunks are stored by value in a hash map keyed by `ChunkCoord`. Nothing
//! outside the owning thread holds a reference to a chunk: other subsystems
//! keep a `ChunkHandle` and go back through the world by coordinate, and the
//! mesh workers receive `PaddedChunk` copies.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - Released chunks go back to a `ChunkPool` so streaming does not churn
//!   allocations

use std::collections::HashMap;

use cgmath::Point3;

use super::block::{Block, LightLevel};
use super::chunk::pool::ChunkPool;
use super::chunk::{VoxelChunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH};
use super::coords::{split_block_pos, y_in_range, ChunkCoord, ChunkHandle};

/// Read access to voxels by world position.
///
/// Implemented by the live `World` and by `PaddedChunk` snapshots, so the
/// same neighbor queries work on either.
pub trait VoxelLookup {
    /// Block at a world position. Unloaded or out-of-column positions are air.
    fn block_at(&self, pos: Point3<i32>) -> Block;

    /// Light at a world position. Above the column and in unloaded chunks this
    /// is open sky; below the floor it is dark.
    fn light_at(&self, pos: Point3<i32>) -> LightLevel;
}

/// The loaded-chunk set.
pub struct World {
    chunks: HashMap<ChunkCoord, VoxelChunk>,
    pool: ChunkPool,
}

impl World {
    /// Creates a new, empty world.
    ///
    /// # Arguments
    /// * `pool_capacity` - Number of released chunks kept for reuse
    pub fn new(pool_capacity: usize) -> Self {
        World {
            chunks: HashMap::new(),
            pool: ChunkPool::new(pool_capacity),
        }
    }

    /// Takes an all-air chunk for `coord` from the pool. It is not inserted.
    pub fn acquire_chunk(&mut self, coord: ChunkCoord) -> VoxelChunk {
        self.pool.acquire(coord)
    }

    /// Returns a chunk that is no longer needed to the pool.
    pub fn release_chunk(&mut self, chunk: VoxelChunk) {
        self.pool.release(chunk);
    }

    /// Inserts a populated chunk. A chunk already at that coordinate is
    /// released to the pool.
    ///
    /// # Returns
    /// The handle of the inserted chunk.
    pub fn insert_chunk(&mut self, chunk: VoxelChunk) -> ChunkHandle {
        let handle = chunk.handle();
        if let Some(previous) = self.chunks.insert(handle.coord, chunk) {
            self.pool.release(previous);
        }
        handle
    }

    /// Removes a chunk from the loaded set and hands it to the caller.
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> Option<VoxelChunk> {
        self.chunks.remove(&coord)
    }

    /// Retrieves a reference to the chunk at the specified chunk coordinates.
    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&VoxelChunk> {
        self.chunks.get(&coord)
    }

    /// Retrieves a mutable reference to the chunk at the specified coordinates.
    pub fn get_chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut VoxelChunk> {
        self.chunks.get_mut(&coord)
    }

    /// Retrieves the chunk a handle refers to, if that use of it is still loaded.
    pub fn resolve(&self, handle: ChunkHandle) -> Option<&VoxelChunk> {
        self.chunks
            .get(&handle.coord)
            .filter(|chunk| chunk.epoch() == handle.epoch)
    }

    /// Mutable variant of `resolve`.
    pub fn resolve_mut(&mut self, handle: ChunkHandle) -> Option<&mut VoxelChunk> {
        self.chunks
            .get_mut(&handle.coord)
            .filter(|chunk| chunk.epoch() == handle.epoch)
    }

    /// Returns true if a chunk is loaded at `coord`.
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if no chunks are loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks waiting in the pool.
    pub fn pooled_chunks(&self) -> usize {
        self.pool.len()
    }

    /// Coordinates of every loaded chunk, in no particular order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    /// Every loaded chunk, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &VoxelChunk> {
        self.chunks.values()
    }

    /// Marks the chunk at `coord` dirty if it is loaded.
    ///
    /// # Returns
    /// `true` if the chunk was loaded.
    pub fn mark_dirty(&mut self, coord: ChunkCoord) -> bool {
        match self.chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Gets the block at a world position. Air if the chunk is not loaded.
    pub fn get_block(&self, pos: Point3<i32>) -> Block {
        self.block_at(pos)
    }

    /// Sets a block at a world position.
    ///
    /// Marks the owning chunk dirty, plus every loaded chunk whose mesh reads
    /// this voxel as part of its border: the face neighbor for an edge voxel,
    /// and also the diagonal neighbor for a corner voxel. Light is not
    /// updated here; callers relight before the next mesh submission.
    ///
    /// # Returns
    /// The previous block if the world changed, `None` if the chunk is not
    /// loaded, `y` is out of range or the block was already there.
    pub fn set_block(&mut self, pos: Point3<i32>, block: Block) -> Option<Block> {
        if !y_in_range(pos.y) {
            return None;
        }
        let (coord, local) = split_block_pos(pos);
        let old = self.chunks.get_mut(&coord)?.set_block(local, block)?;
        for neighbor in border_neighbors(coord, local) {
            self.mark_dirty(neighbor);
        }
        Some(old)
    }
}

impl VoxelLookup for World {
    fn block_at(&self, pos: Point3<i32>) -> Block {
        if !y_in_range(pos.y) {
            return Block::AIR;
        }
        let (coord, local) = split_block_pos(pos);
        self.chunks
            .get(&coord)
            .map(|chunk| chunk.get_block(local))
            .unwrap_or(Block::AIR)
    }

    fn light_at(&self, pos: Point3<i32>) -> LightLevel {
        if pos.y >= CHUNK_HEIGHT as i32 {
            return LightLevel::OPEN_SKY;
        }
        if pos.y < 0 {
            return LightLevel::DARK;
        }
        let (coord, local) = split_block_pos(pos);
        self.chunks
            .get(&coord)
            .map(|chunk| chunk.get_light(local))
            .unwrap_or(LightLevel::OPEN_SKY)
    }
}

/// Chunks other than `coord` whose one-voxel border contains `local`.
///
/// Edge voxels touch one face neighbor; corner voxels touch two face
/// neighbors and the diagonal between them.
pub fn border_neighbors(coord: ChunkCoord, local: Point3<i32>) -> Vec<ChunkCoord> {
    let dx = if local.x == 0 {
        -1
    } else if local.x == CHUNK_WIDTH as i32 - 1 {
        1
    } else {
        0
    };
    let dz = if local.z == 0 {
        -1
    } else if local.z == CHUNK_DEPTH as i32 - 1 {
        1
    } else {
        0
    };

    let mut neighbors = Vec::with_capacity(3);
    if dx != 0 {
        neighbors.push(coord.offset(dx, 0));
    }
    if dz != 0 {
        neighbors.push(coord.offset(0, dz));
    }
    if dx != 0 && dz != 0 {
        neighbors.push(coord.offset(dx, dz));
    }
    neighbors
}
