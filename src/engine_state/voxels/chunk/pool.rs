//! Recycling of chunk allocations.

use log::debug;

use super::VoxelChunk;
use crate::engine_state::voxels::coords::ChunkCoord;

/// Free list of released chunks plus the epoch counter for chunk identities.
///
/// Every chunk handed out by `acquire` carries a fresh epoch, whether it was
/// newly allocated or recycled, so stale handles never match.
#[derive(Debug)]
pub struct ChunkPool {
    free: Vec<VoxelChunk>,
    capacity: usize,
    next_epoch: u64,
}

impl ChunkPool {
    /// Creates an empty pool that retains at most `capacity` released chunks.
    pub fn new(capacity: usize) -> Self {
        ChunkPool {
            free: Vec::with_capacity(capacity),
            capacity,
            next_epoch: 1,
        }
    }

    /// Returns an all-air chunk for `coord`, reusing a released one if possible.
    pub fn acquire(&mut self, coord: ChunkCoord) -> VoxelChunk {
        let epoch = self.next_epoch;
        self.next_epoch += 1;

        match self.free.pop() {
            Some(mut chunk) => {
                chunk.reset(coord, epoch);
                chunk
            }
            None => VoxelChunk::new(coord, epoch),
        }
    }

    /// Takes back a chunk that left the world. Dropped if the pool is full.
    pub fn release(&mut self, chunk: VoxelChunk) {
        if self.free.len() < self.capacity {
            self.free.push(chunk);
        } else {
            debug!("Chunk pool full, dropping chunk {:?}", chunk.coord());
        }
    }

    /// Number of chunks waiting for reuse.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Returns true if no released chunks are waiting.
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};
    use cgmath::Point3;

    #[test]
    fn test_recycled_chunk_is_reset_with_new_epoch() {
        let mut pool = ChunkPool::new(2);
        let mut chunk = pool.acquire(ChunkCoord::new(0, 0));
        let first_epoch = chunk.epoch();
        chunk.set_block(Point3::new(1, 1, 1), Block::new(BlockType::STONE));
        pool.release(chunk);
        assert_eq!(pool.len(), 1);

        let chunk = pool.acquire(ChunkCoord::new(4, 4));
        assert!(pool.is_empty());
        assert_ne!(chunk.epoch(), first_epoch);
        assert_eq!(chunk.coord(), ChunkCoord::new(4, 4));
        assert_eq!(chunk.get_block(Point3::new(1, 1, 1)), Block::AIR);
    }

    #[test]
    fn test_release_beyond_capacity_drops() {
        let mut pool = ChunkPool::new(1);
        let a = pool.acquire(ChunkCoord::new(0, 0));
        let b = pool.acquire(ChunkCoord::new(1, 0));
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.len(), 1);
    }
}
