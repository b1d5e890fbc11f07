//! # Chunk Persistence
//!
//! Stores for chunks that were edited after loading. The streamer saves a
//! modified chunk when it unloads and asks the store first when a coordinate
//! loads again. A store failure is never fatal: the streamer logs it and
//! generates the chunk fresh.
//!
//! ## Format
//!
//! ```text
//! b"VXCH" | version: u8 | lz4 block (u32 LE uncompressed size + data)
//! ```
//!
//! The decompressed payload is one byte per voxel in chunk storage order.
//! Light is not stored; it is recomputed after load.

use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use log::warn;
use lru::LruCache;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use super::block::block_type::BlockType;
use super::chunk::{VoxelChunk, CHUNK_VOLUME};
use super::coords::ChunkCoord;
use crate::error::PersistenceError;

/// Magic bytes at the start of every stored chunk.
pub const CHUNK_MAGIC: [u8; 4] = *b"VXCH";
/// Current payload format version.
pub const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = CHUNK_MAGIC.len() + 1;

/// Backing storage for edited chunks.
pub trait ChunkStore {
    /// Saves the chunk's voxels, replacing any earlier copy.
    fn save_chunk(&mut self, chunk: &VoxelChunk) -> Result<(), PersistenceError>;

    /// Loads the voxels stored for `coord` into `chunk`.
    ///
    /// # Returns
    /// `Ok(false)` if nothing is stored for `coord`. On error `chunk` is unchanged.
    fn load_chunk(
        &mut self,
        coord: ChunkCoord,
        chunk: &mut VoxelChunk,
    ) -> Result<bool, PersistenceError>;
}

/// Serializes a chunk's voxels into the stored format.
pub fn encode_chunk(chunk: &VoxelChunk) -> Vec<u8> {
    let raw: &[u8] = bytemuck::cast_slice(chunk.blocks());
    let compressed = compress_prepend_size(raw);
    let mut bytes = Vec::with_capacity(HEADER_LEN + compressed.len());
    bytes.extend_from_slice(&CHUNK_MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&compressed);
    bytes
}

/// Validates a stored payload and loads it into `chunk`.
///
/// Every check runs before `chunk` is touched.
pub fn decode_chunk(
    coord: ChunkCoord,
    bytes: &[u8],
    chunk: &mut VoxelChunk,
) -> Result<(), PersistenceError> {
    if bytes.len() < HEADER_LEN || bytes[..CHUNK_MAGIC.len()] != CHUNK_MAGIC {
        return Err(PersistenceError::BadMagic(coord));
    }
    let version = bytes[CHUNK_MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion { coord, version });
    }

    let raw = decompress_size_prepended(&bytes[HEADER_LEN..]).map_err(|err| {
        PersistenceError::Corrupt {
            coord,
            message: err.to_string(),
        }
    })?;
    if raw.len() != CHUNK_VOLUME {
        return Err(PersistenceError::WrongLength {
            coord,
            found: raw.len(),
            expected: CHUNK_VOLUME,
        });
    }
    if let Some(&id) = raw
        .iter()
        .find(|&&id| BlockType::get_block_type_from_int(id).is_none())
    {
        return Err(PersistenceError::UnknownBlock { coord, id });
    }

    chunk.load_raw_blocks(&raw);
    Ok(())
}

/// Keeps encoded chunks in memory, evicting the least recently used.
pub struct MemoryChunkStore {
    chunks: LruCache<ChunkCoord, Vec<u8>>,
    dropped_edits: u64,
}

impl MemoryChunkStore {
    /// Creates a store holding at most `capacity` chunks (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        MemoryChunkStore {
            chunks: LruCache::new(capacity),
            dropped_edits: 0,
        }
    }

    /// Number of chunks stored.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns true if a chunk is stored for `coord`.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains(&coord)
    }

    /// Number of saved chunks evicted to make room. Their edits are lost.
    pub fn dropped_edits(&self) -> u64 {
        self.dropped_edits
    }

    /// Stores raw bytes for `coord` as if they had been saved.
    pub fn insert_raw(&mut self, coord: ChunkCoord, bytes: Vec<u8>) {
        self.chunks.put(coord, bytes);
    }
}

impl ChunkStore for MemoryChunkStore {
    fn save_chunk(&mut self, chunk: &VoxelChunk) -> Result<(), PersistenceError> {
        if let Some((evicted, _)) = self.chunks.push(chunk.coord(), encode_chunk(chunk)) {
            if evicted != chunk.coord() {
                self.dropped_edits += 1;
                warn!("Memory store full, dropped edits of chunk {:?}", evicted);
            }
        }
        Ok(())
    }

    fn load_chunk(
        &mut self,
        coord: ChunkCoord,
        chunk: &mut VoxelChunk,
    ) -> Result<bool, PersistenceError> {
        match self.chunks.get(&coord) {
            Some(bytes) => decode_chunk(coord, bytes, chunk).map(|()| true),
            None => Ok(false),
        }
    }
}

/// One file per chunk in a directory.
pub struct DirectoryChunkStore {
    root: PathBuf,
}

impl DirectoryChunkStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(DirectoryChunkStore { root })
    }

    /// Path of the file holding `coord`.
    pub fn chunk_path(&self, coord: ChunkCoord) -> PathBuf {
        self.root.join(format!("c.{}.{}.vxc", coord.x, coord.z))
    }
}

impl ChunkStore for DirectoryChunkStore {
    fn save_chunk(&mut self, chunk: &VoxelChunk) -> Result<(), PersistenceError> {
        fs::write(self.chunk_path(chunk.coord()), encode_chunk(chunk))?;
        Ok(())
    }

    fn load_chunk(
        &mut self,
        coord: ChunkCoord,
        chunk: &mut VoxelChunk,
    ) -> Result<bool, PersistenceError> {
        let bytes = match fs::read(self.chunk_path(coord)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        decode_chunk(coord, &bytes, chunk)?;
        Ok(true)
    }
}
