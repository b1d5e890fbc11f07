//! # Voxel World
//!
//! This module holds the voxel data side of the engine: what a voxel is, how
//! chunks store them, how the loaded-chunk set is owned, lit, populated,
//! persisted and streamed around an observer.
//!
//! ## Architecture
//!
//! * **Block**: block types, their visibility class and the packed light level
//! * **Chunk**: fixed-size 16x256x16 voxel grids with cached mesh buffers
//! * **World**: the single owner of every loaded chunk
//! * **Lighting**: breadth-first skylight and block-light propagation
//! * **Generation / Persistence**: where chunk content comes from
//! * **Streaming**: load/unload around the observer, edits, mesh submission
//!
//! ## Data Flow
//!
//! 1. The streamer decides a coordinate must be resident and populates a pooled chunk
//! 2. Light is recomputed for the new chunk and its ring
//! 3. Dirty chunks are copied into padded snapshots and meshed on workers
//! 4. Finished meshes are attached on the owning thread and drawn
//!
//! ## Thread Safety
//!
//! Nothing here is shared with worker threads. Workers only ever receive
//! `PaddedChunk` copies taken at submission time.

pub mod block;
pub mod chunk;
pub mod coords;
pub mod generation;
pub mod lighting;
pub mod persistence;
pub mod streaming;
pub mod world;
