//! # Error Types
//!
//! Errors raised by the engine's own algorithms and its I/O collaborators.
//!
//! None of these ever cross the worker/owner boundary as a panic: mesh build
//! errors are turned into `TaskStatus::Failed` records, persistence errors
//! make the streamer fall back to fresh generation, and configuration errors
//! are reported once at startup.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::voxels::coords::ChunkCoord;

/// Errors produced while loading or validating an `EngineConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid JSON for `EngineConfig`.
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    /// The unload radius must be strictly larger than the load radius.
    #[error("unload radius {unload} must be greater than load radius {load}")]
    RadiusOrder {
        /// Configured load radius.
        load: i32,
        /// Configured unload radius.
        unload: i32,
    },

    /// A field that must be positive was zero or negative.
    #[error("{field} must be positive")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
    },

    /// LOD switch distances must be ascending.
    #[error("lod distances must be ascending, got {0:?}")]
    LodDistances([i32; 2]),
}

/// Errors produced by chunk persistence collaborators.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing storage failed.
    #[error("chunk storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored payload does not start with the expected magic bytes.
    #[error("chunk {0:?} has a bad header")]
    BadMagic(ChunkCoord),

    /// The stored payload was written by an unsupported format version.
    #[error("chunk {coord:?} uses unsupported format version {version}")]
    UnsupportedVersion {
        /// Chunk being loaded.
        coord: ChunkCoord,
        /// Version found in the header.
        version: u8,
    },

    /// The compressed payload could not be decompressed.
    #[error("chunk {coord:?} payload is corrupt: {message}")]
    Corrupt {
        /// Chunk being loaded.
        coord: ChunkCoord,
        /// Decompressor message.
        message: String,
    },

    /// The decompressed payload has the wrong number of voxels.
    #[error("chunk {coord:?} payload has {found} voxels, expected {expected}")]
    WrongLength {
        /// Chunk being loaded.
        coord: ChunkCoord,
        /// Voxel count found.
        found: usize,
        /// Voxel count expected.
        expected: usize,
    },

    /// The payload references a block id that does not exist.
    #[error("chunk {coord:?} contains unknown block id {id}")]
    UnknownBlock {
        /// Chunk being loaded.
        coord: ChunkCoord,
        /// Offending raw id.
        id: u8,
    },
}

/// Errors produced by `MeshBuilder` when its input snapshot is corrupt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The snapshot contains a block id with no `BlockType`.
    #[error("unknown block id {id} at local ({x}, {y}, {z})")]
    UnknownBlock {
        /// Offending raw id.
        id: u8,
        /// Local x.
        x: i32,
        /// Local y.
        y: i32,
        /// Local z.
        z: i32,
    },

    /// The snapshot buffers do not have padded-chunk dimensions.
    #[error("snapshot holds {found} voxels, expected {expected}")]
    SnapshotSize {
        /// Voxel count found.
        found: usize,
        /// Voxel count expected.
        expected: usize,
    },
}

/// Errors raised while assembling an engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured chunk store could not be opened.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
