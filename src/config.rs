//! # Engine Configuration
//!
//! Tunables for streaming, meshing and the worker pool. Every field has a
//! default so a config file only needs to name what it changes:
//!
//! ```json
//! { "load_radius": 6, "unload_radius": 8, "save_directory": "saves/world" }
//! ```

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for an `EngineState` and the subsystems it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chebyshev radius (in chunks) inside which chunks are loaded.
    pub load_radius: i32,
    /// Chebyshev radius (in chunks) beyond which chunks are unloaded.
    /// Must exceed `load_radius`; the gap is the hysteresis band.
    pub unload_radius: i32,
    /// Maximum mesh rebuilds submitted per streaming tick.
    pub max_rebuilds_per_tick: usize,
    /// Worker thread count. `None` uses available parallelism minus one.
    pub worker_threads: Option<usize>,
    /// Capacity of the bounded task queue shared by the workers.
    pub task_queue_capacity: usize,
    /// Number of released chunks kept for reuse.
    pub chunk_pool_capacity: usize,
    /// `[full_until, half_until]`: chunks farther than `half_until` mesh at quarter detail.
    pub lod_distances: [i32; 2],
    /// Compute ambient occlusion on downward faces too.
    pub ao_on_bottom_faces: bool,
    /// Hard cap on vertices per vertex list of a single chunk.
    pub max_vertices_per_chunk: usize,
    /// Seed used by the procedural content source.
    pub world_seed: u32,
    /// Directory for persisted chunks. `None` keeps edits in memory only.
    pub save_directory: Option<PathBuf>,
    /// Number of chunks the in-memory store retains.
    pub memory_store_capacity: usize,
    /// Seconds between counter reports.
    pub counters_interval_secs: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            load_radius: 4,
            unload_radius: 6,
            max_rebuilds_per_tick: 8,
            worker_threads: None,
            task_queue_capacity: 256,
            chunk_pool_capacity: 64,
            lod_distances: [6, 12],
            ao_on_bottom_faces: false,
            max_vertices_per_chunk: 524_288,
            world_seed: 0,
            save_directory: None,
            memory_store_capacity: 1024,
            counters_interval_secs: 1.0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks the invariants the streamer and scheduler rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_radius < 0 {
            return Err(ConfigError::NotPositive { field: "load_radius" });
        }
        if self.unload_radius <= self.load_radius {
            return Err(ConfigError::RadiusOrder {
                load: self.load_radius,
                unload: self.unload_radius,
            });
        }
        if self.max_rebuilds_per_tick == 0 {
            return Err(ConfigError::NotPositive {
                field: "max_rebuilds_per_tick",
            });
        }
        if self.task_queue_capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "task_queue_capacity",
            });
        }
        if self.max_vertices_per_chunk == 0 {
            return Err(ConfigError::NotPositive {
                field: "max_vertices_per_chunk",
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::NotPositive {
                field: "worker_threads",
            });
        }
        if !(self.counters_interval_secs.is_finite() && self.counters_interval_secs > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "counters_interval_secs",
            });
        }
        if self.lod_distances[0] > self.lod_distances[1] {
            return Err(ConfigError::LodDistances(self.lod_distances));
        }
        Ok(())
    }

    /// Worker count to spawn: the configured value, or hardware concurrency
    /// minus one core reserved for the owning thread.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "load_radius": 2, "unload_radius": 3 }"#)
            .unwrap();
        assert_eq!(config.load_radius, 2);
        assert_eq!(config.unload_radius, 3);
        assert_eq!(config.max_rebuilds_per_tick, 8);
        assert!(config.save_directory.is_none());
    }

    #[test]
    fn test_rejects_unload_not_beyond_load() {
        let err = EngineConfig::from_json_str(r#"{ "load_radius": 4, "unload_radius": 4 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::RadiusOrder { load: 4, unload: 4 }));
    }

    #[test]
    fn test_rejects_descending_lod_distances() {
        let err = EngineConfig::from_json_str(r#"{ "lod_distances": [8, 2] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::LodDistances([8, 2])));
    }

    #[test]
    fn test_resolved_workers_never_zero() {
        let config = EngineConfig::default();
        assert!(config.resolved_worker_threads() >= 1);
    }
}
