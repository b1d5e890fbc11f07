//! # Behavior Notifications
//!
//! Listeners react to voxels appearing and disappearing: particle effects,
//! ambient sound triggers and similar side systems. The streamer fans every
//! change out to all registered listeners on the owning thread.
//!
//! A listener must not block. A listener that panics is caught and logged;
//! the remaining listeners still run and streaming continues.

use std::panic::{self, AssertUnwindSafe};

use cgmath::Point3;
use log::warn;

use super::task_management::panic_message;
use super::voxels::block::block_type::BlockType;
use super::voxels::chunk::{
    VoxelChunk, CHUNK_DEPTH, CHUNK_PLANE_SIZE, CHUNK_WIDTH, SECTION_COUNT, SECTION_HEIGHT,
};

/// Why voxels appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddCause {
    /// A voxel was placed by an edit.
    Placed,
    /// The chunk holding it was loaded.
    Loaded,
}

/// Why voxels disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// The voxel was broken or replaced by an edit; it no longer exists.
    Destroyed,
    /// The chunk holding it was unloaded; the voxel still exists in the world.
    Unloaded,
}

/// Capability set of a behavior listener.
///
/// Positions are world block positions. Air never produces notifications.
pub trait BehaviorListener {
    /// A non-air voxel appeared.
    fn on_voxel_added(&mut self, pos: Point3<i32>, block_type: BlockType, cause: AddCause);

    /// A non-air voxel went away.
    fn on_voxel_removed(&mut self, pos: Point3<i32>, block_type: BlockType, cause: RemovalCause);

    /// An edit replaced one non-air voxel with another.
    ///
    /// Defaults to a removal followed by an addition.
    fn on_voxel_updated(&mut self, pos: Point3<i32>, old: BlockType, new: BlockType) {
        self.on_voxel_removed(pos, old, RemovalCause::Destroyed);
        self.on_voxel_added(pos, new, AddCause::Placed);
    }
}

/// Registered listeners and the fan-out loop.
#[derive(Default)]
pub struct BehaviorRegistry {
    listeners: Vec<Box<dyn BehaviorListener>>,
}

impl BehaviorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Listeners are notified in registration order.
    pub fn register(&mut self, listener: Box<dyn BehaviorListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Reports one edit.
    ///
    /// # Arguments
    /// * `pos` - World position of the edited voxel
    /// * `old` - Type before the edit
    /// * `new` - Type after the edit
    pub fn notify_edit(&mut self, pos: Point3<i32>, old: BlockType, new: BlockType) {
        if old == new {
            return;
        }
        self.for_each_listener(|listener| match (old, new) {
            (BlockType::AIR, new) => listener.on_voxel_added(pos, new, AddCause::Placed),
            (old, BlockType::AIR) => listener.on_voxel_removed(pos, old, RemovalCause::Destroyed),
            (old, new) => listener.on_voxel_updated(pos, old, new),
        });
    }

    /// Reports every non-air voxel of a freshly loaded chunk.
    pub fn notify_chunk_loaded(&mut self, chunk: &VoxelChunk) {
        if self.listeners.is_empty() {
            return;
        }
        let voxels = non_air_voxels(chunk);
        self.for_each_listener(|listener| {
            for &(pos, block_type) in &voxels {
                listener.on_voxel_added(pos, block_type, AddCause::Loaded);
            }
        });
    }

    /// Reports every non-air voxel of a chunk about to be unloaded.
    pub fn notify_chunk_unloaded(&mut self, chunk: &VoxelChunk) {
        if self.listeners.is_empty() {
            return;
        }
        let voxels = non_air_voxels(chunk);
        self.for_each_listener(|listener| {
            for &(pos, block_type) in &voxels {
                listener.on_voxel_removed(pos, block_type, RemovalCause::Unloaded);
            }
        });
    }

    fn for_each_listener<F>(&mut self, mut notify: F)
    where
        F: FnMut(&mut dyn BehaviorListener),
    {
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| notify(listener.as_mut())));
            if let Err(payload) = outcome {
                warn!("Behavior listener {} panicked: {}", index, panic_message(payload));
            }
        }
    }
}

/// Collects the world position and type of every non-air voxel, skipping empty sections.
fn non_air_voxels(chunk: &VoxelChunk) -> Vec<(Point3<i32>, BlockType)> {
    let coord = chunk.coord();
    let section_len = CHUNK_PLANE_SIZE * SECTION_HEIGHT;
    let mut voxels = Vec::new();
    for section in 0..SECTION_COUNT {
        if chunk.is_section_empty(section) {
            continue;
        }
        let start = section * section_len;
        for (offset, block) in chunk.blocks()[start..start + section_len].iter().enumerate() {
            let Some(block_type) = block.get_type() else {
                continue;
            };
            if block_type == BlockType::AIR {
                continue;
            }
            let index = start + offset;
            let local = Point3::new(
                (index % CHUNK_WIDTH) as i32,
                (index / CHUNK_PLANE_SIZE) as i32,
                ((index / CHUNK_WIDTH) % CHUNK_DEPTH) as i32,
            );
            voxels.push((coord.to_world(local), block_type));
        }
    }
    voxels
}
