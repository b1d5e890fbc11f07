//! Background tasks for the rendering system.
//!
//! These tasks run on the worker pool so the owning thread stays responsive.
//!
//! # Available Tasks
//! - `MeshBuildTask`: Builds the vertex lists of one chunk snapshot

pub mod chunk_mesh_generation_task;
