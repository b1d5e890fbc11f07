//! # Chunk Module
//!
//! This module provides the `VoxelChunk` struct: one 16x256x16 column of voxel
//! data together with its light field, its cached mesh buffers and the
//! bookkeeping the streamer and scheduler need (dirty flag, revision, epoch).
//!
//! ## Storage Layout
//!
//! Blocks and light are dense arrays indexed y-major, then z, then x:
//!
//! ```text
//! index = (y * CHUNK_DEPTH + z) * CHUNK_WIDTH + x
//! ```
//!
//! so one horizontal layer is contiguous. The column is also split into
//! `SECTION_COUNT` sections of `SECTION_HEIGHT` layers; the chunk keeps a
//! non-air count per section so meshing can skip sections that are all air.
//!
//! ## Ownership
//!
//! A `VoxelChunk` is a plain data container. It never spawns work and is only
//! ever mutated by the thread that owns the `World`. Workers receive
//! `PaddedChunk` copies, never references.

use cgmath::Point3;

use super::block::block_type::BlockType;
use super::block::{Block, LightLevel};
use super::coords::{ChunkCoord, ChunkHandle};
use crate::engine_state::rendering::meshing::lod::LodLevel;
use crate::engine_state::rendering::meshing::MeshData;
use crate::engine_state::rendering::vertex::VoxelVertex;

pub mod mesh_buffer;
pub mod padded;
pub mod pool;

use mesh_buffer::MeshBuffer;

/// Width of a chunk in blocks (X axis).
pub const CHUNK_WIDTH: usize = 16;
/// Height of a chunk in blocks (Y axis).
pub const CHUNK_HEIGHT: usize = 256;
/// Depth of a chunk in blocks (Z axis).
pub const CHUNK_DEPTH: usize = 16;
/// Number of blocks in one horizontal layer.
pub const CHUNK_PLANE_SIZE: usize = CHUNK_WIDTH * CHUNK_DEPTH;
/// Total number of blocks in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_PLANE_SIZE * CHUNK_HEIGHT;
/// Height of one section in blocks.
pub const SECTION_HEIGHT: usize = 16;
/// Number of sections in a chunk column.
pub const SECTION_COUNT: usize = CHUNK_HEIGHT / SECTION_HEIGHT;

/// Per-chunk mesh statistics. Cleared when the chunk is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Number of meshes attached since the chunk was (re)created.
    pub rebuilds: u64,
    /// Total vertex count of the last attached mesh.
    pub last_vertex_count: usize,
    /// Largest total vertex count ever attached.
    pub peak_vertex_count: usize,
    /// Number of attached meshes that hit the vertex cap.
    pub truncated_builds: u64,
}

/// One loaded chunk column.
#[derive(Debug)]
pub struct VoxelChunk {
    coord: ChunkCoord,
    epoch: u64,
    blocks: Vec<Block>,
    light: Vec<LightLevel>,
    section_non_air: [u16; SECTION_COUNT],
    dirty: bool,
    revision: u64,
    modified: bool,
    mesh_lod: Option<LodLevel>,
    mesh_revision: Option<u64>,
    opaque: MeshBuffer,
    transparent: MeshBuffer,
    stats: ChunkStats,
}

impl VoxelChunk {
    /// Creates an all-air, dirty chunk.
    ///
    /// # Arguments
    /// * `coord` - Chunk coordinate
    /// * `epoch` - Identity of this use of the chunk, see `ChunkHandle`
    pub fn new(coord: ChunkCoord, epoch: u64) -> Self {
        VoxelChunk {
            coord,
            epoch,
            blocks: vec![Block::AIR; CHUNK_VOLUME],
            light: vec![LightLevel::DARK; CHUNK_VOLUME],
            section_non_air: [0; SECTION_COUNT],
            dirty: true,
            revision: 0,
            modified: false,
            mesh_lod: None,
            mesh_revision: None,
            opaque: MeshBuffer::default(),
            transparent: MeshBuffer::default(),
            stats: ChunkStats::default(),
        }
    }

    /// Clears contents, mesh buffers and statistics and gives the chunk a new
    /// identity. Allocations are kept for reuse.
    pub fn reset(&mut self, coord: ChunkCoord, epoch: u64) {
        self.coord = coord;
        self.epoch = epoch;
        self.blocks.fill(Block::AIR);
        self.light.fill(LightLevel::DARK);
        self.section_non_air = [0; SECTION_COUNT];
        self.dirty = true;
        self.revision = 0;
        self.modified = false;
        self.mesh_lod = None;
        self.mesh_revision = None;
        self.opaque.clear();
        self.transparent.clear();
        self.stats = ChunkStats::default();
    }

    /// Chunk coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Epoch assigned at creation or the last reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Handle identifying this use of the chunk.
    pub fn handle(&self) -> ChunkHandle {
        ChunkHandle {
            coord: self.coord,
            epoch: self.epoch,
        }
    }

    /// Returns true if `local` lies inside the chunk.
    pub fn in_bounds(local: Point3<i32>) -> bool {
        (0..CHUNK_WIDTH as i32).contains(&local.x)
            && (0..CHUNK_HEIGHT as i32).contains(&local.y)
            && (0..CHUNK_DEPTH as i32).contains(&local.z)
    }

    /// Flat index of an in-bounds local position.
    pub fn index(local: Point3<i32>) -> usize {
        (local.y as usize * CHUNK_DEPTH + local.z as usize) * CHUNK_WIDTH + local.x as usize
    }

    /// Gets the block at a local position. Positions outside the chunk are air.
    pub fn get_block(&self, local: Point3<i32>) -> Block {
        if !Self::in_bounds(local) {
            debug_assert!(false, "get_block out of bounds: {:?}", local);
            return Block::AIR;
        }
        self.blocks[Self::index(local)]
    }

    /// Gets the block type at a local position, `None` for an unknown id.
    pub fn get_block_type(&self, local: Point3<i32>) -> Option<BlockType> {
        self.get_block(local).get_type()
    }

    /// Sets the block at a local position and marks the chunk dirty and modified.
    ///
    /// Writes outside the chunk are ignored.
    ///
    /// # Returns
    /// The previous block if it differed from `block`, `None` otherwise.
    pub fn set_block(&mut self, local: Point3<i32>, block: Block) -> Option<Block> {
        if !Self::in_bounds(local) {
            debug_assert!(false, "set_block out of bounds: {:?}", local);
            return None;
        }
        let index = Self::index(local);
        let old = self.blocks[index];
        if old == block {
            return None;
        }
        self.blocks[index] = block;

        let section = local.y as usize / SECTION_HEIGHT;
        match (old.is_air(), block.is_air()) {
            (true, false) => self.section_non_air[section] += 1,
            (false, true) => self.section_non_air[section] -= 1,
            _ => {}
        }

        self.modified = true;
        self.mark_dirty();
        Some(old)
    }

    /// Fills every voxel from `min` to `max` (inclusive) with one block.
    pub fn fill(&mut self, min: Point3<i32>, max: Point3<i32>, block: Block) {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    self.set_block(Point3::new(x, y, z), block);
                }
            }
        }
    }

    /// All blocks, in storage order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Replaces every block from a raw id buffer and recounts sections.
    ///
    /// The caller guarantees `raw.len() == CHUNK_VOLUME`.
    pub fn load_raw_blocks(&mut self, raw: &[u8]) {
        debug_assert_eq!(raw.len(), CHUNK_VOLUME);
        let blocks: &[Block] = bytemuck::cast_slice(raw);
        self.blocks.copy_from_slice(blocks);
        self.recount_sections();
        self.mark_dirty();
    }

    fn recount_sections(&mut self) {
        self.section_non_air = [0; SECTION_COUNT];
        for (section, layers) in self
            .blocks
            .chunks_exact(CHUNK_PLANE_SIZE * SECTION_HEIGHT)
            .enumerate()
        {
            self.section_non_air[section] = layers.iter().filter(|b| !b.is_air()).count() as u16;
        }
    }

    /// Returns true if every voxel of `section` is air.
    pub fn is_section_empty(&self, section: usize) -> bool {
        self.section_non_air[section] == 0
    }

    /// Gets both light channels at a local position. Outside the chunk is dark.
    pub fn get_light(&self, local: Point3<i32>) -> LightLevel {
        if !Self::in_bounds(local) {
            debug_assert!(false, "get_light out of bounds: {:?}", local);
            return LightLevel::DARK;
        }
        self.light[Self::index(local)]
    }

    /// The light field, in storage order.
    pub fn light(&self) -> &[LightLevel] {
        &self.light
    }

    /// Mutable light field. Only `LightPropagator` writes it.
    pub(crate) fn light_mut(&mut self) -> &mut [LightLevel] {
        &mut self.light
    }

    /// Returns true if the cached mesh no longer matches the voxel data.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flags the cached mesh as stale and bumps the revision.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Clears the dirty flag without attaching a mesh.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Revision counter, bumped by every `mark_dirty`.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true if the chunk was edited since it was loaded.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clears the modified flag, after populating or saving.
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// Level of detail of the attached mesh, `None` before the first attach.
    pub fn mesh_lod(&self) -> Option<LodLevel> {
        self.mesh_lod
    }

    /// Replaces the cached mesh buffers. Called only on the owning thread.
    ///
    /// A mesh built from an older revision than the one already attached is
    /// ignored. The dirty flag is cleared only if nothing changed since the
    /// snapshot the mesh was built from.
    ///
    /// # Arguments
    /// * `mesh` - Result of `MeshBuilder::build`
    /// * `revision` - Chunk revision at snapshot time
    ///
    /// # Returns
    /// `true` if the mesh was attached.
    pub fn attach_mesh(&mut self, mesh: &MeshData, revision: u64) -> bool {
        if matches!(self.mesh_revision, Some(attached) if attached > revision) {
            return false;
        }
        self.opaque.replace(&mesh.opaque);
        self.transparent.replace(&mesh.transparent);
        self.mesh_lod = Some(mesh.lod);
        self.mesh_revision = Some(revision);

        let total = mesh.vertex_count();
        self.stats.rebuilds += 1;
        self.stats.last_vertex_count = total;
        self.stats.peak_vertex_count = self.stats.peak_vertex_count.max(total);
        if mesh.truncated {
            self.stats.truncated_builds += 1;
        }

        if self.revision == revision {
            self.dirty = false;
        }
        true
    }

    /// Vertices of the opaque pass.
    pub fn opaque_vertices(&self) -> &[VoxelVertex] {
        self.opaque.vertices()
    }

    /// Vertices of the semi-transparent pass.
    pub fn transparent_vertices(&self) -> &[VoxelVertex] {
        self.transparent.vertices()
    }

    /// Opaque mesh buffer.
    pub fn opaque_buffer(&self) -> &MeshBuffer {
        &self.opaque
    }

    /// Semi-transparent mesh buffer.
    pub fn transparent_buffer(&self) -> &MeshBuffer {
        &self.transparent
    }

    /// Mesh statistics.
    pub fn stats(&self) -> &ChunkStats {
        &self.stats
    }
}
