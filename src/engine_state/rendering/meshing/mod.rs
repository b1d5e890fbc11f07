//! # Mesh Generation
//!
//! Conversion of voxel data into vertex lists for the two render passes.
//!
//! `MeshBuilder::build` is a pure function of its inputs: a `PaddedChunk`
//! snapshot, a `LodLevel` and the texture mapping the builder was created
//! with. It never touches live chunks, so any number of workers can run it
//! at once on different snapshots.
//!
//! # Algorithm
//! For every non-air voxel (or cell origin, at reduced LOD) and each of its
//! six faces:
//! 1. Look up the voxel across the face, possibly in the snapshot's border.
//! 2. Skip the face unless `should_draw_face` allows it.
//! 3. Compute per-corner ambient occlusion (full LOD only; downward faces
//!    only when enabled in `MeshOptions`).
//! 4. Emit 6 vertices into the opaque or semi-transparent list, according
//!    to the source voxel's class.
//!
//! Sections that are entirely air are skipped without visiting their voxels.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::{should_draw_face, BlockClass};
use crate::engine_state::voxels::chunk::padded::{PaddedChunk, PADDED_VOLUME};
use crate::engine_state::voxels::chunk::{CHUNK_DEPTH, CHUNK_WIDTH, SECTION_COUNT, SECTION_HEIGHT};
use crate::error::MeshError;

use super::texture::{TextureMapping, PLACEHOLDER_LAYER};
use super::vertex::{VoxelVertex, MAX_TEXTURE_LAYER};

pub mod face;
pub mod lod;

use face::{corner_ao, Face, AO_UNOCCLUDED};
use lod::LodLevel;

/// Output of one mesh build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices of opaque faces.
    pub opaque: Vec<VoxelVertex>,
    /// Vertices of semi- and partially-transparent faces.
    pub transparent: Vec<VoxelVertex>,
    /// Level of detail the mesh was built at.
    pub lod: LodLevel,
    /// Set if faces were dropped to respect the vertex cap.
    pub truncated: bool,
    /// Number of faces that fell back to the placeholder texture layer.
    pub missing_textures: u32,
}

impl MeshData {
    /// Number of opaque vertices.
    pub fn opaque_count(&self) -> usize {
        self.opaque.len()
    }

    /// Number of semi-transparent vertices.
    pub fn transparent_count(&self) -> usize {
        self.transparent.len()
    }

    /// Total number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }
}

/// Tunables for `MeshBuilder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshOptions {
    /// Compute ambient occlusion on downward faces as well.
    pub ao_on_bottom_faces: bool,
    /// Cap on the vertex count of each list.
    pub max_vertices_per_chunk: usize,
}

impl Default for MeshOptions {
    fn default() -> Self {
        MeshOptions {
            ao_on_bottom_faces: false,
            max_vertices_per_chunk: 524_288,
        }
    }
}

impl From<&EngineConfig> for MeshOptions {
    fn from(config: &EngineConfig) -> Self {
        MeshOptions {
            ao_on_bottom_faces: config.ao_on_bottom_faces,
            max_vertices_per_chunk: config.max_vertices_per_chunk,
        }
    }
}

/// Builds chunk meshes from padded snapshots.
pub struct MeshBuilder {
    textures: Arc<dyn TextureMapping + Send + Sync>,
    options: MeshOptions,
}

impl MeshBuilder {
    /// Creates a builder.
    ///
    /// # Arguments
    /// * `textures` - Block-to-layer lookup, shared with other builders
    /// * `options` - AO and vertex-cap settings
    pub fn new(textures: Arc<dyn TextureMapping + Send + Sync>, options: MeshOptions) -> Self {
        MeshBuilder { textures, options }
    }

    /// Builds the opaque and semi-transparent vertex lists for a snapshot.
    ///
    /// # Arguments
    /// * `snapshot` - The chunk and its one-voxel border
    /// * `lod` - Level of detail to build at
    ///
    /// # Returns
    /// The mesh, or a `MeshError` if the snapshot is corrupt.
    pub fn build(&self, snapshot: &PaddedChunk, lod: LodLevel) -> Result<MeshData, MeshError> {
        if snapshot.len() != PADDED_VOLUME || snapshot.light_len() != PADDED_VOLUME {
            return Err(MeshError::SnapshotSize {
                found: snapshot.len().min(snapshot.light_len()),
                expected: PADDED_VOLUME,
            });
        }

        let stride = lod.stride() as usize;
        let mut mesh = MeshData {
            lod,
            ..MeshData::default()
        };

        for section in 0..SECTION_COUNT {
            if snapshot.is_section_empty(section) {
                continue;
            }
            let base = section * SECTION_HEIGHT;
            for y in (base..base + SECTION_HEIGHT).step_by(stride) {
                for z in (0..CHUNK_DEPTH).step_by(stride) {
                    for x in (0..CHUNK_WIDTH).step_by(stride) {
                        self.mesh_cell(snapshot, [x as i32, y as i32, z as i32], lod, &mut mesh)?;
                    }
                }
            }
        }

        Ok(mesh)
    }

    fn mesh_cell(
        &self,
        snapshot: &PaddedChunk,
        origin: [i32; 3],
        lod: LodLevel,
        mesh: &mut MeshData,
    ) -> Result<(), MeshError> {
        let [x, y, z] = origin;
        let block = snapshot.block(x, y, z);
        let block_type = block.get_type().ok_or(MeshError::UnknownBlock {
            id: block.block_type,
            x,
            y,
            z,
        })?;
        let class = block_type.class();
        if class == BlockClass::Air {
            return Ok(());
        }

        let stride = lod.stride();
        // The origin of the neighboring cell, which alone decides whether that
        // cell emits anything. Past the padding it is the border voxel at -1.
        let step = |pos: i32, n: i32| (pos + n * stride).max(-1);

        for side in BlockSide::all() {
            let normal = side.normal();
            let across = [step(x, normal.x), step(y, normal.y), step(z, normal.z)];
            let neighbor = snapshot.block(across[0], across[1], across[2]);
            if !should_draw_face(class, neighbor.class()) {
                continue;
            }

            let target_len = if class.is_translucent() {
                mesh.transparent.len()
            } else {
                mesh.opaque.len()
            };
            if target_len + 6 > self.options.max_vertices_per_chunk {
                mesh.truncated = true;
                continue;
            }

            let face = Face {
                origin,
                size: stride,
                side,
                layer: self.layer_for(block_type, side, &mut mesh.missing_textures),
                animated: block_type.is_animated(),
                ao: self.face_ao(snapshot, origin, side, lod),
                light: snapshot.light(across[0], across[1], across[2]),
            };

            if class.is_translucent() {
                face.emit(&mut mesh.transparent);
            } else {
                face.emit(&mut mesh.opaque);
            }
        }

        Ok(())
    }

    fn layer_for(&self, block_type: BlockType, side: BlockSide, missing: &mut u32) -> u32 {
        match self.textures.texture_layer_for(block_type, side) {
            Some(layer) if layer <= MAX_TEXTURE_LAYER => layer,
            _ => {
                *missing += 1;
                PLACEHOLDER_LAYER
            }
        }
    }

    fn face_ao(
        &self,
        snapshot: &PaddedChunk,
        origin: [i32; 3],
        side: BlockSide,
        lod: LodLevel,
    ) -> [u8; 4] {
        if lod != LodLevel::Full {
            return [AO_UNOCCLUDED; 4];
        }
        if side == BlockSide::BOTTOM && !self.options.ao_on_bottom_faces {
            return [AO_UNOCCLUDED; 4];
        }
        corner_ao(snapshot, origin, side)
    }
}
