//! Vertex data structures for voxel rendering.
//!
//! This module defines the packed vertex format produced by `MeshBuilder` and
//! uploaded verbatim by the render collaborator.

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::LightLevel;

/// Largest texture layer index a vertex can carry.
pub const MAX_TEXTURE_LAYER: u32 = 0xFF;

const X_BITS: u32 = 5;
const Y_BITS: u32 = 9;
const Z_BITS: u32 = 5;
const UV_BITS: u32 = 2;
const LAYER_BITS: u32 = 8;

const X_SHIFT: u32 = 0;
const Y_SHIFT: u32 = X_SHIFT + X_BITS;
const Z_SHIFT: u32 = Y_SHIFT + Y_BITS;
const UV_SHIFT: u32 = Z_SHIFT + Z_BITS;
const LAYER_SHIFT: u32 = UV_SHIFT + UV_BITS;
const ANIMATED_SHIFT: u32 = LAYER_SHIFT + LAYER_BITS;
const AO_SHIFT: u32 = ANIMATED_SHIFT + 1;

const SKY_SHIFT: u32 = 0;
const BLOCK_SHIFT: u32 = 4;
const FACE_SHIFT: u32 = 8;

const fn mask(bits: u32) -> u32 {
    (1 << bits) - 1
}

/// A vertex in the voxel rendering pipeline.
///
/// # Memory Layout
/// Two little 32-bit words, 8 bytes total.
///
/// `data`:
/// - bits 0-4: x (0-16, chunk-local corner position)
/// - bits 5-13: y (0-256)
/// - bits 14-18: z (0-16)
/// - bits 19-20: UV corner selector
/// - bits 21-28: texture layer
/// - bit 29: animated flag
/// - bits 30-31: ambient occlusion level (0 dark - 3 unoccluded)
///
/// `lighting`:
/// - bits 0-3: skylight
/// - bits 4-7: block light
/// - bits 8-10: face index (`BlockSide` discriminant)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VoxelVertex {
    data: u32,
    lighting: u32,
}

impl VoxelVertex {
    /// Packs a vertex.
    ///
    /// # Arguments
    /// * `pos` - Chunk-local corner position, each component within the chunk's extent
    /// * `uv_corner` - Which corner of the texture this vertex maps to (0-3)
    /// * `layer` - Texture-atlas layer, at most `MAX_TEXTURE_LAYER`
    /// * `animated` - Whether the layer scrolls over time
    /// * `ao` - Ambient occlusion level (0-3)
    /// * `light` - Light of the voxel the face looks into
    /// * `side` - Face the vertex belongs to
    pub fn new(
        pos: [u32; 3],
        uv_corner: u8,
        layer: u32,
        animated: bool,
        ao: u8,
        light: LightLevel,
        side: BlockSide,
    ) -> Self {
        debug_assert!(pos[0] <= 16 && pos[1] <= 256 && pos[2] <= 16);
        debug_assert!(layer <= MAX_TEXTURE_LAYER);
        debug_assert!(ao <= 3 && uv_corner <= 3);

        let data = ((pos[0] & mask(X_BITS)) << X_SHIFT)
            | ((pos[1] & mask(Y_BITS)) << Y_SHIFT)
            | ((pos[2] & mask(Z_BITS)) << Z_SHIFT)
            | ((uv_corner as u32 & mask(UV_BITS)) << UV_SHIFT)
            | ((layer & mask(LAYER_BITS)) << LAYER_SHIFT)
            | ((animated as u32) << ANIMATED_SHIFT)
            | ((ao as u32 & 0b11) << AO_SHIFT);
        let lighting = ((light.sky() as u32) << SKY_SHIFT)
            | ((light.block() as u32) << BLOCK_SHIFT)
            | ((side as u32) << FACE_SHIFT);

        VoxelVertex { data, lighting }
    }

    /// Local position of the vertex.
    pub fn position(&self) -> [u32; 3] {
        [
            (self.data >> X_SHIFT) & mask(X_BITS),
            (self.data >> Y_SHIFT) & mask(Y_BITS),
            (self.data >> Z_SHIFT) & mask(Z_BITS),
        ]
    }

    /// UV corner selector.
    pub fn uv_corner(&self) -> u8 {
        ((self.data >> UV_SHIFT) & mask(UV_BITS)) as u8
    }

    /// Texture layer.
    pub fn layer(&self) -> u32 {
        (self.data >> LAYER_SHIFT) & mask(LAYER_BITS)
    }

    /// Animated flag.
    pub fn is_animated(&self) -> bool {
        (self.data >> ANIMATED_SHIFT) & 1 == 1
    }

    /// Ambient occlusion level, 0-3.
    pub fn ao(&self) -> u8 {
        (self.data >> AO_SHIFT) as u8 & 0b11
    }

    /// Skylight baked into the vertex.
    pub fn sky_light(&self) -> u8 {
        ((self.lighting >> SKY_SHIFT) & 0xF) as u8
    }

    /// Block light baked into the vertex.
    pub fn block_light(&self) -> u8 {
        ((self.lighting >> BLOCK_SHIFT) & 0xF) as u8
    }

    /// Face index of the vertex.
    pub fn face(&self) -> u8 {
        ((self.lighting >> FACE_SHIFT) & 0b111) as u8
    }

    /// The raw packed words, as uploaded.
    pub fn raw(&self) -> [u32; 2] {
        [self.data, self.lighting]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_two_words() {
        assert_eq!(std::mem::size_of::<VoxelVertex>(), 8);
    }

    #[test]
    fn test_extreme_fields_do_not_bleed() {
        let vertex = VoxelVertex::new(
            [16, 256, 16],
            3,
            MAX_TEXTURE_LAYER,
            true,
            3,
            LightLevel::new(15, 15),
            BlockSide::RIGHT,
        );
        assert_eq!(vertex.position(), [16, 256, 16]);
        assert_eq!(vertex.uv_corner(), 3);
        assert_eq!(vertex.layer(), MAX_TEXTURE_LAYER);
        assert!(vertex.is_animated());
        assert_eq!(vertex.ao(), 3);
        assert_eq!(vertex.sky_light(), 15);
        assert_eq!(vertex.block_light(), 15);
        assert_eq!(vertex.face(), BlockSide::RIGHT as u8);

        let zero = VoxelVertex::new([0, 0, 0], 0, 0, false, 0, LightLevel::DARK, BlockSide::FRONT);
        assert_eq!(zero.raw(), [0, 0]);
    }
}
