//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! It includes block type definitions, block face handling, the render class
//! that drives face visibility, and the packed per-voxel light value.

use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage and serialization of block data.
pub type BlockTypeSize = u8;

/// Maximum value of either light channel.
pub const MAX_LIGHT: u8 = 15;

/// Render and light-transport class of a block type.
///
/// The class is a pure function of `BlockType` (see `BlockType::class`) and is
/// never stored on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockClass {
    /// Empty space.
    Air,
    /// Fully solid. Blocks light and occludes AO.
    Opaque,
    /// See-through solid such as glass.
    SemiTransparent,
    /// Liquids and foliage. The solid face behind one is hidden.
    PartiallyTransparent,
}

impl BlockClass {
    /// Whether light can pass through a voxel of this class.
    pub const fn is_light_transparent(self) -> bool {
        !matches!(self, BlockClass::Opaque)
    }

    /// Whether the voxel counts as an occluder for ambient occlusion.
    pub const fn occludes(self) -> bool {
        matches!(self, BlockClass::Opaque)
    }

    /// Whether faces of this class go to the semi-transparent vertex list.
    pub const fn is_translucent(self) -> bool {
        matches!(
            self,
            BlockClass::SemiTransparent | BlockClass::PartiallyTransparent
        )
    }
}

/// Decides whether the face of a `source` voxel that touches `neighbor` is drawn.
///
/// A face is drawn when the two classes differ, except that an opaque voxel
/// never draws the face it shares with a partially-transparent voxel. Air
/// contributes no geometry.
///
/// # Arguments
/// * `source` - Class of the voxel that would own the face
/// * `neighbor` - Class of the voxel on the other side of the face
///
/// # Returns
/// `true` if the face should be emitted.
pub const fn should_draw_face(source: BlockClass, neighbor: BlockClass) -> bool {
    match (source, neighbor) {
        (BlockClass::Air, _) => false,
        (BlockClass::Opaque, BlockClass::PartiallyTransparent) => false,
        (BlockClass::Opaque, BlockClass::Opaque)
        | (BlockClass::SemiTransparent, BlockClass::SemiTransparent)
        | (BlockClass::PartiallyTransparent, BlockClass::PartiallyTransparent) => false,
        _ => true,
    }
}

/// Represents a single voxel block in the world.
///
/// This is a lightweight structure that stores only the essential block data.
/// The actual block properties are looked up from the block type.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute keeps the layout byte-sized so whole chunks can
/// be cast to `&[u8]` for persistence.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq, Eq, Default)]
pub struct Block {
    /// The type of this block, encoded as a `BlockTypeSize` for compact storage.
    pub block_type: BlockTypeSize,
}

impl Block {
    /// The air block. Also the value returned for any out-of-range lookup.
    pub const AIR: Block = Block {
        block_type: BlockType::AIR as BlockTypeSize,
    };

    /// Creates a new block of the specified type.
    ///
    /// # Arguments
    /// * `block_type` - The type of block to create
    ///
    /// # Returns
    /// A new `Block` instance with the specified type.
    pub const fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type as BlockTypeSize,
        }
    }

    /// Decodes the stored type, `None` for an id with no `BlockType`.
    pub fn get_type(self) -> Option<BlockType> {
        BlockType::get_block_type_from_int(self.block_type)
    }

    /// Class of this block. Unknown ids are treated as opaque.
    pub fn class(self) -> BlockClass {
        self.get_type()
            .map(BlockType::class)
            .unwrap_or(BlockClass::Opaque)
    }

    /// Light emitted by this block, 0 for unknown ids.
    pub fn light_emission(self) -> u8 {
        self.get_type().map(BlockType::light_emission).unwrap_or(0)
    }

    /// Returns true for the air block.
    pub const fn is_air(self) -> bool {
        self.block_type == BlockType::AIR as BlockTypeSize
    }
}

impl From<BlockType> for Block {
    fn from(block_type: BlockType) -> Self {
        Block::new(block_type)
    }
}

/// Both light channels of one voxel packed into a byte.
///
/// The high nibble is skylight and the low nibble block light, each 0-15.
#[repr(transparent)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq, Eq, Default, Hash)]
pub struct LightLevel(pub u8);

impl LightLevel {
    /// No light in either channel.
    pub const DARK: LightLevel = LightLevel(0);

    /// Full skylight, no block light. Used for positions above the world.
    pub const OPEN_SKY: LightLevel = LightLevel(MAX_LIGHT << 4);

    /// Packs the two channels. Values above 15 are clamped.
    pub const fn new(sky: u8, block: u8) -> Self {
        let sky = if sky > MAX_LIGHT { MAX_LIGHT } else { sky };
        let block = if block > MAX_LIGHT { MAX_LIGHT } else { block };
        LightLevel((sky << 4) | block)
    }

    /// Skylight channel.
    pub const fn sky(self) -> u8 {
        self.0 >> 4
    }

    /// Block light channel.
    pub const fn block(self) -> u8 {
        self.0 & 0x0F
    }

    /// Returns a copy with the sky channel replaced.
    pub const fn with_sky(self, sky: u8) -> Self {
        LightLevel::new(sky, self.block())
    }

    /// Returns a copy with the block channel replaced.
    pub const fn with_block(self, block: u8) -> Self {
        LightLevel::new(self.sky(), block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_draws_nothing() {
        for block_type in BlockType::ALL {
            assert!(!should_draw_face(BlockClass::Air, block_type.class()));
        }
    }

    #[test]
    fn test_opaque_hides_behind_partial() {
        assert!(!should_draw_face(
            BlockClass::Opaque,
            BlockClass::PartiallyTransparent
        ));
        assert!(should_draw_face(
            BlockClass::PartiallyTransparent,
            BlockClass::Opaque
        ));
        assert!(should_draw_face(BlockClass::Opaque, BlockClass::SemiTransparent));
        assert!(should_draw_face(BlockClass::Opaque, BlockClass::Air));
    }

    #[test]
    fn test_same_class_never_draws() {
        for block_type in BlockType::ALL {
            let class = block_type.class();
            assert!(!should_draw_face(class, class));
        }
    }

    #[test]
    fn test_unknown_block_is_opaque() {
        let block = Block { block_type: 250 };
        assert_eq!(block.get_type(), None);
        assert_eq!(block.class(), BlockClass::Opaque);
        assert_eq!(block.light_emission(), 0);
    }

    #[test]
    fn test_light_level_packing() {
        let light = LightLevel::new(12, 3);
        assert_eq!(light.sky(), 12);
        assert_eq!(light.block(), 3);
        assert_eq!(light.with_sky(1).sky(), 1);
        assert_eq!(light.with_block(9).block(), 9);
        assert_eq!(LightLevel::new(40, 40), LightLevel::new(15, 15));
        assert_eq!(LightLevel::OPEN_SKY.sky(), 15);
    }
}
