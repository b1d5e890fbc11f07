//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and
//! the properties that are pure functions of the type: render class, light
//! emission and whether the block's texture is animated.

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::{BlockClass, BlockTypeSize};

/// Enumerates all possible block types in the voxel world.
///
/// The discriminant is the value stored in chunk data, so variants must only
/// ever be appended. The `FromPrimitive` derive converts stored bytes back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Contributes no geometry and passes all light.
    AIR = 0,

    /// A basic dirt block.
    DIRT = 1,

    /// A grass block with different textures on top and sides.
    GRASS = 2,

    /// Solid rock, the bulk of generated terrain.
    STONE = 3,

    /// A wooden block with a bark texture on all sides.
    WOOD = 4,

    /// Loose sand found near the water line.
    SAND = 5,

    /// Clear glass. Drawn in the semi-transparent pass.
    GLASS = 6,

    /// Translucent ice. Drawn in the semi-transparent pass.
    ICE = 7,

    /// Still water. Partially transparent and animated.
    WATER = 8,

    /// Tree foliage. Partially transparent.
    LEAVES = 9,

    /// A solid block that emits full-strength block light.
    GLOWSTONE = 10,

    /// A small partially-transparent light source.
    TORCH = 11,

    /// Molten rock. Partially transparent, animated and emissive.
    LAVA = 12,
}

impl BlockType {
    /// Every block type, in discriminant order.
    pub const ALL: [BlockType; 13] = [
        BlockType::AIR,
        BlockType::DIRT,
        BlockType::GRASS,
        BlockType::STONE,
        BlockType::WOOD,
        BlockType::SAND,
        BlockType::GLASS,
        BlockType::ICE,
        BlockType::WATER,
        BlockType::LEAVES,
        BlockType::GLOWSTONE,
        BlockType::TORCH,
        BlockType::LAVA,
    ];

    /// Converts a stored `BlockTypeSize` to a `BlockType`.
    ///
    /// # Returns
    /// `None` if the value does not name a block type (corrupt data).
    pub fn get_block_type_from_int(btype: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(btype)
    }

    /// Generates a random solid terrain block type (excluding AIR).
    pub fn get_random_type() -> Self {
        const TERRAIN: [BlockType; 4] = [
            BlockType::DIRT,
            BlockType::GRASS,
            BlockType::STONE,
            BlockType::WOOD,
        ];
        TERRAIN[fastrand::usize(..TERRAIN.len())]
    }

    /// The render/light class of this type.
    pub const fn class(self) -> BlockClass {
        match self {
            BlockType::AIR => BlockClass::Air,
            BlockType::GLASS | BlockType::ICE => BlockClass::SemiTransparent,
            BlockType::WATER | BlockType::LEAVES | BlockType::TORCH | BlockType::LAVA => {
                BlockClass::PartiallyTransparent
            }
            BlockType::DIRT
            | BlockType::GRASS
            | BlockType::STONE
            | BlockType::WOOD
            | BlockType::SAND
            | BlockType::GLOWSTONE => BlockClass::Opaque,
        }
    }

    /// Block light emitted by this type, 0-15.
    pub const fn light_emission(self) -> u8 {
        match self {
            BlockType::GLOWSTONE | BlockType::LAVA => 15,
            BlockType::TORCH => 14,
            _ => 0,
        }
    }

    /// Whether the texture of this type scrolls over time.
    pub const fn is_animated(self) -> bool {
        matches!(self, BlockType::WATER | BlockType::LAVA)
    }
}
