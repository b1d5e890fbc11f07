//! Block texture lookup for meshing.
//!
//! `MeshBuilder` asks a `TextureMapping` which atlas layer each face of each
//! block type uses. The mapping is an explicit object built once at startup
//! by whoever assembles the atlas, so meshing has no hidden global state and
//! tests can hand in a fake.

use std::collections::HashMap;

use serde_json::Value;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;

/// Layer substituted when a block type has no mapping.
pub const PLACEHOLDER_LAYER: u32 = 0;

/// Pure lookup from block type and face to texture-atlas layer.
pub trait TextureMapping {
    /// Returns the layer for a face of a block type, `None` if unmapped.
    fn texture_layer_for(&self, block_type: BlockType, side: BlockSide) -> Option<u32>;
}

/// Table-driven texture mapping.
///
/// Each entry holds 6 layers in face order:
/// [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(Debug, Clone, Default)]
pub struct TextureAtlasMapping {
    layers: HashMap<BlockType, [u32; 6]>,
}

impl TextureAtlasMapping {
    /// Creates an empty mapping. Every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the layers for every face of a block type.
    pub fn insert(&mut self, block_type: BlockType, layers: [u32; 6]) -> &mut Self {
        self.layers.insert(block_type, layers);
        self
    }

    /// The built-in atlas layout.
    pub fn default_atlas() -> Self {
        let mut mapping = Self::new();
        mapping
            .insert(BlockType::WOOD, [1, 1, 1, 1, 1, 1])
            .insert(BlockType::DIRT, [2, 2, 2, 2, 2, 2])
            .insert(BlockType::GRASS, [3, 3, 2, 4, 3, 3])
            .insert(BlockType::STONE, [5, 5, 5, 5, 5, 5])
            .insert(BlockType::SAND, [6, 6, 6, 6, 6, 6])
            .insert(BlockType::GLASS, [7, 7, 7, 7, 7, 7])
            .insert(BlockType::ICE, [8, 8, 8, 8, 8, 8])
            .insert(BlockType::WATER, [9, 9, 9, 9, 9, 9])
            .insert(BlockType::LEAVES, [10, 10, 10, 10, 10, 10])
            .insert(BlockType::GLOWSTONE, [11, 11, 11, 11, 11, 11])
            .insert(BlockType::TORCH, [12, 12, 12, 12, 12, 12])
            .insert(BlockType::LAVA, [13, 13, 13, 13, 13, 13]);
        mapping
    }

    /// Parses a mapping from JSON of the form `{ "GRASS": [3, 3, 2, 4, 3, 3] }`.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, [u32; 6]> = serde_json::from_str(text)?;
        let mut mapping = Self::new();
        for (name, layers) in raw {
            let block_type: BlockType = serde_json::from_value(Value::String(name))?;
            mapping.insert(block_type, layers);
        }
        Ok(mapping)
    }
}

impl TextureMapping for TextureAtlasMapping {
    fn texture_layer_for(&self, block_type: BlockType, side: BlockSide) -> Option<u32> {
        self.layers.get(&block_type).map(|layers| layers[side as usize])
    }
}
