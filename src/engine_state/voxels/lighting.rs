//! # Light Propagation
//!
//! Two independent breadth-first flood fills over the loaded chunks: skylight
//! seeded from the top of every column, and block light seeded from emissive
//! blocks. Voxels are graph nodes, edges join the 6 axis neighbors and freely
//! cross chunk boundaries. Unloaded chunks are not part of the graph.
//!
//! ## Propagation rule
//!
//! A voxel at level `L` raises each light-transparent neighbor whose level is
//! below `L - 1` to `L - 1` and enqueues it. Voxels at `L <= 1` do not expand.
//! Opaque voxels never receive light; an opaque emitter still holds and
//! spreads its own emission.
//!
//! ## Regional recompute
//!
//! `relight` recomputes a set of target chunks exactly by running the fill
//! over the targets plus one surrounding ring of chunks and writing back only
//! the targets. Light decays by one per hop from at most 15, so nothing more
//! than 14 voxels away can influence a voxel, and a chunk ring is 16 wide.

use std::collections::{HashMap, HashSet, VecDeque};

use cgmath::Point3;
use log::debug;

use super::block::{Block, LightLevel, MAX_LIGHT};
use super::chunk::{VoxelChunk, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH};
use super::coords::ChunkCoord;
use super::world::{border_neighbors, World};

const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

#[derive(Clone, Copy)]
enum Channel {
    Sky,
    Block,
}

impl Channel {
    fn get(self, light: LightLevel) -> u8 {
        match self {
            Channel::Sky => light.sky(),
            Channel::Block => light.block(),
        }
    }

    fn set(self, light: LightLevel, level: u8) -> LightLevel {
        match self {
            Channel::Sky => light.with_sky(level),
            Channel::Block => light.with_block(level),
        }
    }
}

/// A voxel inside a region: chunk slot plus local position.
#[derive(Clone, Copy)]
struct Node {
    slot: usize,
    x: i32,
    y: i32,
    z: i32,
}

/// The chunks a fill runs over, with scratch light buffers.
struct Region<'w> {
    slots: HashMap<ChunkCoord, usize>,
    coords: Vec<ChunkCoord>,
    blocks: Vec<&'w [Block]>,
    light: Vec<Vec<LightLevel>>,
}

impl<'w> Region<'w> {
    fn new(world: &'w World, coords: impl IntoIterator<Item = ChunkCoord>) -> Self {
        let mut region = Region {
            slots: HashMap::new(),
            coords: Vec::new(),
            blocks: Vec::new(),
            light: Vec::new(),
        };
        for coord in coords {
            if region.slots.contains_key(&coord) {
                continue;
            }
            if let Some(chunk) = world.get_chunk(coord) {
                region.slots.insert(coord, region.coords.len());
                region.coords.push(coord);
                region.blocks.push(chunk.blocks());
                region.light.push(vec![LightLevel::DARK; CHUNK_VOLUME]);
            }
        }
        region
    }

    fn block(&self, node: Node) -> Block {
        self.blocks[node.slot][VoxelChunk::index(Point3::new(node.x, node.y, node.z))]
    }

    fn get(&self, node: Node, channel: Channel) -> u8 {
        channel.get(self.light[node.slot][VoxelChunk::index(Point3::new(node.x, node.y, node.z))])
    }

    fn set(&mut self, node: Node, channel: Channel, level: u8) {
        let index = VoxelChunk::index(Point3::new(node.x, node.y, node.z));
        let light = &mut self.light[node.slot][index];
        *light = channel.set(*light, level);
    }

    /// Steps from `node` by an axis offset, crossing into other chunks of the region.
    fn step(&self, node: Node, (dx, dy, dz): (i32, i32, i32)) -> Option<Node> {
        let y = node.y + dy;
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return None;
        }
        let x = node.x + dx;
        let z = node.z + dz;
        if (0..CHUNK_WIDTH as i32).contains(&x) && (0..CHUNK_DEPTH as i32).contains(&z) {
            return Some(Node { slot: node.slot, x, y, z });
        }
        let coord = self.coords[node.slot].offset(
            x.div_euclid(CHUNK_WIDTH as i32),
            z.div_euclid(CHUNK_DEPTH as i32),
        );
        let slot = *self.slots.get(&coord)?;
        Some(Node {
            slot,
            x: x.rem_euclid(CHUNK_WIDTH as i32),
            y,
            z: z.rem_euclid(CHUNK_DEPTH as i32),
        })
    }

    /// y of the first opaque voxel from the top of a column, -1 if there is none.
    fn column_height(&self, slot: usize, x: i32, z: i32) -> i32 {
        let blocks = self.blocks[slot];
        (0..CHUNK_HEIGHT as i32)
            .rev()
            .find(|&y| {
                !blocks[VoxelChunk::index(Point3::new(x, y, z))]
                    .class()
                    .is_light_transparent()
            })
            .unwrap_or(-1)
    }

    fn seed_sky(&mut self, queue: &mut VecDeque<Node>) {
        let mut heights = vec![[[0i32; CHUNK_WIDTH]; CHUNK_DEPTH]; self.coords.len()];
        for (slot, slot_heights) in heights.iter_mut().enumerate() {
            for z in 0..CHUNK_DEPTH as i32 {
                for x in 0..CHUNK_WIDTH as i32 {
                    slot_heights[z as usize][x as usize] = self.column_height(slot, x, z);
                }
            }
        }

        for slot in 0..self.coords.len() {
            for z in 0..CHUNK_DEPTH as i32 {
                for x in 0..CHUNK_WIDTH as i32 {
                    let height = heights[slot][z as usize][x as usize];
                    let top = Node { slot, x, y: 0, z };

                    // Seeded voxels only need expanding where a horizontal
                    // neighbor column is shaded at the same y.
                    let mut shaded_below = -1;
                    for offset in [(1, 0, 0), (-1, 0, 0), (0, 0, 1), (0, 0, -1)] {
                        if let Some(n) = self.step(top, offset) {
                            let height = heights[n.slot][n.z as usize][n.x as usize];
                            shaded_below = shaded_below.max(height);
                        }
                    }

                    for y in (height + 1)..CHUNK_HEIGHT as i32 {
                        let node = Node { slot, x, y, z };
                        self.set(node, Channel::Sky, MAX_LIGHT);
                        if y < shaded_below {
                            queue.push_back(node);
                        }
                    }
                }
            }
        }
    }

    fn seed_block(&mut self, queue: &mut VecDeque<Node>) {
        for slot in 0..self.coords.len() {
            let blocks = self.blocks[slot];
            for (index, block) in blocks.iter().enumerate() {
                let emission = block.light_emission();
                if emission == 0 {
                    continue;
                }
                let x = (index % CHUNK_WIDTH) as i32;
                let z = ((index / CHUNK_WIDTH) % CHUNK_DEPTH) as i32;
                let y = (index / (CHUNK_WIDTH * CHUNK_DEPTH)) as i32;
                let node = Node { slot, x, y, z };
                self.set(node, Channel::Block, emission);
                queue.push_back(node);
            }
        }
    }

    fn flood(&mut self, queue: &mut VecDeque<Node>, channel: Channel) {
        while let Some(node) = queue.pop_front() {
            let level = self.get(node, channel);
            if level <= 1 {
                continue;
            }
            for offset in NEIGHBOR_OFFSETS {
                let Some(neighbor) = self.step(node, offset) else {
                    continue;
                };
                if !self.block(neighbor).class().is_light_transparent() {
                    continue;
                }
                if self.get(neighbor, channel) < level - 1 {
                    self.set(neighbor, channel, level - 1);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    fn compute(&mut self) {
        let mut queue = VecDeque::new();
        self.seed_sky(&mut queue);
        self.flood(&mut queue, Channel::Sky);
        self.seed_block(&mut queue);
        self.flood(&mut queue, Channel::Block);
    }
}

fn on_border(x: i32, z: i32) -> bool {
    x == 0 || z == 0 || x == CHUNK_WIDTH as i32 - 1 || z == CHUNK_DEPTH as i32 - 1
}

/// Computes skylight and block light for loaded chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct LightPropagator;

impl LightPropagator {
    /// Creates a propagator.
    pub fn new() -> Self {
        LightPropagator
    }

    /// Recomputes light for every loaded chunk.
    ///
    /// # Returns
    /// The chunks marked dirty because their light or their border light changed.
    pub fn propagate_all(&self, world: &mut World) -> HashSet<ChunkCoord> {
        let all: Vec<ChunkCoord> = world.coords().collect();
        self.relight(world, &all)
    }

    /// Recomputes light for `targets` exactly, reading one ring of chunks around them.
    ///
    /// Chunks whose stored light changed are marked dirty, as are loaded
    /// neighbors whose border includes a changed voxel.
    ///
    /// # Arguments
    /// * `world` - The loaded-chunk set
    /// * `targets` - Chunks to recompute; unloaded ones are ignored
    ///
    /// # Returns
    /// Every chunk marked dirty by the recompute.
    pub fn relight(&self, world: &mut World, targets: &[ChunkCoord]) -> HashSet<ChunkCoord> {
        let targets: Vec<ChunkCoord> = targets
            .iter()
            .copied()
            .filter(|&coord| world.is_loaded(coord))
            .collect();
        if targets.is_empty() {
            return HashSet::new();
        }

        let (coords, light) = {
            let region_coords = targets
                .iter()
                .flat_map(|&coord| std::iter::once(coord).chain(coord.ring_neighbors()));
            let mut region = Region::new(world, region_coords);
            region.compute();
            (region.coords, region.light)
        };

        let target_set: HashSet<ChunkCoord> = targets.iter().copied().collect();
        let mut dirtied = HashSet::new();
        for (coord, computed) in coords.into_iter().zip(light) {
            if !target_set.contains(&coord) {
                continue;
            }
            let Some(chunk) = world.get_chunk_mut(coord) else {
                continue;
            };

            let mut changed = false;
            let mut touched = HashSet::new();
            for (index, (stored, new)) in chunk.light().iter().zip(&computed).enumerate() {
                if stored == new {
                    continue;
                }
                changed = true;
                let x = (index % CHUNK_WIDTH) as i32;
                let z = ((index / CHUNK_WIDTH) % CHUNK_DEPTH) as i32;
                if on_border(x, z) {
                    let y = (index / (CHUNK_WIDTH * CHUNK_DEPTH)) as i32;
                    touched.extend(border_neighbors(coord, Point3::new(x, y, z)));
                }
            }
            if !changed {
                continue;
            }

            chunk.light_mut().copy_from_slice(&computed);
            chunk.mark_dirty();
            dirtied.insert(coord);
            for neighbor in touched {
                if world.mark_dirty(neighbor) {
                    dirtied.insert(neighbor);
                }
            }
        }

        debug!(
            "Relit {} chunks, {} marked dirty",
            target_set.len(),
            dirtied.len()
        );
        dirtied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::world::VoxelLookup;

    fn single_chunk_world() -> World {
        let mut world = World::new(0);
        let chunk = world.acquire_chunk(ChunkCoord::new(0, 0));
        world.insert_chunk(chunk);
        world
    }

    #[test]
    fn test_open_column_is_fully_lit() {
        let mut world = single_chunk_world();
        LightPropagator::new().propagate_all(&mut world);
        for y in 0..CHUNK_HEIGHT as i32 {
            assert_eq!(world.light_at(Point3::new(3, y, 3)).sky(), 15);
        }
    }

    #[test]
    fn test_emitter_decays_by_one_per_hop() {
        let mut world = single_chunk_world();
        world.set_block(Point3::new(8, 100, 8), Block::new(BlockType::GLOWSTONE));
        LightPropagator::new().propagate_all(&mut world);

        assert_eq!(world.light_at(Point3::new(8, 100, 8)).block(), 15);
        assert_eq!(world.light_at(Point3::new(9, 100, 8)).block(), 14);
        assert_eq!(world.light_at(Point3::new(8, 103, 8)).block(), 12);
        assert_eq!(world.light_at(Point3::new(10, 101, 9)).block(), 11);
    }

    #[test]
    fn test_relight_reports_changed_chunks() {
        let mut world = single_chunk_world();
        let propagator = LightPropagator::new();
        propagator.propagate_all(&mut world);
        if let Some(chunk) = world.get_chunk_mut(ChunkCoord::new(0, 0)) {
            chunk.clear_dirty();
        }

        assert!(propagator.relight(&mut world, &[ChunkCoord::new(0, 0)]).is_empty());

        world.set_block(Point3::new(4, 50, 4), Block::new(BlockType::STONE));
        let dirtied = propagator.relight(&mut world, &[ChunkCoord::new(0, 0)]);
        assert!(dirtied.contains(&ChunkCoord::new(0, 0)));
        assert_eq!(world.light_at(Point3::new(4, 49, 4)).sky(), 14);
    }
}
