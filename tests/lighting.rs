use cgmath::Point3;
use voxel_streamer::engine_state::voxels::block::block_type::BlockType;
use voxel_streamer::engine_state::voxels::block::{Block, BlockClass};
use voxel_streamer::engine_state::voxels::chunk::CHUNK_HEIGHT;
use voxel_streamer::engine_state::voxels::coords::ChunkCoord;
use voxel_streamer::engine_state::voxels::lighting::LightPropagator;
use voxel_streamer::engine_state::voxels::world::{VoxelLookup, World};

fn empty_world(coords: &[ChunkCoord]) -> World {
    let mut world = World::new(0);
    for &coord in coords {
        let chunk = world.acquire_chunk(coord);
        world.insert_chunk(chunk);
    }
    world
}

fn scattered_world(radius: i32, seed: u64) -> World {
    let coords: Vec<ChunkCoord> = ChunkCoord::new(0, 0).square_around(radius).collect();
    let mut world = empty_world(&coords);
    let mut rng = fastrand::Rng::with_seed(seed);
    for coord in coords {
        let origin = coord.origin();
        for _ in 0..600 {
            let pos = Point3::new(
                origin.x + rng.i32(0..16),
                rng.i32(0..48),
                origin.z + rng.i32(0..16),
            );
            let block_type = match rng.u8(0..20) {
                0 => BlockType::GLOWSTONE,
                1 => BlockType::TORCH,
                2 => BlockType::GLASS,
                3 => BlockType::WATER,
                _ => BlockType::STONE,
            };
            world.set_block(pos, Block::new(block_type));
        }
    }
    world
}

#[test]
fn test_open_column_is_sky_lit_to_the_floor() {
    let mut world = empty_world(&[ChunkCoord::new(0, 0)]);
    LightPropagator::new().propagate_all(&mut world);
    for y in 0..CHUNK_HEIGHT as i32 {
        assert_eq!(world.light_at(Point3::new(7, y, 7)).sky(), 15, "y = {}", y);
    }
}

#[test]
fn test_blocker_darkens_everything_below() {
    let mut world = empty_world(&[ChunkCoord::new(0, 0)]);
    world.set_block(Point3::new(5, 120, 5), Block::new(BlockType::STONE));
    LightPropagator::new().propagate_all(&mut world);

    for y in 0..120 {
        assert!(world.light_at(Point3::new(5, y, 5)).sky() < 15, "y = {}", y);
    }
    for y in 121..CHUNK_HEIGHT as i32 {
        assert_eq!(world.light_at(Point3::new(5, y, 5)).sky(), 15);
    }
    assert_eq!(world.light_at(Point3::new(5, 120, 5)).sky(), 0);
}

#[test]
fn test_roof_exact_levels() {
    let mut world = empty_world(&[ChunkCoord::new(0, 0)]);
    for z in 4..=6 {
        for x in 4..=6 {
            world.set_block(Point3::new(x, 120, z), Block::new(BlockType::STONE));
        }
    }
    LightPropagator::new().propagate_all(&mut world);

    assert_eq!(world.light_at(Point3::new(5, 60, 5)).sky(), 13);
    assert_eq!(world.light_at(Point3::new(4, 60, 5)).sky(), 14);
    assert_eq!(world.light_at(Point3::new(4, 119, 4)).sky(), 14);
    assert_eq!(world.light_at(Point3::new(3, 60, 5)).sky(), 15);
}

#[test]
fn test_block_light_crosses_chunk_boundary() {
    let mut world = empty_world(&[ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]);
    world.set_block(Point3::new(15, 100, 8), Block::new(BlockType::GLOWSTONE));
    LightPropagator::new().propagate_all(&mut world);

    assert_eq!(world.light_at(Point3::new(15, 100, 8)).block(), 15);
    assert_eq!(world.light_at(Point3::new(16, 100, 8)).block(), 14);
    assert_eq!(world.light_at(Point3::new(20, 100, 8)).block(), 10);
    assert_eq!(world.light_at(Point3::new(20, 100, 10)).block(), 8);
    assert_eq!(world.light_at(Point3::new(30, 100, 8)).block(), 0);
}

#[test]
fn test_light_never_passes_through_opaque_walls() {
    let mut world = empty_world(&[ChunkCoord::new(0, 0)]);
    // A sealed stone box around a torch.
    for y in 9..=11 {
        for z in 4..=6 {
            for x in 4..=6 {
                world.set_block(Point3::new(x, y, z), Block::new(BlockType::STONE));
            }
        }
    }
    world.set_block(Point3::new(5, 10, 5), Block::new(BlockType::TORCH));
    LightPropagator::new().propagate_all(&mut world);

    assert_eq!(world.light_at(Point3::new(5, 10, 5)).block(), 14);
    assert_eq!(world.light_at(Point3::new(3, 10, 5)).block(), 0);
    assert_eq!(world.light_at(Point3::new(5, 12, 5)).block(), 0);
}

#[test]
fn test_decay_law_holds_after_convergence() {
    let mut world = scattered_world(0, 11);
    LightPropagator::new().propagate_all(&mut world);

    let transparent = |pos: Point3<i32>| world.block_at(pos).class() != BlockClass::Opaque;
    for y in 0..64 {
        for z in 0..16 {
            for x in 0..16 {
                let a = Point3::new(x, y, z);
                if !transparent(a) {
                    continue;
                }
                for b in [
                    Point3::new(x + 1, y, z),
                    Point3::new(x, y + 1, z),
                    Point3::new(x, y, z + 1),
                ] {
                    if b.x > 15 || b.z > 15 || !transparent(b) {
                        continue;
                    }
                    let (la, lb) = (world.light_at(a), world.light_at(b));
                    assert!(
                        lb.sky() + 1 >= la.sky() && la.sky() + 1 >= lb.sky(),
                        "sky {:?} {:?}",
                        a,
                        b
                    );
                    assert!(
                        lb.block() + 1 >= la.block() && la.block() + 1 >= lb.block(),
                        "block {:?} {:?}",
                        a,
                        b
                    );
                }
            }
        }
    }
}

#[test]
fn test_regional_relight_matches_full_recompute() {
    let propagator = LightPropagator::new();
    let edits = [
        (Point3::new(8, 30, 8), BlockType::GLOWSTONE),
        (Point3::new(0, 47, 0), BlockType::STONE),
        (Point3::new(-1, 20, 15), BlockType::AIR),
    ];

    let mut incremental = scattered_world(2, 3);
    propagator.propagate_all(&mut incremental);
    for (pos, block_type) in edits {
        incremental.set_block(pos, Block::new(block_type));
        let coord = ChunkCoord::from_block(pos);
        let targets: Vec<ChunkCoord> =
            std::iter::once(coord).chain(coord.ring_neighbors()).collect();
        propagator.relight(&mut incremental, &targets);
    }

    let mut full = scattered_world(2, 3);
    for (pos, block_type) in edits {
        full.set_block(pos, Block::new(block_type));
    }
    propagator.propagate_all(&mut full);

    for coord in ChunkCoord::new(0, 0).square_around(2) {
        let a = incremental.get_chunk(coord).unwrap().light();
        let b = full.get_chunk(coord).unwrap().light();
        assert!(a == b, "light differs in chunk {:?}", coord);
    }
}
