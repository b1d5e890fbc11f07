use std::sync::Arc;

use cgmath::Point3;
use voxel_streamer::engine_state::rendering::meshing::face::ao_level;
use voxel_streamer::engine_state::rendering::meshing::lod::LodLevel;
use voxel_streamer::engine_state::rendering::meshing::{MeshBuilder, MeshData, MeshOptions};
use voxel_streamer::engine_state::rendering::texture::TextureAtlasMapping;
use voxel_streamer::engine_state::voxels::block::block_type::BlockType;
use voxel_streamer::engine_state::voxels::block::{should_draw_face, Block, BlockClass};
use voxel_streamer::engine_state::voxels::chunk::padded::PaddedChunk;
use voxel_streamer::engine_state::voxels::chunk::VoxelChunk;
use voxel_streamer::engine_state::voxels::coords::ChunkCoord;
use voxel_streamer::engine_state::voxels::world::World;

fn builder() -> MeshBuilder {
    MeshBuilder::new(
        Arc::new(TextureAtlasMapping::default_atlas()),
        MeshOptions::default(),
    )
}

fn mesh(chunk: &VoxelChunk) -> MeshData {
    builder()
        .build(&PaddedChunk::isolated(chunk), LodLevel::Full)
        .unwrap()
}

fn pair(source: BlockType, neighbor: BlockType) -> MeshData {
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    chunk.set_block(Point3::new(8, 8, 8), Block::new(source));
    chunk.set_block(Point3::new(9, 8, 8), Block::new(neighbor));
    mesh(&chunk)
}

#[test]
fn test_visibility_is_a_function_of_classes() {
    for source in BlockType::ALL {
        for neighbor in BlockType::ALL {
            let data = pair(source, neighbor);
            let shared_faces = [
                (source.class(), neighbor.class()),
                (neighbor.class(), source.class()),
            ]
            .iter()
            .filter(|&&(from, to)| should_draw_face(from, to))
            .count();

            // Each non-air voxel draws its 5 exposed faces plus the shared one when allowed.
            let exposed = [source, neighbor]
                .iter()
                .filter(|t| t.class() != BlockClass::Air)
                .count()
                * 5;
            assert_eq!(
                data.vertex_count(),
                (exposed + shared_faces) * 6,
                "{:?} next to {:?}",
                source,
                neighbor
            );
        }
    }
}

#[test]
fn test_solid_face_hidden_by_partially_transparent_neighbor() {
    let data = pair(BlockType::STONE, BlockType::WATER);
    assert_eq!(data.opaque_count(), 5 * 6);
    assert_eq!(data.transparent_count(), 6 * 6);

    let data = pair(BlockType::STONE, BlockType::GLASS);
    assert_eq!(data.opaque_count(), 6 * 6);
    assert_eq!(data.transparent_count(), 6 * 6);

    let data = pair(BlockType::GLASS, BlockType::ICE);
    assert_eq!(data.transparent_count(), 10 * 6);
}

#[test]
fn test_isolated_block_at_origin() {
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    chunk.set_block(Point3::new(0, 0, 0), Block::new(BlockType::STONE));
    let data = mesh(&chunk);

    assert_eq!(data.opaque_count(), 36);
    assert_eq!(data.transparent_count(), 0);
    assert!(data.opaque.iter().all(|v| v.ao() == 3));
}

#[test]
fn test_isolated_voxels_each_emit_six_faces() {
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    let mut count = 0;
    for y in (10..20).step_by(2) {
        for z in (0..16).step_by(2) {
            for x in (0..16).step_by(2) {
                chunk.set_block(Point3::new(x, y, z), Block::new(BlockType::DIRT));
                count += 1;
            }
        }
    }
    assert_eq!(mesh(&chunk).opaque_count(), 6 * 6 * count);
}

#[test]
fn test_solid_cube_emits_only_its_shell() {
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    chunk.fill(
        Point3::new(4, 100, 4),
        Point3::new(7, 103, 7),
        Block::new(BlockType::STONE),
    );
    assert_eq!(mesh(&chunk).opaque_count(), 6 * 16 * 6);
}

#[test]
fn test_ao_levels_stay_in_range() {
    fastrand::seed(0x5eed);
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    for y in 0..32 {
        for z in 0..16 {
            for x in 0..16 {
                if fastrand::u8(..) < 90 {
                    chunk.set_block(Point3::new(x, y, z), Block::new(BlockType::get_random_type()));
                }
            }
        }
    }
    let data = mesh(&chunk);
    assert!(data.vertex_count() > 0);
    assert!(data.opaque.iter().chain(&data.transparent).all(|v| v.ao() <= 3));
}

#[test]
fn test_both_sides_occluded_is_darkest() {
    assert_eq!(ao_level(true, true, false), 0);
    assert_eq!(ao_level(true, true, true), 0);
    assert_eq!(ao_level(false, false, false), 3);
    assert_eq!(ao_level(true, false, true), 1);
}

#[test]
fn test_inner_corner_darkens_vertices() {
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    chunk.set_block(Point3::new(8, 8, 8), Block::new(BlockType::STONE));
    chunk.set_block(Point3::new(9, 9, 8), Block::new(BlockType::STONE));
    chunk.set_block(Point3::new(8, 9, 9), Block::new(BlockType::STONE));
    let data = mesh(&chunk);

    let min_ao = data.opaque.iter().map(|v| v.ao()).min();
    assert_eq!(min_ao, Some(0));
}

#[test]
fn test_reduced_lod_has_fewer_vertices_and_no_ao() {
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    fastrand::seed(42);
    for y in 0..16 {
        for z in 0..16 {
            for x in 0..16 {
                if fastrand::bool() {
                    chunk.set_block(Point3::new(x, y, z), Block::new(BlockType::STONE));
                }
            }
        }
    }
    let snapshot = PaddedChunk::isolated(&chunk);
    let full = builder().build(&snapshot, LodLevel::Full).unwrap();
    let quarter = builder().build(&snapshot, LodLevel::Quarter).unwrap();

    assert!(quarter.vertex_count() < full.vertex_count());
    assert!(quarter.opaque.iter().all(|v| v.ao() == 3));
    assert_eq!(quarter.lod, LodLevel::Quarter);
}

#[test]
fn test_reduced_lod_face_checks_neighboring_cell_origin() {
    // At half detail the cell at x=0 samples air, so the stone at x=1 is
    // never emitted and must not hide the -X face of the cell at x=2.
    let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
    chunk.set_block(Point3::new(1, 0, 0), Block::new(BlockType::STONE));
    chunk.set_block(Point3::new(2, 0, 0), Block::new(BlockType::STONE));

    let half = builder()
        .build(&PaddedChunk::isolated(&chunk), LodLevel::Half)
        .unwrap();
    assert_eq!(half.opaque_count(), 6 * 6);
}

fn border_world(with_neighbor: bool) -> World {
    let mut world = World::new(0);
    let mut center = world.acquire_chunk(ChunkCoord::new(0, 0));
    center.set_block(Point3::new(15, 8, 8), Block::new(BlockType::STONE));
    world.insert_chunk(center);
    if with_neighbor {
        let mut east = world.acquire_chunk(ChunkCoord::new(1, 0));
        east.set_block(Point3::new(0, 8, 8), Block::new(BlockType::STONE));
        world.insert_chunk(east);
    }
    world
}

#[test]
fn test_loaded_neighbor_hides_border_face() {
    let world = border_world(true);
    let snapshot = PaddedChunk::capture(&world, ChunkCoord::new(0, 0)).unwrap();
    let mesh = builder().build(&snapshot, LodLevel::Full).unwrap();
    assert_eq!(mesh.opaque_count(), 5 * 6);
}

#[test]
fn test_missing_neighbor_leaves_border_face_visible() {
    let world = border_world(false);
    let snapshot = PaddedChunk::capture(&world, ChunkCoord::new(0, 0)).unwrap();
    let mesh = builder().build(&snapshot, LodLevel::Full).unwrap();
    assert_eq!(mesh.opaque_count(), 6 * 6);
}
