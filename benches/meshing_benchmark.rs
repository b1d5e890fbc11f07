//! Benchmarks for terrain generation, lighting and mesh building.
//!
//! Run with: cargo bench --bench meshing_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use voxel_streamer::engine_state::rendering::meshing::lod::LodLevel;
use voxel_streamer::engine_state::rendering::meshing::{MeshBuilder, MeshOptions};
use voxel_streamer::engine_state::rendering::texture::TextureAtlasMapping;
use voxel_streamer::engine_state::voxels::chunk::padded::PaddedChunk;
use voxel_streamer::engine_state::voxels::chunk::VoxelChunk;
use voxel_streamer::engine_state::voxels::coords::ChunkCoord;
use voxel_streamer::engine_state::voxels::generation::{ContentSource, PerlinTerrain};
use voxel_streamer::engine_state::voxels::lighting::LightPropagator;
use voxel_streamer::engine_state::voxels::world::World;

fn terrain_world(radius: i32) -> World {
    let terrain = PerlinTerrain::new(42);
    let mut world = World::new(0);
    for coord in ChunkCoord::new(0, 0).square_around(radius) {
        let mut chunk = world.acquire_chunk(coord);
        terrain.populate(&mut chunk, coord);
        world.insert_chunk(chunk);
    }
    LightPropagator::new().propagate_all(&mut world);
    world
}

fn benchmark_generation(c: &mut Criterion) {
    let terrain = PerlinTerrain::new(42);

    c.bench_function("perlin_chunk_generation", |b| {
        let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), 0);
        let mut x = 0i32;
        b.iter(|| {
            x = x.wrapping_add(1);
            let coord = ChunkCoord::new(x, x / 2);
            chunk.reset(coord, 0);
            terrain.populate(&mut chunk, coord);
            black_box(chunk.blocks().len())
        });
    });
}

fn benchmark_lighting(c: &mut Criterion) {
    let mut group = c.benchmark_group("lighting");
    group.sample_size(10);
    group.throughput(Throughput::Elements(9));

    let mut world = terrain_world(1);
    let propagator = LightPropagator::new();
    group.bench_function("propagate_3x3_chunks", |b| {
        b.iter(|| black_box(propagator.propagate_all(&mut world).len()));
    });

    group.finish();
}

fn benchmark_meshing(c: &mut Criterion) {
    let world = terrain_world(1);
    let snapshot = PaddedChunk::capture(&world, ChunkCoord::new(0, 0))
        .expect("center chunk is loaded");
    let builder = MeshBuilder::new(
        Arc::new(TextureAtlasMapping::default_atlas()),
        MeshOptions::default(),
    );

    let mut group = c.benchmark_group("meshing");
    for lod in [LodLevel::Full, LodLevel::Half, LodLevel::Quarter] {
        group.bench_function(format!("terrain_chunk_{:?}", lod), |b| {
            b.iter(|| black_box(builder.build(black_box(&snapshot), lod)))
        });
    }
    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let world = terrain_world(1);

    c.bench_function("padded_snapshot_capture", |b| {
        b.iter(|| black_box(PaddedChunk::capture(&world, ChunkCoord::new(0, 0))))
    });
}

criterion_group!(
    benches,
    benchmark_generation,
    benchmark_lighting,
    benchmark_meshing,
    benchmark_snapshot
);
criterion_main!(benches);
