use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cgmath::{Point3, Vector3};
use voxel_streamer::config::EngineConfig;
use voxel_streamer::engine_state::behavior::{AddCause, BehaviorListener, RemovalCause};
use voxel_streamer::engine_state::observability::LogObserver;
use voxel_streamer::engine_state::rendering::texture::TextureAtlasMapping;
use voxel_streamer::engine_state::rendering::vertex::VoxelVertex;
use voxel_streamer::engine_state::rendering::{RenderPass, RenderSink};
use voxel_streamer::engine_state::voxels::block::block_type::BlockType;
use voxel_streamer::engine_state::voxels::block::Block;
use voxel_streamer::engine_state::voxels::chunk::VoxelChunk;
use voxel_streamer::engine_state::voxels::coords::ChunkCoord;
use voxel_streamer::engine_state::voxels::generation::{ContentSource, EmptyTerrain, FlatTerrain};
use voxel_streamer::engine_state::voxels::persistence::MemoryChunkStore;
use voxel_streamer::engine_state::voxels::streaming::WorldStreamer;
use voxel_streamer::engine_state::EngineState;
use voxel_streamer::error::{ConfigError, EngineError};

fn config(load_radius: i32, unload_radius: i32) -> EngineConfig {
    EngineConfig {
        load_radius,
        unload_radius,
        worker_threads: Some(1),
        ..EngineConfig::default()
    }
}

fn streamer(
    load_radius: i32,
    unload_radius: i32,
    content: Box<dyn ContentSource>,
) -> WorldStreamer {
    streamer_with_store(load_radius, unload_radius, content, MemoryChunkStore::new(64))
}

fn streamer_with_store(
    load_radius: i32,
    unload_radius: i32,
    content: Box<dyn ContentSource>,
    store: MemoryChunkStore,
) -> WorldStreamer {
    WorldStreamer::new(
        config(load_radius, unload_radius),
        Arc::new(TextureAtlasMapping::default_atlas()),
        content,
        Box::new(store),
        Box::new(LogObserver),
    )
}

/// Ticks until every loaded chunk has a current mesh.
fn settle(streamer: &mut WorldStreamer, center: ChunkCoord) {
    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        streamer.update_chunk(center);
        streamer.drain_completed();
        let clean = streamer.world().chunks().all(|chunk| !chunk.is_dirty());
        if clean && streamer.scheduler().in_flight() == 0 {
            return;
        }
        assert!(Instant::now() < deadline, "meshes did not settle in time");
        thread::sleep(Duration::from_millis(5));
    }
}

fn dirty_chunks(streamer: &WorldStreamer) -> Vec<ChunkCoord> {
    let mut dirty: Vec<ChunkCoord> = streamer
        .world()
        .chunks()
        .filter(|chunk| chunk.is_dirty())
        .map(|chunk| chunk.coord())
        .collect();
    dirty.sort();
    dirty
}

/// Two stone layers at the bottom and a glass layer above them.
struct LayeredTerrain;

impl ContentSource for LayeredTerrain {
    fn populate(&self, chunk: &mut VoxelChunk, _coord: ChunkCoord) {
        chunk.fill(
            Point3::new(0, 0, 0),
            Point3::new(15, 1, 15),
            Block::new(BlockType::STONE),
        );
        chunk.fill(
            Point3::new(0, 5, 0),
            Point3::new(15, 5, 15),
            Block::new(BlockType::GLASS),
        );
    }
}

#[derive(Default)]
struct RecordingSink {
    calls: Vec<(ChunkCoord, RenderPass)>,
}

impl RenderSink for RecordingSink {
    fn upload_and_draw(&mut self, coord: ChunkCoord, pass: RenderPass, vertices: &[VoxelVertex]) {
        assert!(!vertices.is_empty());
        self.calls.push((coord, pass));
    }
}

#[derive(Default)]
struct CauseCounts {
    loaded: usize,
    placed: usize,
    unloaded: usize,
    destroyed: usize,
}

struct CountingListener(Rc<RefCell<CauseCounts>>);

impl BehaviorListener for CountingListener {
    fn on_voxel_added(&mut self, _pos: Point3<i32>, _block_type: BlockType, cause: AddCause) {
        let mut counts = self.0.borrow_mut();
        match cause {
            AddCause::Loaded => counts.loaded += 1,
            AddCause::Placed => counts.placed += 1,
        }
    }

    fn on_voxel_removed(&mut self, _pos: Point3<i32>, _block_type: BlockType, cause: RemovalCause) {
        let mut counts = self.0.borrow_mut();
        match cause {
            RemovalCause::Unloaded => counts.unloaded += 1,
            RemovalCause::Destroyed => counts.destroyed += 1,
        }
    }
}

#[test]
fn test_loads_full_square_around_observer() {
    let mut streamer = streamer(2, 3, Box::new(EmptyTerrain));
    let report = streamer.update(Vector3::new(8.0, 70.0, 8.0));

    assert_eq!(report.loaded, 25);
    assert_eq!(report.restored, 0);
    assert_eq!(streamer.world().len(), 25);
    for coord in ChunkCoord::new(0, 0).square_around(2) {
        assert!(streamer.world().is_loaded(coord), "{:?}", coord);
    }
    assert_eq!(streamer.observer_chunk(), Some(ChunkCoord::new(0, 0)));
}

#[test]
fn test_chunk_survives_until_past_unload_radius() {
    let mut streamer = streamer(2, 3, Box::new(EmptyTerrain));
    let origin = ChunkCoord::new(0, 0);
    streamer.update_chunk(origin);

    streamer.update_chunk(ChunkCoord::new(3, 0));
    assert!(streamer.world().is_loaded(origin));

    let report = streamer.update_chunk(ChunkCoord::new(4, 0));
    assert!(!streamer.world().is_loaded(origin));
    assert!(report.unloaded > 0);
    assert!(streamer
        .world()
        .coords()
        .all(|coord| coord.chebyshev_distance(ChunkCoord::new(4, 0)) <= 3));
}

#[test]
fn test_boundary_edit_dirties_owner_and_neighbor_only() {
    let mut streamer = streamer(1, 2, Box::new(EmptyTerrain));
    let center = ChunkCoord::new(0, 0);
    settle(&mut streamer, center);
    assert!(dirty_chunks(&streamer).is_empty());

    let previous = streamer.set_block(Point3::new(0, 100, 8), BlockType::STONE);
    assert_eq!(previous, Some(BlockType::AIR));
    assert_eq!(
        dirty_chunks(&streamer),
        vec![ChunkCoord::new(-1, 0), ChunkCoord::new(0, 0)]
    );

    settle(&mut streamer, center);
    assert!(dirty_chunks(&streamer).is_empty());
}

#[test]
fn test_edited_chunk_is_restored_after_unload() {
    let mut streamer = streamer(0, 1, Box::new(FlatTerrain::default()));
    let pos = Point3::new(3, 2, 3);
    streamer.update_chunk(ChunkCoord::new(0, 0));
    assert_eq!(streamer.set_block(pos, BlockType::GLASS), Some(BlockType::STONE));

    let report = streamer.update_chunk(ChunkCoord::new(2, 0));
    assert_eq!(report.unloaded, 1);
    assert!(!streamer.world().is_loaded(ChunkCoord::new(0, 0)));

    let report = streamer.update_chunk(ChunkCoord::new(0, 0));
    assert_eq!(report.loaded, 1);
    assert_eq!(report.restored, 1);
    assert_eq!(streamer.get_block(pos), BlockType::GLASS);
    assert_eq!(streamer.get_block(Point3::new(4, 2, 3)), BlockType::STONE);

    let chunk = streamer.world().get_chunk(ChunkCoord::new(0, 0)).unwrap();
    assert!(!chunk.is_modified());
    assert!(chunk.is_dirty());
}

#[test]
fn test_unedited_chunk_is_regenerated() {
    let mut streamer = streamer(0, 1, Box::new(FlatTerrain::default()));
    streamer.update_chunk(ChunkCoord::new(0, 0));
    streamer.update_chunk(ChunkCoord::new(2, 0));

    let report = streamer.update_chunk(ChunkCoord::new(0, 0));
    assert_eq!(report.loaded, 1);
    assert_eq!(report.restored, 0);
    assert_eq!(streamer.save_all(), 0);
}

#[test]
fn test_corrupt_stored_chunk_is_regenerated() {
    let mut store = MemoryChunkStore::new(4);
    store.insert_raw(ChunkCoord::new(0, 0), b"not a chunk".to_vec());
    let mut streamer = streamer_with_store(0, 1, Box::new(FlatTerrain::default()), store);

    let report = streamer.update_chunk(ChunkCoord::new(0, 0));
    assert_eq!(report.loaded, 1);
    assert_eq!(report.restored, 0);
    assert_eq!(streamer.get_block(Point3::new(5, 0, 5)), BlockType::STONE);
    assert_eq!(streamer.get_block(Point3::new(5, 4, 5)), BlockType::AIR);
}

#[test]
fn test_listeners_see_loads_edits_and_unloads() {
    let counts = Rc::new(RefCell::new(CauseCounts::default()));
    let mut streamer = streamer(0, 1, Box::new(FlatTerrain::default()));
    streamer.register_listener(Box::new(CountingListener(Rc::clone(&counts))));
    let slab = 4 * 16 * 16;

    streamer.update_chunk(ChunkCoord::new(0, 0));
    assert_eq!(counts.borrow().loaded, slab);

    streamer.set_block(Point3::new(1, 10, 1), BlockType::TORCH);
    streamer.set_block(Point3::new(1, 0, 1), BlockType::AIR);
    streamer.set_block(Point3::new(2, 0, 2), BlockType::SAND);
    {
        let counts = counts.borrow();
        assert_eq!(counts.placed, 2);
        assert_eq!(counts.destroyed, 2);
    }

    streamer.update_chunk(ChunkCoord::new(2, 0));
    let counts = counts.borrow();
    // One stone removed and one torch added: the voxel count is unchanged.
    assert_eq!(counts.unloaded, slab);
    assert_eq!(counts.loaded, 2 * slab);
}

#[test]
fn test_render_draws_opaque_near_to_far_then_transparent_far_to_near() {
    let mut streamer = streamer(1, 2, Box::new(LayeredTerrain));
    let center = ChunkCoord::new(0, 0);
    settle(&mut streamer, center);

    let mut sink = RecordingSink::default();
    streamer.render(&mut sink);
    assert_eq!(sink.calls.len(), 18);

    let split = sink
        .calls
        .iter()
        .position(|&(_, pass)| pass == RenderPass::Transparent)
        .unwrap();
    assert_eq!(split, 9);
    let (opaque, transparent) = sink.calls.split_at(split);
    assert!(opaque.iter().all(|&(_, pass)| pass == RenderPass::Opaque));
    assert!(transparent.iter().all(|&(_, pass)| pass == RenderPass::Transparent));

    let distances = |calls: &[(ChunkCoord, RenderPass)]| -> Vec<i32> {
        calls
            .iter()
            .map(|&(coord, _)| coord.chebyshev_distance(center))
            .collect()
    };
    let near_to_far = distances(opaque);
    assert!(near_to_far.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(near_to_far[0], 0);
    let far_to_near = distances(transparent);
    assert!(far_to_near.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(far_to_near[8], 0);
}

#[test]
fn test_counters_reflect_loaded_chunks_and_rebuilds() {
    let mut streamer = streamer(1, 2, Box::new(LayeredTerrain));
    settle(&mut streamer, ChunkCoord::new(0, 0));

    let counters = streamer.counters();
    assert_eq!(counters.loaded_chunks, 9);
    assert_eq!(counters.in_flight, 0);
    assert_eq!(counters.build_failures, 0);
    assert!(counters.last_vertices_per_chunk > 0);
    assert!(counters.average_vertices_per_chunk > 0.0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = EngineConfig {
        load_radius: 3,
        unload_radius: 3,
        ..EngineConfig::default()
    };
    let result = EngineState::with_defaults(config);
    assert!(matches!(
        result,
        Err(EngineError::Config(ConfigError::RadiusOrder { load: 3, unload: 3 }))
    ));
}

#[test]
fn test_headless_run_draws_chunks() {
    let config = EngineConfig {
        load_radius: 1,
        unload_radius: 2,
        worker_threads: Some(1),
        ..EngineConfig::default()
    };
    let summary = voxel_streamer::run_headless(config, 40).unwrap();
    assert_eq!(summary.frames, 40);
    assert_eq!(summary.counters.loaded_chunks, 9);
}
