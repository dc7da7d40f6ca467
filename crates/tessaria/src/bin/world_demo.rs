//! # World Demo
//!
//! Generates a world from a TOML file, performs a handful of edits around the
//! spawn point and logs what changed.
//!
//! ```bash
//! # Built-in sample world
//! cargo run --bin world_demo
//!
//! # Custom world, verbose
//! RUST_LOG=debug cargo run --bin world_demo -- path/to/world.toml
//! ```

use std::process::ExitCode;

use tessaria::{CameraView, World, WorldResult};
use tessaria_core::{Layer, TileTag, TileType, WorldConfig};
use tracing_subscriber::EnvFilter;

const SAMPLE_WORLD: &str = include_str!("../../data/world.toml");

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}

fn run() -> WorldResult<()> {
    let mut world = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(%path, "loading world config");
            World::from_toml_file(path)?
        }
        None => World::generate(WorldConfig::from_toml_str(SAMPLE_WORLD)?)?,
    };

    let spawn = world.spawn_point();
    let camera = CameraView {
        center_x: spawn.x as f32,
        half_extent: 32.0,
    };
    let report = world.tick(camera);
    tracing::info!(
        x = spawn.x,
        y = spawn.y,
        biome = ?world.biome_category(spawn.x, spawn.y),
        active_chunks = report.toggles.len(),
        "spawn"
    );

    // Wall off the open cell at spawn, then dig out the surface block below it.
    let surface = world.surface_height(spawn.x).unwrap_or(0);
    let above = spawn.y;
    let light_before = world.light_at(spawn.x, above);
    if let Some(wall) = world.atlas().template_for(TileType::Wall) {
        if world.place(spawn.x, above, wall, TileType::Wall, TileTag::Wall) {
            let report = world.tick(camera);
            tracing::info!(
                before = light_before,
                after = world.light_at(spawn.x, above),
                changed = report.light.cells.len(),
                "wall placed"
            );
        }
    }
    if world.remove(spawn.x, above, TileTag::Wall) {
        world.tick(camera);
        tracing::info!(light = world.light_at(spawn.x, above), "wall removed");
    }

    let ground = surface - 1;
    match world.try_remove(spawn.x, ground, TileTag::Ground) {
        Ok(quantity) => {
            let report = world.tick(camera);
            tracing::info!(quantity, changed = report.light.cells.len(), "surface dug");
        }
        Err(err) => tracing::warn!(%err, "dig rejected"),
    }

    for drop in world.take_drops() {
        tracing::info!(
            tile = ?drop.tile_type,
            biome = %drop.biome,
            quantity = drop.quantity,
            player_placed = drop.player_placed,
            "drop"
        );
    }

    let walls = world.occupancy().list(Layer::Background).len();
    tracing::info!(
        size = world.size(),
        chunks = world.chunks().len(),
        walls,
        bytes = world.light_bytes().len(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "world demo failed");
            ExitCode::FAILURE
        }
    }
}
