//! # Terrain Quality Tests
//!
//! End-to-end checks of the generator pipeline: soil layering on a known
//! one-biome world, seed determinism and the closed tile range.

use tessaria_core::{BiomeDefinition, CellPos, TerrainGrid, TileType, WorldConfig};
use tessaria_procedural::{
    BiomeCatalog, BiomeClassifier, ColorGradient, Heightfield, HeightfieldGenerator, WorldSeed,
};

fn generate(config: &WorldConfig) -> Heightfield {
    let catalog = BiomeCatalog::new(config.biomes.clone()).unwrap();
    let gradient = ColorGradient::from_settings(&config.generation, &catalog);
    let map = BiomeClassifier::new(&catalog, gradient, config.generation.biome_frequency)
        .build_map(config.world_size, WorldSeed::new(config.seed));
    HeightfieldGenerator::new(&catalog, &map, &config.ores, &config.generation)
        .generate(WorldSeed::new(config.seed))
}

fn grassland_config() -> WorldConfig {
    WorldConfig {
        seed: 1234,
        world_size: 50,
        biomes: vec![BiomeDefinition {
            name: "grassland".to_owned(),
            color: [90, 180, 60],
            height_multiplier: 15.0,
            height_addition: 25.0,
            grass_layer_height: 1,
            dirt_layer_height: 10,
            generate_caves: false,
            ores: Vec::new(),
            ..BiomeDefinition::default()
        }],
        ..WorldConfig::default()
    }
}

/// Test: a single grassland biome layers grass, ten rows of dirt, then stone.
#[test]
fn test_grassland_column_layers() {
    let field = generate(&grassland_config());
    let h = field.surface[25];
    assert!((25..=40).contains(&h), "surface {h} outside the height curve");

    let column = |y: i32| field.terrain.tile_type(CellPos::new(25, y));
    assert_eq!(column(h - 1), TileType::Grass);
    for y in (h - 11)..=(h - 2) {
        assert_eq!(column(y), TileType::Dirt, "row {y}");
    }
    for y in 0..(h - 11) {
        assert_eq!(column(y), TileType::Stone, "row {y}");
    }
    for y in h..50 {
        assert_eq!(column(y), TileType::Air, "row {y}");
    }
    assert_eq!(field.spawn, CellPos::new(25, h + 2));
}

/// Test: every column's surface follows the same layering.
#[test]
fn test_every_column_has_grass_on_top() {
    let field = generate(&grassland_config());
    for x in 0..50 {
        let h = field.surface[x as usize];
        assert_eq!(field.terrain.tile_type(CellPos::new(x, h - 1)), TileType::Grass);
        assert_eq!(field.terrain.tile_type(CellPos::new(x, h)), TileType::Air);
    }
}

/// Test: identical inputs give identical terrain and biomes.
#[test]
fn test_generation_is_deterministic() {
    let mut config = WorldConfig::default();
    config.world_size = 96;
    let a = generate(&config);
    let b = generate(&config);
    assert_eq!(a.terrain, b.terrain);
    assert_eq!(a.surface, b.surface);
    assert_eq!(a.biomes, b.biomes);

    config.seed += 1;
    let c = generate(&config);
    assert_ne!(a.terrain, c.terrain, "a different seed should change the world");
}

/// Test: the default world produces ores and caves, and only them below ground.
#[test]
fn test_default_world_contents() {
    let mut config = WorldConfig::default();
    config.world_size = 160;
    config.biomes.iter_mut().for_each(|b| b.height_addition = 110.0);
    let field = generate(&config);
    let terrain: &TerrainGrid = &field.terrain;

    let mut ores = 0;
    let mut caves = 0;
    for (pos, tile) in terrain.types().iter() {
        let h = field.surface[pos.x as usize];
        if pos.y >= h {
            assert_eq!(*tile, TileType::Air);
            assert!(!terrain.has_wall(pos));
            continue;
        }
        if tile.is_ore() {
            ores += 1;
        }
        if *tile == TileType::Wall {
            caves += 1;
            assert!(terrain.has_wall(pos));
        }
        assert!(!tile.is_decoration());
    }
    assert!(ores > 0, "expected some ore");
    assert!(caves > 0, "expected some caves");
}

/// Test: biome ids are stored for every cell, including the sky.
#[test]
fn test_biome_raster_covers_sky() {
    let config = grassland_config();
    let field = generate(&config);
    assert_eq!(field.biomes.width(), 50);
    assert!(field.biomes.as_slice().iter().all(|id| id.0 == 0));
}
