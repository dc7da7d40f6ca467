//! # Heightfield Generation
//!
//! Turns the biome raster into terrain, one column at a time:
//!
//! 1. Resolve the column biome at `(x, 0)` and sample the surface height.
//! 2. Fill every row below the surface: grass, then dirt, then stone.
//! 3. In the stone layer, substitute ores (last match wins).
//! 4. Carve caves below the surface row where the cave field is low enough.
//!
//! Every cell is visited exactly once. Generation cannot fail.

use tessaria_core::{
    BiomeDefinition, CellPos, GenerationSettings, Grid, OreDefinition, TerrainGrid, TileType,
};

use crate::biome::{BiomeCatalog, BiomeContext, BiomeId, BiomeMap};
use crate::noise::{purpose, NoiseSampler, WorldSeed};

/// Output of [`HeightfieldGenerator::generate`].
#[derive(Clone, Debug)]
pub struct Heightfield {
    /// Generated terrain.
    pub terrain: TerrainGrid,
    /// Surface height `h` per column: rows `0..h` are filled.
    pub surface: Vec<i32>,
    /// Spawn point, recorded at the middle column.
    pub spawn: CellPos,
    /// Resolved biome per cell, with misses replaced by the default biome.
    pub biomes: Grid<BiomeId>,
}

/// Fills a terrain grid from a biome raster and noise fields.
pub struct HeightfieldGenerator<'a> {
    catalog: &'a BiomeCatalog,
    map: &'a BiomeMap,
    ores: &'a [OreDefinition],
    settings: &'a GenerationSettings,
}

impl<'a> HeightfieldGenerator<'a> {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        catalog: &'a BiomeCatalog,
        map: &'a BiomeMap,
        ores: &'a [OreDefinition],
        settings: &'a GenerationSettings,
    ) -> Self {
        Self {
            catalog,
            map,
            ores,
            settings,
        }
    }

    /// Generates the terrain of a `map.size()` world.
    #[must_use]
    pub fn generate(&self, seed: WorldSeed) -> Heightfield {
        let size = self.map.size();
        let n = size as i32;
        let default = self.catalog.default_id();

        let terrain_noise = NoiseSampler::new(seed.derive(purpose::TERRAIN));
        let caves = NoiseSampler::new(seed.derive(purpose::CAVE)).field(size, self.settings.cave_frequency);
        let ore_fields: Vec<Grid<f32>> = self
            .ores
            .iter()
            .enumerate()
            .map(|(i, ore)| {
                NoiseSampler::new(seed.derive(purpose::ORE_BASE + i as u64)).field(size, ore.frequency)
            })
            .collect();

        let mut terrain = TerrainGrid::new(size);
        let mut biomes = Grid::new(size, size, default);
        let mut surface = vec![0; size];
        let mut spawn = CellPos::new(n / 2, 0);
        let mut ctx = BiomeContext::new(self.settings.biome_lookup);

        for x in 0..n {
            let column = self.map.resolve(x, 0, &mut ctx).unwrap_or(default);
            let column_biome = self.catalog.get_or_default(column);
            let h = surface_height(&terrain_noise, column_biome, x, n);
            surface[x as usize] = h;
            if x == n / 2 {
                spawn = CellPos::new(x, h + self.settings.spawn_offset);
            }

            for y in 0..n {
                let id = self.map.resolve(x, y, &mut ctx).unwrap_or(default);
                biomes.set(x, y, id);
                if y >= h {
                    continue;
                }
                let biome = self.catalog.get_or_default(id);
                let pos = CellPos::new(x, y);
                let mut tile = soil_layer(biome, h - 1 - y);
                if tile == TileType::Stone || (tile == TileType::Dirt && in_deep_layer(biome, h - 1 - y)) {
                    tile = self.substitute_ore(tile, biome, &ore_fields, pos, h);
                }
                let carved = biome.generate_caves
                    && y < h - 1
                    && caves.value_or(x, y, 1.0) <= biome.surface_value;
                if carved {
                    terrain.set_tile(pos, TileType::Wall);
                    terrain.set_wall(pos, true);
                } else {
                    terrain.set_tile(pos, tile);
                }
            }
        }

        tracing::debug!(size, spawn_x = spawn.x, spawn_y = spawn.y, "heightfield generated");
        Heightfield {
            terrain,
            surface,
            spawn,
            biomes,
        }
    }

    /// Checks every catalog ore in order. No early exit: the last match wins.
    fn substitute_ore(
        &self,
        base: TileType,
        biome: &BiomeDefinition,
        fields: &[Grid<f32>],
        pos: CellPos,
        h: i32,
    ) -> TileType {
        let depth = h - pos.y;
        let mut tile = base;
        for (i, ore) in self.ores.iter().enumerate() {
            let Some(rule) = biome.ores.get(i) else {
                continue;
            };
            let value = fields[i].value_or(pos.x, pos.y, 0.0);
            if value > rule.threshold && depth > rule.min_depth {
                tile = ore.kind;
            }
        }
        tile
    }
}

/// Surface height of column `x`, clamped to `[0, n]`.
fn surface_height(noise: &NoiseSampler, biome: &BiomeDefinition, x: i32, n: i32) -> i32 {
    let sample = noise.along(f64::from(x), biome.terrain_frequency);
    let height = sample * f64::from(biome.height_multiplier) + f64::from(biome.height_addition);
    height.floor().clamp(0.0, f64::from(n)) as i32
}

/// Soil type `depth` rows below the surface row.
fn soil_layer(biome: &BiomeDefinition, depth: i32) -> TileType {
    let grass = biome.grass_layer_height as i32;
    let dirt = biome.dirt_layer_height as i32;
    if depth < grass {
        TileType::Grass
    } else if depth < grass + dirt || !biome.has_stone {
        TileType::Dirt
    } else {
        TileType::Stone
    }
}

#[inline]
fn in_deep_layer(biome: &BiomeDefinition, depth: i32) -> bool {
    depth >= (biome.grass_layer_height + biome.dirt_layer_height) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeClassifier, ColorGradient};
    use tessaria_core::{BiomeOre, GradientMode};

    fn single_biome(biome: BiomeDefinition) -> BiomeCatalog {
        BiomeCatalog::new(vec![biome]).unwrap()
    }

    #[test]
    fn test_soil_layers() {
        let biome = BiomeDefinition {
            grass_layer_height: 1,
            dirt_layer_height: 3,
            ..BiomeDefinition::default()
        };
        assert_eq!(soil_layer(&biome, 0), TileType::Grass);
        assert_eq!(soil_layer(&biome, 1), TileType::Dirt);
        assert_eq!(soil_layer(&biome, 3), TileType::Dirt);
        assert_eq!(soil_layer(&biome, 4), TileType::Stone);

        let stoneless = BiomeDefinition {
            has_stone: false,
            ..biome
        };
        assert_eq!(soil_layer(&stoneless, 40), TileType::Dirt);
    }

    #[test]
    fn test_last_matching_ore_wins() {
        let biome = BiomeDefinition {
            name: "rich".to_owned(),
            ores: vec![
                BiomeOre { threshold: -1.0, min_depth: 0 },
                BiomeOre { threshold: -1.0, min_depth: 0 },
            ],
            ..BiomeDefinition::default()
        };
        let catalog = single_biome(biome.clone());
        let map = BiomeClassifier::new(
            &catalog,
            ColorGradient::from_catalog(&catalog, GradientMode::Fixed),
            0.01,
        )
        .build_map(8, WorldSeed::new(1));
        let ores = [
            OreDefinition { kind: TileType::Coal, frequency: 0.1 },
            OreDefinition { kind: TileType::Gold, frequency: 0.1 },
            OreDefinition { kind: TileType::Diamond, frequency: 0.1 },
        ];
        let settings = GenerationSettings::default();
        let generator = HeightfieldGenerator::new(&catalog, &map, &ores, &settings);
        let fields = vec![Grid::new(8, 8, 0.5f32); 3];
        let tile = generator.substitute_ore(TileType::Stone, &biome, &fields, CellPos::new(1, 1), 6);
        // Diamond has no rule in this biome and is skipped.
        assert_eq!(tile, TileType::Gold);

        let shallow = generator.substitute_ore(TileType::Stone, &biome, &fields, CellPos::new(1, 6), 6);
        assert_eq!(shallow, TileType::Stone);
    }

    #[test]
    fn test_caves_never_touch_surface_row() {
        let biome = BiomeDefinition {
            name: "holey".to_owned(),
            generate_caves: true,
            surface_value: 2.0,
            ..BiomeDefinition::default()
        };
        let catalog = single_biome(biome);
        let map = BiomeClassifier::new(
            &catalog,
            ColorGradient::from_catalog(&catalog, GradientMode::Fixed),
            0.01,
        )
        .build_map(160, WorldSeed::new(5));
        let settings = GenerationSettings::default();
        let field = HeightfieldGenerator::new(&catalog, &map, &[], &settings).generate(WorldSeed::new(5));
        for x in 0..160 {
            let h = field.surface[x as usize];
            if h > 0 {
                assert_eq!(field.terrain.tile_type(CellPos::new(x, h - 1)), TileType::Grass);
            }
            for y in 0..h - 1 {
                let pos = CellPos::new(x, y);
                assert_eq!(field.terrain.tile_type(pos), TileType::Wall);
                assert!(field.terrain.has_wall(pos));
            }
        }
    }
}
