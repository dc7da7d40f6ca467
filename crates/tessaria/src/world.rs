//! # World
//!
//! Owns every piece of world state and exposes the query and edit surface the
//! rest of the game consumes.
//!
//! ## Generation Order
//!
//! ```text
//! validate config
//!   └─> biome catalog + tile atlas
//!         └─> biome raster ─> heightfield ─> features
//!               └─> metadata, occupancy, chunks, sprites
//!                     └─> skylight ─> initial light
//! ```
//!
//! ## Ticking
//!
//! Edits only queue light work. [`World::tick`] drains the queue once and
//! recomputes chunk activation, returning both results.

use std::collections::HashMap;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessaria_core::{
    BiomeCategory, BiomeDefinition, CellPos, ConfigError, Grid, Layer, SpriteLayers, SpriteRef,
    TemplateId, TerrainGrid, TileAtlas, TileTag, TileType, WorldConfig,
};
use tessaria_lighting::{
    seed_initial_light, LightCommit, LightContext, LightEngine, LightField, SkylightMask,
};
use tessaria_procedural::{
    purpose, AutoTiler, BiomeCatalog, BiomeClassifier, BiomeId, BiomeMap, ColorGradient,
    FeaturePlacer, HeightfieldGenerator, WorldSeed,
};

use crate::chunk::{CameraView, ChunkManager, ChunkToggle, TileKey};
use crate::edit::TileEditController;
use crate::error::{EditResult, WorldResult};
use crate::metadata::{ItemDrop, ItemDropFactory, MetadataStore, Occupancy, TileMetadata};

/// What one [`World::tick`] changed.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Light cells changed by the drained edits.
    pub light: LightCommit,
    /// Chunks whose activation flipped.
    pub toggles: Vec<ChunkToggle>,
}

/// A generated world and its live state.
pub struct World {
    config: WorldConfig,
    catalog: BiomeCatalog,
    atlas: TileAtlas,
    biome_map: BiomeMap,
    biomes: Grid<BiomeId>,
    surface: Vec<i32>,
    spawn: CellPos,
    terrain: TerrainGrid,
    sprites: SpriteLayers,
    occupancy: Occupancy,
    chunks: ChunkManager,
    metadata: MetadataStore,
    skylight: SkylightMask,
    light: LightEngine,
    field: LightField,
    rng: ChaCha8Rng,
    drops: Vec<ItemDrop>,
}

impl World {
    /// Generates a world from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn generate(config: WorldConfig) -> WorldResult<Self> {
        config.validate()?;
        let seed = WorldSeed::new(config.seed);
        let size = config.world_size;

        let catalog = BiomeCatalog::new(config.biomes.clone())?;
        let atlas = TileAtlas::new(config.templates.clone());

        let gradient = ColorGradient::from_settings(&config.generation, &catalog);
        let biome_map = BiomeClassifier::new(&catalog, gradient, config.generation.biome_frequency)
            .build_map(size, seed);
        let heightfield =
            HeightfieldGenerator::new(&catalog, &biome_map, &config.ores, &config.generation)
                .generate(seed);
        let mut terrain = heightfield.terrain;

        let mut feature_rng = ChaCha8Rng::seed_from_u64(seed.derive(purpose::FEATURES).value());
        let segments =
            FeaturePlacer::new(&catalog, &atlas).place(&mut terrain, &heightfield.biomes, &mut feature_rng);
        let planted: HashMap<CellPos, (SpriteRef, BiomeId)> = segments
            .iter()
            .map(|segment| (segment.pos, (segment.sprite, segment.biome)))
            .collect();

        let chunks = ChunkManager::partition(size, config.chunk_size)
            .ok_or_else(|| ConfigError::invalid("chunk_size", "must be greater than zero"))?;
        let mut world = Self {
            skylight: SkylightMask::from_terrain(&terrain),
            light: LightEngine::new(&config.lighting),
            field: LightField::new(size),
            rng: ChaCha8Rng::seed_from_u64(seed.derive(purpose::SPRITES).value()),
            sprites: SpriteLayers::new(size),
            occupancy: Occupancy::new(),
            metadata: MetadataStore::new(),
            drops: Vec::new(),
            surface: heightfield.surface,
            spawn: heightfield.spawn,
            biomes: heightfield.biomes,
            terrain,
            chunks,
            biome_map,
            atlas,
            catalog,
            config,
        };
        world.register_generated(&planted)?;

        seed_initial_light(&world.light, &mut world.field, &world.terrain, &world.skylight);
        let lit = world.field.take_dirty().cells.len();

        tracing::info!(
            size,
            seed = world.config.seed,
            biomes = world.catalog.len(),
            features = segments.len(),
            tiles = world.metadata.len(),
            lit,
            "world generated"
        );
        Ok(world)
    }

    /// Loads a TOML config file and generates its world.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_toml_file(path: impl AsRef<Path>) -> WorldResult<Self> {
        Self::generate(WorldConfig::from_toml_file(path)?)
    }

    /// Records metadata, occupancy, chunk membership and sprites for every
    /// occupied cell of a freshly generated terrain.
    fn register_generated(
        &mut self,
        planted: &HashMap<CellPos, (SpriteRef, BiomeId)>,
    ) -> WorldResult<()> {
        let tiler = AutoTiler::new(&self.atlas);
        let cells: Vec<(CellPos, TileType)> = self.terrain.types().iter().map(|(p, &t)| (p, t)).collect();

        for (pos, tile) in cells {
            let planted_here = planted.get(&pos).copied();
            let biome_id = planted_here.map_or_else(
                || self.biomes.value_or(pos.x, pos.y, self.catalog.default_id()),
                |(_, biome)| biome,
            );
            let biome_name = &self.catalog.get_or_default(biome_id).name;

            if tile.occupies_foreground() {
                let sprite = match planted_here {
                    Some((sprite, _)) => Some(sprite),
                    None => {
                        let template = self.template_for(tile)?;
                        tiler.resolve_sprite(&self.terrain, pos, template, tile, Layer::Foreground, &mut self.rng)
                    }
                };
                let template = match sprite {
                    Some(sprite) => sprite.template,
                    None => self.template_for(tile)?,
                };
                self.sprites.set(Layer::Foreground, pos, sprite);
                let key = TileKey::new(pos, Layer::Foreground);
                self.occupancy.insert(Layer::Foreground, pos);
                self.chunks.insert(key);
                self.metadata.insert(
                    key,
                    TileMetadata {
                        template,
                        tile_type: tile,
                        biome: biome_name.clone(),
                        player_placed: false,
                    },
                );
            }

            if self.terrain.has_wall(pos) {
                let template = self.template_for(TileType::Wall)?;
                let sprite = tiler.resolve_sprite(
                    &self.terrain,
                    pos,
                    template,
                    TileType::Wall,
                    Layer::Background,
                    &mut self.rng,
                );
                self.sprites.set(Layer::Background, pos, sprite);
                let key = TileKey::new(pos, Layer::Background);
                self.occupancy.insert(Layer::Background, pos);
                self.chunks.insert(key);
                self.metadata.insert(
                    key,
                    TileMetadata {
                        template,
                        tile_type: TileType::Wall,
                        biome: biome_name.clone(),
                        player_placed: false,
                    },
                );
            }
        }
        Ok(())
    }

    fn template_for(&self, tile: TileType) -> WorldResult<TemplateId> {
        self.atlas
            .template_for(tile)
            .ok_or_else(|| ConfigError::MissingTemplate(tile.name().to_owned()).into())
    }

    fn editor(&mut self) -> TileEditController<'_> {
        TileEditController {
            terrain: &mut self.terrain,
            sprites: &mut self.sprites,
            occupancy: &mut self.occupancy,
            chunks: &mut self.chunks,
            metadata: &mut self.metadata,
            skylight: &mut self.skylight,
            light: &mut self.light,
            rng: &mut self.rng,
            atlas: &self.atlas,
            cluster_radius: self.config.edit.cluster_search_radius,
        }
    }

    // -- Queries --------------------------------------------------------------

    /// Edge length of the world.
    #[must_use]
    pub fn size(&self) -> usize {
        self.terrain.size()
    }

    /// Terrain type at a cell; Air out of bounds.
    #[must_use]
    pub fn tile_type(&self, x: i32, y: i32) -> TileType {
        self.terrain.tile_type(CellPos::new(x, y))
    }

    /// Biome id at a cell.
    #[must_use]
    pub fn biome_id(&self, x: i32, y: i32) -> Option<BiomeId> {
        self.biomes.get(x, y).copied()
    }

    /// Biome definition at a cell.
    #[must_use]
    pub fn biome(&self, x: i32, y: i32) -> Option<&BiomeDefinition> {
        self.biome_id(x, y).and_then(|id| self.catalog.get(id))
    }

    /// Coarse biome category at a cell; `None` out of bounds.
    #[must_use]
    pub fn biome_category(&self, x: i32, y: i32) -> BiomeCategory {
        self.biome_id(x, y)
            .map_or(BiomeCategory::None, |id| self.catalog.category(id))
    }

    /// Returns true if the cell has a background wall.
    #[must_use]
    pub fn is_wall_at(&self, x: i32, y: i32) -> bool {
        self.terrain.has_wall(CellPos::new(x, y))
    }

    /// Light intensity at a cell; 0.0 out of bounds.
    #[must_use]
    pub fn light_at(&self, x: i32, y: i32) -> f32 {
        self.field.get(CellPos::new(x, y))
    }

    /// Returns true if the cell sees the sky.
    #[must_use]
    pub fn is_sky_lit(&self, x: i32, y: i32) -> bool {
        self.skylight.is_lit(CellPos::new(x, y))
    }

    /// Resolved sprite of a cell layer.
    #[must_use]
    pub fn sprite_at(&self, layer: Layer, x: i32, y: i32) -> Option<SpriteRef> {
        self.sprites.get(layer, CellPos::new(x, y))
    }

    /// Provenance record of a cell layer.
    #[must_use]
    pub fn metadata_at(&self, layer: Layer, x: i32, y: i32) -> Option<&TileMetadata> {
        self.metadata.get(TileKey::new(CellPos::new(x, y), layer))
    }

    /// Where the player starts.
    #[must_use]
    pub const fn spawn_point(&self) -> CellPos {
        self.spawn
    }

    /// Generated surface height of column `x`: rows below it were filled.
    #[must_use]
    pub fn surface_height(&self, x: i32) -> Option<i32> {
        usize::try_from(x).ok().and_then(|x| self.surface.get(x).copied())
    }

    /// The configuration this world was built from.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Biome catalog.
    #[must_use]
    pub const fn catalog(&self) -> &BiomeCatalog {
        &self.catalog
    }

    /// Tile template atlas.
    #[must_use]
    pub const fn atlas(&self) -> &TileAtlas {
        &self.atlas
    }

    /// Biome color raster.
    #[must_use]
    pub const fn biome_map(&self) -> &BiomeMap {
        &self.biome_map
    }

    /// Terrain grid.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// Chunk partition.
    #[must_use]
    pub const fn chunks(&self) -> &ChunkManager {
        &self.chunks
    }

    /// Occupied cells per layer.
    #[must_use]
    pub const fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Skylight mask.
    #[must_use]
    pub const fn skylight(&self) -> &SkylightMask {
        &self.skylight
    }

    /// Number of light edits waiting for the next tick.
    #[must_use]
    pub fn pending_light(&self) -> usize {
        self.light.pending()
    }

    /// The light buffer as bytes, row-major `f32`.
    #[must_use]
    pub fn light_bytes(&self) -> &[u8] {
        self.field.as_bytes()
    }

    // -- Edits ----------------------------------------------------------------

    /// Places a tile, recording the biome of the target cell as its origin.
    ///
    /// # Errors
    ///
    /// See [`TileEditController::try_place`].
    pub fn try_place(
        &mut self,
        x: i32,
        y: i32,
        template: TemplateId,
        tile: TileType,
        tag: TileTag,
    ) -> EditResult<()> {
        let biome = self.biome(x, y).map(|b| b.name.clone()).unwrap_or_default();
        self.editor()
            .try_place(CellPos::new(x, y), template, tile, tag, &biome)
    }

    /// Boolean form of [`World::try_place`].
    pub fn place(&mut self, x: i32, y: i32, template: TemplateId, tile: TileType, tag: TileTag) -> bool {
        let biome = self.biome(x, y).map(|b| b.name.clone()).unwrap_or_default();
        self.editor()
            .place(CellPos::new(x, y), template, tile, tag, &biome)
    }

    /// Removes a tile, delivering its drop to `drops`.
    ///
    /// # Errors
    ///
    /// See [`TileEditController::try_remove`].
    pub fn try_remove_into<F: ItemDropFactory + ?Sized>(
        &mut self,
        x: i32,
        y: i32,
        tag: TileTag,
        drops: &mut F,
    ) -> EditResult<u32> {
        self.editor().try_remove(CellPos::new(x, y), tag, drops)
    }

    /// Removes a tile, buffering its drop until [`World::take_drops`].
    ///
    /// # Errors
    ///
    /// See [`TileEditController::try_remove`].
    pub fn try_remove(&mut self, x: i32, y: i32, tag: TileTag) -> EditResult<u32> {
        let mut drops = std::mem::take(&mut self.drops);
        let result = self.try_remove_into(x, y, tag, &mut drops);
        self.drops = drops;
        result
    }

    /// Boolean form of [`World::try_remove`].
    pub fn remove(&mut self, x: i32, y: i32, tag: TileTag) -> bool {
        let mut drops = std::mem::take(&mut self.drops);
        let removed = self.editor().remove(CellPos::new(x, y), tag, &mut drops);
        self.drops = drops;
        removed
    }

    /// Drops buffered by [`World::remove`] since the last call.
    pub fn take_drops(&mut self) -> Vec<ItemDrop> {
        std::mem::take(&mut self.drops)
    }

    // -- Tick -----------------------------------------------------------------

    /// Drains queued light edits and updates chunk activation.
    pub fn tick(&mut self, camera: CameraView) -> TickReport {
        let ctx = LightContext::new(&self.terrain, &self.skylight);
        let light = self.light.drain(&mut self.field, &ctx);
        let toggles = self
            .chunks
            .update_activation(camera, self.config.activation_buffer);
        TickReport { light, toggles }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("size", &self.size())
            .field("seed", &self.config.seed)
            .field("biomes", &self.catalog.len())
            .field("tiles", &self.metadata.len())
            .field("pending_light", &self.light.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tall enough for open sky above the default biomes.
    fn small_config() -> WorldConfig {
        WorldConfig {
            world_size: 160,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_generate_registers_every_occupied_cell() {
        let world = World::generate(small_config()).unwrap();
        for (pos, &tile) in world.terrain().types().iter() {
            let key = TileKey::new(pos, Layer::Foreground);
            assert_eq!(tile.occupies_foreground(), world.metadata.get(key).is_some(), "{pos:?}");
            assert_eq!(tile.occupies_foreground(), world.chunks.contains(key), "{pos:?}");
            if world.terrain().has_wall(pos) {
                assert!(world.occupancy.is_occupied(Layer::Background, pos));
            }
        }
        assert_eq!(world.pending_light(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = WorldConfig {
            chunk_size: 0,
            ..small_config()
        };
        assert!(World::generate(config).is_err());
    }

    #[test]
    fn test_out_of_bounds_queries_are_sentinels() {
        let world = World::generate(small_config()).unwrap();
        assert_eq!(world.tile_type(-1, 0), TileType::Air);
        assert_eq!(world.light_at(160, 0), 0.0);
        assert!(!world.is_wall_at(0, 999));
        assert_eq!(world.biome_category(-5, -5), BiomeCategory::None);
        assert!(world.biome(160, 160).is_none());
        assert!(world.surface_height(-1).is_none());
        assert_eq!(world.light_bytes().len(), 160 * 160 * 4);
    }

    #[test]
    fn test_sky_is_full_bright_after_generation() {
        let world = World::generate(small_config()).unwrap();
        assert!((world.light_at(10, 159) - 1.0).abs() < f32::EPSILON);
    }
}
