//! # World Configuration
//!
//! The TOML world document: seed, dimensions, generation/lighting/edit
//! tuning, the global ore catalog, the biome catalog and the tile templates.
//!
//! Every section is optional and falls back to the built-in defaults, so the
//! smallest valid document is empty. Lists replace their default wholesale:
//! a document with one `[[biomes]]` entry describes a one-biome world.
//!
//! ```toml
//! seed = 42
//! world_size = 128
//!
//! [lighting]
//! radius = 9
//!
//! [[biomes]]
//! name = "grassland"
//! color = [90, 180, 60]
//! height_multiplier = 15.0
//! height_addition = 25.0
//! ```
//!
//! Loading always ends with [`WorldConfig::validate`]; the engine never sees
//! an invalid document.

// Negated float comparisons below also reject NaN.
#![allow(clippy::neg_cmp_op_on_partial_ord)]

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::sprite::{standard_templates, TileAtlas, TileTemplate};
use crate::tile::TileType;

/// Top-level world document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Master seed. Every noise field and random stream derives from it.
    pub seed: u64,
    /// Side length of the square world, in cells.
    pub world_size: usize,
    /// Width of one chunk column, in cells.
    pub chunk_size: usize,
    /// Extra distance (cells) beyond the camera half-extent that keeps chunks active.
    pub activation_buffer: f32,
    /// Terrain generation tuning.
    pub generation: GenerationSettings,
    /// Light engine tuning.
    pub lighting: LightingSettings,
    /// Edit controller tuning.
    pub edit: EditSettings,
    /// Global ore catalog, in substitution order.
    pub ores: Vec<OreDefinition>,
    /// Biome catalog. The first entry is the default biome.
    pub biomes: Vec<BiomeDefinition>,
    /// Tile templates.
    pub templates: Vec<TileTemplate>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0x7E55_A21A,
            world_size: 256,
            chunk_size: 16,
            activation_buffer: 8.0,
            generation: GenerationSettings::default(),
            lighting: LightingSettings::default(),
            edit: EditSettings::default(),
            ores: default_ores(),
            biomes: default_biomes(),
            templates: standard_templates(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and any validation error.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`WorldConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every cross-field rule of the document.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.world_size == 0 {
            return Err(ConfigError::invalid("world_size", "must be greater than zero"));
        }
        if self.world_size > i32::MAX as usize / 2 {
            return Err(ConfigError::invalid("world_size", "too large"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid("chunk_size", "must be greater than zero"));
        }
        if !(self.activation_buffer >= 0.0) {
            return Err(ConfigError::invalid("activation_buffer", "must be non-negative"));
        }
        self.generation.validate()?;
        self.lighting.validate()?;
        if self.edit.cluster_search_radius < 1 {
            return Err(ConfigError::invalid("edit.cluster_search_radius", "must be at least 1"));
        }

        for (i, ore) in self.ores.iter().enumerate() {
            if !ore.kind.is_ore() {
                return Err(ConfigError::invalid(
                    format!("ores[{i}].kind"),
                    format!("`{}` is not an ore", ore.kind.name()),
                ));
            }
            if !(ore.frequency > 0.0) {
                return Err(ConfigError::invalid(format!("ores[{i}].frequency"), "must be positive"));
            }
        }

        if self.biomes.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut names = HashSet::new();
        let mut colors: HashMap<u32, &str> = HashMap::new();
        for (i, biome) in self.biomes.iter().enumerate() {
            biome.validate(i)?;
            if !names.insert(biome.name.as_str()) {
                return Err(ConfigError::DuplicateBiome(biome.name.clone()));
            }
            if let Some(first) = colors.insert(biome.color_key(), &biome.name) {
                return Err(ConfigError::DuplicateColor {
                    color: biome.color_key(),
                    first: first.to_owned(),
                    second: biome.name.clone(),
                });
            }
        }

        let atlas = TileAtlas::new(self.templates.clone());
        let generated = [
            TileType::Grass,
            TileType::Dirt,
            TileType::Stone,
            TileType::Wall,
            TileType::Tree,
            TileType::Cactus,
            TileType::SmallGrass,
            TileType::Flower,
        ];
        for tile in generated
            .into_iter()
            .chain(self.ores.iter().map(|ore| ore.kind))
        {
            if atlas.template_for(tile).is_none() {
                return Err(ConfigError::MissingTemplate(tile.name().to_owned()));
            }
        }
        Ok(())
    }
}

/// How a noise sample is turned into a biome color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMode {
    /// Step to the first stop at or above the sample. Only catalog colors appear.
    #[default]
    Fixed,
    /// Interpolate between neighboring stops.
    Blend,
}

/// What a biome lookup does when the stored color matches no biome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeLookup {
    /// A miss is "no biome"; callers use the default biome.
    #[default]
    Exact,
    /// A miss keeps the biome last resolved through the same context.
    FallbackToPrevious,
}

/// One key of the biome color gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position in `[0, 1]`.
    pub at: f32,
    /// Color at this position.
    pub color: [u8; 3],
}

/// Terrain generation tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Frequency of the biome noise.
    pub biome_frequency: f64,
    /// Frequency of the global cave noise.
    pub cave_frequency: f64,
    /// Rows above the surface at which the player spawns.
    pub spawn_offset: i32,
    /// Biome color gradient. Empty means "one evenly spaced stop per biome".
    pub gradient: Vec<GradientStop>,
    /// Gradient sampling mode.
    pub gradient_mode: GradientMode,
    /// Biome lookup mode.
    pub biome_lookup: BiomeLookup,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            biome_frequency: 0.01,
            cave_frequency: 0.08,
            spawn_offset: 2,
            gradient: Vec::new(),
            gradient_mode: GradientMode::Fixed,
            biome_lookup: BiomeLookup::Exact,
        }
    }
}

impl GenerationSettings {
    fn validate(&self) -> ConfigResult<()> {
        if !(self.biome_frequency > 0.0) {
            return Err(ConfigError::invalid("generation.biome_frequency", "must be positive"));
        }
        if !(self.cave_frequency > 0.0) {
            return Err(ConfigError::invalid("generation.cave_frequency", "must be positive"));
        }
        let mut previous = 0.0f32;
        for (i, stop) in self.gradient.iter().enumerate() {
            if !(0.0..=1.0).contains(&stop.at) {
                return Err(ConfigError::invalid(
                    format!("generation.gradient[{i}].at"),
                    "must lie within [0, 1]",
                ));
            }
            if stop.at < previous {
                return Err(ConfigError::invalid(
                    format!("generation.gradient[{i}].at"),
                    "stops must be sorted",
                ));
            }
            previous = stop.at;
        }
        Ok(())
    }
}

/// Light engine tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    /// Maximum propagation and retraction depth, in cells.
    pub radius: u32,
    /// Per-step decay through open cells.
    pub air_decay: f32,
    /// Per-step decay through solid cells.
    pub ground_decay: f32,
    /// Multiplier applied to writes into background-wall cells.
    pub wall_boost: f32,
    /// Intensity of sky sources.
    pub sky_intensity: f32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            radius: 7,
            air_decay: 0.85,
            ground_decay: 0.7,
            wall_boost: 1.1,
            sky_intensity: 1.0,
        }
    }
}

impl LightingSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.radius < 1 {
            return Err(ConfigError::invalid("lighting.radius", "must be at least 1"));
        }
        for (field, decay) in [
            ("lighting.air_decay", self.air_decay),
            ("lighting.ground_decay", self.ground_decay),
        ] {
            if !(decay > 0.0 && decay <= 1.0) {
                return Err(ConfigError::invalid(field, "must lie within (0, 1]"));
            }
        }
        if !(self.wall_boost > 0.0) {
            return Err(ConfigError::invalid("lighting.wall_boost", "must be positive"));
        }
        if !(self.sky_intensity > 0.0 && self.sky_intensity <= 1.0) {
            return Err(ConfigError::invalid("lighting.sky_intensity", "must lie within (0, 1]"));
        }
        Ok(())
    }
}

/// Edit controller tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Maximum distance from the removed cell a cluster count may reach.
    pub cluster_search_radius: i32,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            cluster_search_radius: 16,
        }
    }
}

/// One entry of the global ore catalog.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreDefinition {
    /// Ore tile type.
    pub kind: TileType,
    /// Frequency of this ore's noise field.
    pub frequency: f64,
}

/// The default ore catalog: Coal, Iron, Copper, Silver, Gold, Diamond.
#[must_use]
pub fn default_ores() -> Vec<OreDefinition> {
    let frequencies = [0.12, 0.11, 0.11, 0.1, 0.09, 0.08];
    TileType::ORES
        .into_iter()
        .zip(frequencies)
        .map(|(kind, frequency)| OreDefinition { kind, frequency })
        .collect()
}

/// Coarse biome family, consumed by ambiance and music collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeCategory {
    /// Wooded biomes.
    Forest,
    /// Arid biomes.
    Desert,
    /// Frozen biomes. Trees grow bald.
    Snow,
    /// Anything else.
    Generic,
    /// No biome (out-of-bounds queries).
    None,
}

impl BiomeCategory {
    /// Infers a category from a biome name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("forest") {
            Self::Forest
        } else if name.contains("desert") {
            Self::Desert
        } else if name.contains("snow") || name.contains("tundra") {
            Self::Snow
        } else {
            Self::Generic
        }
    }
}

/// What a biome grows in the "large growth" interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthKind {
    /// Branching trees.
    #[default]
    Tree,
    /// Cacti.
    Cactus,
    /// Nothing.
    None,
}

/// Per-grass-cell feature probabilities, consumed in field order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureChances {
    /// Grass tuft.
    pub small_grass: f32,
    /// Flower.
    pub flower: f32,
    /// Sunflower.
    pub sunflower: f32,
    /// Short unbranched tree.
    pub small_tree: f32,
    /// Tree or cactus, per [`BiomeDefinition::large_growth`].
    pub large_growth: f32,
}

impl Default for FeatureChances {
    fn default() -> Self {
        Self {
            small_grass: 0.2,
            flower: 0.05,
            sunflower: 0.0,
            small_tree: 0.03,
            large_growth: 0.06,
        }
    }
}

impl FeatureChances {
    /// The chances in draw order.
    #[must_use]
    pub const fn ordered(&self) -> [f32; 5] {
        [
            self.small_grass,
            self.flower,
            self.sunflower,
            self.small_tree,
            self.large_growth,
        ]
    }
}

/// Shape parameters for trees and cacti.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    /// Minimum trunk height of a large growth.
    pub min_height: u32,
    /// Maximum trunk height of a large growth.
    pub max_height: u32,
    /// Minimum trunk height of a small tree.
    pub small_min_height: u32,
    /// Maximum trunk height of a small tree.
    pub small_max_height: u32,
    /// Chance per eligible row and side to start a branch.
    pub branch_chance: f32,
    /// Minimum rows between two branches on the same side.
    pub branch_spacing: u32,
    /// Branch budget per side.
    pub max_branches_per_side: u32,
    /// Longest filler run of a branch.
    pub max_branch_length: u32,
    /// Chance that a tree has no side canopy.
    pub bald_chance: f32,
    /// Minimum columns between consecutive large growths.
    pub min_spacing: i32,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            min_height: 5,
            max_height: 10,
            small_min_height: 2,
            small_max_height: 3,
            branch_chance: 0.3,
            branch_spacing: 2,
            max_branches_per_side: 3,
            max_branch_length: 2,
            bald_chance: 0.3,
            min_spacing: 4,
        }
    }
}

/// Per-biome ore rule, matched to the global catalog by index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeOre {
    /// Ore-field value that must be exceeded.
    pub threshold: f32,
    /// Depth below the surface (`h - y`) that must be exceeded.
    pub min_depth: i32,
}

/// One biome of the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeDefinition {
    /// Unique name.
    pub name: String,
    /// Unique color key in the biome raster.
    pub color: [u8; 3],
    /// Explicit category. Inferred from the name when absent.
    pub category: Option<BiomeCategory>,
    /// Scale of the surface noise.
    pub height_multiplier: f32,
    /// Base surface height.
    pub height_addition: f32,
    /// Frequency of the surface noise.
    pub terrain_frequency: f64,
    /// Grass rows below the surface row, counting the surface.
    pub grass_layer_height: u32,
    /// Dirt rows below the grass.
    pub dirt_layer_height: u32,
    /// Stone below the dirt; without it the dirt continues down.
    pub has_stone: bool,
    /// Whether caves are carved.
    pub generate_caves: bool,
    /// Cave-noise value at or below which a cell becomes a cave.
    pub surface_value: f32,
    /// Feature probabilities.
    pub chances: FeatureChances,
    /// What the large-growth interval grows.
    pub large_growth: GrowthKind,
    /// Tree and cactus shape.
    pub tree: TreeSettings,
    /// Ore rules, indexed like the global ore catalog.
    pub ores: Vec<BiomeOre>,
}

impl Default for BiomeDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: [0, 0, 0],
            category: None,
            height_multiplier: 20.0,
            height_addition: 100.0,
            terrain_frequency: 0.02,
            grass_layer_height: 1,
            dirt_layer_height: 6,
            has_stone: true,
            generate_caves: true,
            surface_value: 0.25,
            chances: FeatureChances::default(),
            large_growth: GrowthKind::Tree,
            tree: TreeSettings::default(),
            ores: default_biome_ores(),
        }
    }
}

impl BiomeDefinition {
    /// Color packed as `0x00RRGGBB`.
    #[inline]
    #[must_use]
    pub const fn color_key(&self) -> u32 {
        pack_rgb(self.color)
    }

    /// Resolved category.
    #[must_use]
    pub fn category(&self) -> BiomeCategory {
        self.category
            .unwrap_or_else(|| BiomeCategory::from_name(&self.name))
    }

    fn validate(&self, index: usize) -> ConfigResult<()> {
        let field = |name: &str| format!("biomes[{index}].{name}");
        if self.name.is_empty() {
            return Err(ConfigError::invalid(field("name"), "must not be empty"));
        }
        if !self.height_multiplier.is_finite() || !self.height_addition.is_finite() {
            return Err(ConfigError::invalid(field("height_multiplier"), "must be finite"));
        }
        if !(self.terrain_frequency > 0.0) {
            return Err(ConfigError::invalid(field("terrain_frequency"), "must be positive"));
        }
        let chances = self.chances.ordered();
        if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::invalid(field("chances"), "each chance must lie within [0, 1]"));
        }
        if chances.iter().sum::<f32>() > 1.0 + f32::EPSILON {
            return Err(ConfigError::invalid(field("chances"), "chances must sum to at most 1"));
        }
        let tree = &self.tree;
        if tree.min_height < 1 || tree.min_height > tree.max_height {
            return Err(ConfigError::invalid(field("tree.min_height"), "need 1 <= min_height <= max_height"));
        }
        if tree.small_min_height < 1 || tree.small_min_height > tree.small_max_height {
            return Err(ConfigError::invalid(
                field("tree.small_min_height"),
                "need 1 <= small_min_height <= small_max_height",
            ));
        }
        if tree.max_branch_length < 1 {
            return Err(ConfigError::invalid(field("tree.max_branch_length"), "must be at least 1"));
        }
        Ok(())
    }
}

/// Packs an RGB triple as `0x00RRGGBB`.
#[inline]
#[must_use]
pub const fn pack_rgb(color: [u8; 3]) -> u32 {
    ((color[0] as u32) << 16) | ((color[1] as u32) << 8) | color[2] as u32
}

fn default_biome_ores() -> Vec<BiomeOre> {
    [
        (0.72, 4),
        (0.76, 10),
        (0.76, 8),
        (0.82, 20),
        (0.85, 30),
        (0.9, 45),
    ]
    .into_iter()
    .map(|(threshold, min_depth)| BiomeOre {
        threshold,
        min_depth,
    })
    .collect()
}

/// The built-in catalog: grassland (default), forest, desert and snow.
#[must_use]
pub fn default_biomes() -> Vec<BiomeDefinition> {
    vec![
        BiomeDefinition {
            name: "grassland".to_owned(),
            color: [90, 180, 60],
            height_multiplier: 20.0,
            height_addition: 110.0,
            chances: FeatureChances {
                small_grass: 0.3,
                flower: 0.1,
                sunflower: 0.03,
                small_tree: 0.04,
                large_growth: 0.05,
            },
            ..BiomeDefinition::default()
        },
        BiomeDefinition {
            name: "forest".to_owned(),
            color: [30, 110, 40],
            height_multiplier: 26.0,
            height_addition: 112.0,
            dirt_layer_height: 8,
            chances: FeatureChances {
                small_grass: 0.15,
                flower: 0.04,
                sunflower: 0.0,
                small_tree: 0.1,
                large_growth: 0.25,
            },
            tree: TreeSettings {
                max_height: 14,
                branch_chance: 0.4,
                ..TreeSettings::default()
            },
            ..BiomeDefinition::default()
        },
        BiomeDefinition {
            name: "desert".to_owned(),
            color: [220, 200, 120],
            height_multiplier: 10.0,
            height_addition: 108.0,
            dirt_layer_height: 10,
            surface_value: 0.18,
            chances: FeatureChances {
                small_grass: 0.0,
                flower: 0.01,
                sunflower: 0.0,
                small_tree: 0.0,
                large_growth: 0.08,
            },
            large_growth: GrowthKind::Cactus,
            tree: TreeSettings {
                min_height: 3,
                max_height: 6,
                branch_chance: 0.35,
                branch_spacing: 1,
                max_branches_per_side: 2,
                max_branch_length: 1,
                min_spacing: 6,
                ..TreeSettings::default()
            },
            ..BiomeDefinition::default()
        },
        BiomeDefinition {
            name: "snow".to_owned(),
            color: [235, 240, 250],
            height_multiplier: 36.0,
            height_addition: 115.0,
            dirt_layer_height: 4,
            chances: FeatureChances {
                small_grass: 0.05,
                flower: 0.0,
                sunflower: 0.0,
                small_tree: 0.05,
                large_growth: 0.12,
            },
            ..BiomeDefinition::default()
        },
    ]
}
