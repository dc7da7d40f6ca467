//! # TESSARIA Core
//!
//! Shared data model of the 2D tile world:
//! - Dense, bounds-checked grids and cell coordinates
//! - The closed tile enumeration with its solidity and light-medium rules
//! - The terrain grid (foreground types + background walls)
//! - Tile templates, the atlas and per-layer sprite references
//! - The TOML world document and its validation
//!
//! ## Architecture Rules
//!
//! 1. **Sentinels, not panics** - Out-of-bounds reads return Air / false / None
//! 2. **Validate once** - Configuration is checked at load time, never by the engine
//! 3. **No logic** - Generation and lighting live in their own crates
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessaria_core::{CellPos, TerrainGrid, TileType, WorldConfig};
//!
//! let config = WorldConfig::from_toml_file("data/world.toml")?;
//! let mut terrain = TerrainGrid::new(config.world_size);
//! terrain.set_tile(CellPos::new(3, 0), TileType::Stone);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod grid;
pub mod sprite;
pub mod terrain;
pub mod tile;

pub use config::{
    BiomeCategory, BiomeDefinition, BiomeLookup, BiomeOre, EditSettings, FeatureChances,
    GenerationSettings, GradientMode, GradientStop, GrowthKind, LightingSettings, OreDefinition,
    TreeSettings, WorldConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use grid::{CellPos, DirtyCells, Grid, NEIGHBORS_8};
pub use sprite::{
    CactusPart, SpriteLayers, SpriteRef, TemplateId, TileAtlas, TileTemplate, TreePart,
};
pub use terrain::TerrainGrid;
pub use tile::{Layer, Medium, TileTag, TileType};
