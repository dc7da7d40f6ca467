//! # TESSARIA Procedural Generation
//!
//! Deterministic generation of a finite, square 2D tile world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and catalogs always produce the same world
//! 2. **Leaf-first**: Biomes feed the heightfield, the heightfield feeds flora
//! 3. **No hidden state**: Scan state travels in an explicit [`BiomeContext`]
//!
//! ## Core Components
//!
//! - `SimplexNoise` / `NoiseSampler`: seeded `[0, 1]` noise fields
//! - `BiomeClassifier`: builds the biome raster
//! - `HeightfieldGenerator`: surface, soil, ores and caves
//! - `AutoTiler`: bitmask sprite resolution
//! - `FeaturePlacer`: flora, trees and cacti
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessaria_procedural::{BiomeCatalog, BiomeClassifier, ColorGradient, HeightfieldGenerator, WorldSeed};
//!
//! let catalog = BiomeCatalog::new(config.biomes.clone())?;
//! let gradient = ColorGradient::from_catalog(&catalog, config.generation.gradient_mode);
//! let map = BiomeClassifier::new(&catalog, gradient, 0.01).build_map(256, WorldSeed::new(42));
//! let field = HeightfieldGenerator::new(&catalog, &map, &config.ores, &config.generation)
//!     .generate(WorldSeed::new(42));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod autotile;
pub mod biome;
pub mod flora;
pub mod heightfield;
pub mod noise;

pub use autotile::{neighbor_mask, variant_for, AutoTiler};
pub use biome::{BiomeCatalog, BiomeClassifier, BiomeContext, BiomeId, BiomeMap, ColorGradient};
pub use flora::{FeaturePlacer, PlacedSegment};
pub use heightfield::{Heightfield, HeightfieldGenerator};
pub use noise::{purpose, NoiseSampler, SimplexNoise, WorldSeed};
