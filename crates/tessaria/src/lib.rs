//! # TESSARIA
//!
//! The world crate: generation, runtime edits and per-tick upkeep of a 2D
//! tile world, built on the core, procedural and lighting crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          World                               │
//! │                                                              │
//! │  tessaria_procedural      tessaria_lighting                  │
//! │  ┌───────────────────┐    ┌──────────────────────┐           │
//! │  │ biomes, terrain,  │    │ skylight, light      │           │
//! │  │ flora, auto-tiles │    │ field, edit queue    │           │
//! │  └─────────┬─────────┘    └──────────┬───────────┘           │
//! │            │                         │                       │
//! │            v                         v                       │
//! │  ┌──────────────────────────────────────────────┐            │
//! │  │ TileEditController: place / remove           │            │
//! │  │ metadata + drops, occupancy, chunks          │            │
//! │  └──────────────────────────────────────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Architecture Rules
//!
//! 1. **One writer**: Runtime edits go through `TileEditController`
//! 2. **All or nothing**: A rejected edit changes nothing
//! 3. **Tick-driven light**: Edits queue light work; `World::tick` drains it
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessaria::{CameraView, World};
//! use tessaria_core::{TileTag, TileType, WorldConfig};
//!
//! let mut world = World::generate(WorldConfig::default())?;
//! let spawn = world.spawn_point();
//! let wall = world.atlas().template_for(TileType::Wall).unwrap();
//! world.place(spawn.x, spawn.y, wall, TileType::Wall, TileTag::Wall);
//! let report = world.tick(CameraView { center_x: spawn.x as f32, half_extent: 40.0 });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod edit;
pub mod error;
pub mod metadata;
pub mod world;

pub use chunk::{CameraView, Chunk, ChunkManager, ChunkToggle, TileKey};
pub use edit::TileEditController;
pub use error::{EditError, EditResult, WorldError, WorldResult};
pub use metadata::{ItemDrop, ItemDropFactory, MetadataStore, Occupancy, TileMetadata};
pub use world::{TickReport, World};
