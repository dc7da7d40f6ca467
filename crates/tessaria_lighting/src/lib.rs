//! # TESSARIA Lighting
//!
//! Per-cell light intensities for the tile world, kept up to date as tiles
//! are placed and removed.
//!
//! ## Design Principles
//!
//! 1. **Bounded**: Relaxation stops at the light radius
//! 2. **Batched**: Edits queue up and drain once per tick
//! 3. **Exact commits**: A drain reports exactly the cells that changed
//!
//! ## Core Components
//!
//! - `SkylightMask`: which cells see the sky
//! - `LightField`: the `f32` buffer handed to the renderer
//! - `LightEngine`: relaxation, retraction, lasting emitters and the edit queue
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessaria_lighting::{seed_initial_light, LightContext, LightEdit, LightEngine, LightField, SkylightMask};
//!
//! let skylight = SkylightMask::from_terrain(&terrain);
//! let mut engine = LightEngine::new(&config.lighting);
//! let mut field = LightField::new(terrain.size());
//! seed_initial_light(&engine, &mut field, &terrain, &skylight);
//!
//! engine.enqueue(LightEdit::Block(pos));
//! let commit = engine.drain(&mut field, &LightContext::new(&terrain, &skylight));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod light;
pub mod skylight;

pub use light::{CellRect, LightCommit, LightContext, LightEdit, LightEngine, LightField};
pub use skylight::{seed_initial_light, SkylightMask};
