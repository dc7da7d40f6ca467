//! # World Error Types
//!
//! Edit rejections and world construction failures.

use tessaria_core::{ConfigError, Layer, TemplateId, TileTag, TileType};
use thiserror::Error;

/// Reasons a place or remove request is rejected. A rejected edit mutates nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The target cell lies outside the world.
    #[error("cell ({x}, {y}) is outside the world")]
    OutOfBounds {
        /// Requested x.
        x: i32,
        /// Requested y.
        y: i32,
    },

    /// The targeted layer already holds a tile.
    #[error("cell ({x}, {y}) is occupied on the {layer:?} layer")]
    Occupied {
        /// Requested x.
        x: i32,
        /// Requested y.
        y: i32,
        /// The occupied layer.
        layer: Layer,
    },

    /// The tag does not describe the tile type.
    #[error("tag {tag:?} does not match tile {tile:?}")]
    TagMismatch {
        /// The tile involved.
        tile: TileType,
        /// The requested tag.
        tag: TileTag,
    },

    /// The template id is not in the atlas.
    #[error("unknown tile template {0:?}")]
    UnknownTemplate(TemplateId),

    /// Nothing matching the tag occupies the cell.
    #[error("no {tag:?} tile at ({x}, {y})")]
    Empty {
        /// Requested x.
        x: i32,
        /// Requested y.
        y: i32,
        /// The requested tag.
        tag: TileTag,
    },
}

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// Errors raised while building a world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for world construction.
pub type WorldResult<T> = Result<T, WorldError>;
