//! # Configuration Error Types
//!
//! Everything that can be wrong with a world document. The engine itself never
//! fails once a document has been validated.

use thiserror::Error;

/// Errors raised while loading or validating a [`crate::config::WorldConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the schema.
    #[error("failed to parse world config: {0}")]
    Parse(String),

    /// The file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// A field holds a value outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two biomes share the same color key.
    #[error("biomes `{first}` and `{second}` share color #{color:06x}")]
    DuplicateColor {
        /// Packed `0xRRGGBB` color.
        color: u32,
        /// First biome using it.
        first: String,
        /// Second biome using it.
        second: String,
    },

    /// Two biomes share the same name.
    #[error("duplicate biome name `{0}`")]
    DuplicateBiome(String),

    /// The biome catalog is empty.
    #[error("biome catalog is empty")]
    EmptyCatalog,

    /// A generated tile type has no template.
    #[error("no tile template for `{0}`")]
    MissingTemplate(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidField`].
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
