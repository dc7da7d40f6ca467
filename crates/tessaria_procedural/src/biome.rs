//! # Biome Classification
//!
//! A biome raster is built once from seeded noise: each cell's `[0, 1]`
//! sample is pushed through an ordered [`ColorGradient`], and the resulting
//! color is looked up in the catalog's exact-match table.
//!
//! The color raster is kept for renderers and debugging; resolution goes
//! through the per-cell id raster stored next to it, so no color ever has to
//! be decoded twice.
//!
//! ## Lookup Modes
//!
//! - `Exact`: a cell whose color is not a catalog key has no biome.
//! - `FallbackToPrevious`: such a cell inherits the biome last resolved
//!   through the same [`BiomeContext`]. Scan order therefore matters, which is
//!   why the context is explicit and owned by the caller.

use std::collections::HashMap;

use tessaria_core::config::pack_rgb;
use tessaria_core::{
    BiomeCategory, BiomeDefinition, BiomeLookup, ConfigError, ConfigResult, GenerationSettings,
    GradientMode, GradientStop, Grid,
};

use crate::noise::{purpose, NoiseSampler, WorldSeed};

/// Index of a biome in its catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(pub u16);

impl BiomeId {
    /// Position in the catalog.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The biome catalog with its color index.
#[derive(Clone, Debug)]
pub struct BiomeCatalog {
    biomes: Vec<BiomeDefinition>,
    by_color: HashMap<u32, BiomeId>,
}

impl BiomeCatalog {
    /// Indexes a list of biome definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCatalog`] for an empty list and
    /// [`ConfigError::DuplicateColor`] when two biomes share a color key.
    pub fn new(biomes: Vec<BiomeDefinition>) -> ConfigResult<Self> {
        if biomes.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut by_color = HashMap::with_capacity(biomes.len());
        for (i, biome) in biomes.iter().enumerate() {
            let key = biome.color_key();
            if let Some(previous) = by_color.insert(key, BiomeId(i as u16)) {
                return Err(ConfigError::DuplicateColor {
                    color: key,
                    first: biomes[previous.index()].name.clone(),
                    second: biome.name.clone(),
                });
            }
        }
        Ok(Self { biomes, by_color })
    }

    /// The default biome: the first catalog entry.
    #[inline]
    #[must_use]
    pub const fn default_id(&self) -> BiomeId {
        BiomeId(0)
    }

    /// Looks up a biome definition.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BiomeId) -> Option<&BiomeDefinition> {
        self.biomes.get(id.index())
    }

    /// Looks up a biome definition, substituting the default biome for unknown ids.
    #[inline]
    #[must_use]
    pub fn get_or_default(&self, id: BiomeId) -> &BiomeDefinition {
        self.biomes.get(id.index()).unwrap_or(&self.biomes[0])
    }

    /// Exact-match lookup of a packed `0x00RRGGBB` color.
    #[inline]
    #[must_use]
    pub fn by_color(&self, color: u32) -> Option<BiomeId> {
        self.by_color.get(&color).copied()
    }

    /// Looks up a biome by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<BiomeId> {
        self.biomes
            .iter()
            .position(|b| b.name == name)
            .map(|i| BiomeId(i as u16))
    }

    /// Category of a biome; [`BiomeCategory::None`] for unknown ids.
    #[must_use]
    pub fn category(&self, id: BiomeId) -> BiomeCategory {
        self.get(id).map_or(BiomeCategory::None, BiomeDefinition::category)
    }

    /// Number of biomes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Always false: a catalog cannot be empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    /// Iterates `(id, definition)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDefinition)> {
        self.biomes
            .iter()
            .enumerate()
            .map(|(i, b)| (BiomeId(i as u16), b))
    }
}

/// Ordered color stops mapping a `[0, 1]` scalar to a color.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorGradient {
    stops: Vec<GradientStop>,
    mode: GradientMode,
}

impl ColorGradient {
    /// Creates a gradient from stops sorted by position.
    #[must_use]
    pub fn new(stops: Vec<GradientStop>, mode: GradientMode) -> Self {
        Self { stops, mode }
    }

    /// One evenly spaced stop per biome, in catalog order, ending at 1.0.
    #[must_use]
    pub fn from_catalog(catalog: &BiomeCatalog, mode: GradientMode) -> Self {
        let count = catalog.len() as f32;
        let stops = catalog
            .iter()
            .map(|(id, biome)| GradientStop {
                at: (id.index() + 1) as f32 / count,
                color: biome.color,
            })
            .collect();
        Self { stops, mode }
    }

    /// The configured gradient, or [`ColorGradient::from_catalog`] when none is given.
    #[must_use]
    pub fn from_settings(settings: &GenerationSettings, catalog: &BiomeCatalog) -> Self {
        if settings.gradient.is_empty() {
            Self::from_catalog(catalog, settings.gradient_mode)
        } else {
            Self::new(settings.gradient.clone(), settings.gradient_mode)
        }
    }

    /// Color at `t`. An empty gradient yields black.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> [u8; 3] {
        let Some(last) = self.stops.last() else {
            return [0, 0, 0];
        };
        let Some(index) = self.stops.iter().position(|stop| stop.at >= t) else {
            return last.color;
        };
        let upper = self.stops[index];
        match self.mode {
            GradientMode::Fixed => upper.color,
            GradientMode::Blend => {
                if index == 0 {
                    return upper.color;
                }
                let lower = self.stops[index - 1];
                let span = upper.at - lower.at;
                if span <= f32::EPSILON {
                    return upper.color;
                }
                let f = ((t - lower.at) / span).clamp(0.0, 1.0);
                let mut color = [0u8; 3];
                for (channel, out) in color.iter_mut().enumerate() {
                    let a = f32::from(lower.color[channel]);
                    let b = f32::from(upper.color[channel]);
                    *out = (a + (b - a) * f).round() as u8;
                }
                color
            }
        }
    }
}

/// Scan state threaded through biome resolution.
#[derive(Clone, Copy, Debug)]
pub struct BiomeContext {
    mode: BiomeLookup,
    last: Option<BiomeId>,
}

impl BiomeContext {
    /// Creates a context with no previous biome.
    #[must_use]
    pub const fn new(mode: BiomeLookup) -> Self {
        Self { mode, last: None }
    }

    /// Biome last resolved through this context.
    #[inline]
    #[must_use]
    pub const fn last(&self) -> Option<BiomeId> {
        self.last
    }
}

/// The color raster and its resolved id raster.
#[derive(Clone, Debug)]
pub struct BiomeMap {
    colors: Grid<u32>,
    ids: Grid<Option<BiomeId>>,
}

impl BiomeMap {
    /// Side length.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.colors.width()
    }

    /// Packed color at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn color_at(&self, x: i32, y: i32) -> Option<u32> {
        self.colors.get(x, y).copied()
    }

    /// Exact-match biome at `(x, y)`, ignoring any context.
    #[inline]
    #[must_use]
    pub fn id_at(&self, x: i32, y: i32) -> Option<BiomeId> {
        self.ids.get(x, y).copied().flatten()
    }

    /// Resolves the biome at `(x, y)` under the context's lookup mode.
    ///
    /// Out-of-bounds cells always resolve to None.
    pub fn resolve(&self, x: i32, y: i32, ctx: &mut BiomeContext) -> Option<BiomeId> {
        let slot = self.ids.get(x, y)?;
        match (*slot, ctx.mode) {
            (Some(id), _) => {
                ctx.last = Some(id);
                Some(id)
            }
            (None, BiomeLookup::Exact) => None,
            (None, BiomeLookup::FallbackToPrevious) => ctx.last,
        }
    }
}

/// Builds biome rasters from noise.
pub struct BiomeClassifier<'a> {
    catalog: &'a BiomeCatalog,
    gradient: ColorGradient,
    frequency: f64,
}

impl<'a> BiomeClassifier<'a> {
    /// Creates a classifier.
    #[must_use]
    pub fn new(catalog: &'a BiomeCatalog, gradient: ColorGradient, frequency: f64) -> Self {
        Self {
            catalog,
            gradient,
            frequency,
        }
    }

    /// The catalog colors resolve against.
    #[inline]
    #[must_use]
    pub const fn catalog(&self) -> &'a BiomeCatalog {
        self.catalog
    }

    /// Builds the `size x size` biome raster for `seed`.
    #[must_use]
    pub fn build_map(&self, size: usize, seed: WorldSeed) -> BiomeMap {
        let sampler = NoiseSampler::new(seed.derive(purpose::BIOME));
        let colors = Grid::from_fn(size, size, |x, y| {
            let t = sampler.at(x as f64, y as f64, self.frequency) as f32;
            pack_rgb(self.gradient.evaluate(t))
        });
        let ids = Grid::from_fn(size, size, |x, y| {
            colors
                .get(x as i32, y as i32)
                .and_then(|&color| self.catalog.by_color(color))
        });
        BiomeMap { colors, ids }
    }
}
