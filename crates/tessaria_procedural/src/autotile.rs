//! # Auto-Tiling
//!
//! Picks the visual variant of a cell from the compatibility of its four
//! cardinal neighbors.
//!
//! ```text
//!         up = 1
//! left = 8  [c]  right = 2
//!        down = 4
//! ```
//!
//! The 4-bit mask indexes a fixed table of shapes. A fully enclosed cell
//! (mask 15) picks uniformly among the template's interior fillers.

use rand::Rng;
use tessaria_core::{
    CellPos, Layer, SpriteLayers, SpriteRef, TemplateId, TerrainGrid, TileAtlas, TileTemplate,
    TileType,
};

/// Neighbor above is compatible.
pub const MASK_UP: u8 = 1;
/// Neighbor to the right is compatible.
pub const MASK_RIGHT: u8 = 2;
/// Neighbor below is compatible.
pub const MASK_DOWN: u8 = 4;
/// Neighbor to the left is compatible.
pub const MASK_LEFT: u8 = 8;
/// All four neighbors are compatible.
pub const MASK_ENCLOSED: u8 = 15;

/// First interior filler variant.
pub const INTERIOR_START: u16 = 15;

/// Variant for masks `0..15`.
const SHAPES: [u16; 15] = [
    0,  // isolated
    1,  // up
    2,  // right
    7,  // up + right
    3,  // down
    5,  // vertical pair
    8,  // right + down
    14, // open left
    4,  // left
    10, // left + up
    6,  // horizontal pair
    13, // open down
    9,  // down + left
    12, // open right
    11, // open up
];

/// Compatibility mask of the cell at `pos`.
///
/// Foreground: neighbor has the same type, with grass and dirt mutually
/// compatible. Background: neighbor has a wall. Out-of-bounds neighbors are
/// incompatible.
#[must_use]
pub fn neighbor_mask(terrain: &TerrainGrid, pos: CellPos, layer: Layer, tile: TileType) -> u8 {
    let sides = [
        (pos.offset(0, 1), MASK_UP),
        (pos.offset(1, 0), MASK_RIGHT),
        (pos.offset(0, -1), MASK_DOWN),
        (pos.offset(-1, 0), MASK_LEFT),
    ];
    sides
        .into_iter()
        .filter(|&(neighbor, _)| {
            terrain.contains(neighbor)
                && match layer {
                    Layer::Foreground => tile.connects_to(terrain.tile_type(neighbor)),
                    Layer::Background => terrain.has_wall(neighbor),
                }
        })
        .fold(0, |mask, (_, bit)| mask | bit)
}

/// Variant of `template` for `mask`. None means "draw nothing".
pub fn variant_for<R: Rng + ?Sized>(template: &TileTemplate, mask: u8, rng: &mut R) -> Option<u16> {
    if template.variants == 0 {
        return None;
    }
    if !template.autotile {
        return Some(0);
    }
    let index = if mask & MASK_ENCLOSED == MASK_ENCLOSED {
        if template.variants > INTERIOR_START {
            rng.gen_range(INTERIOR_START..template.variants)
        } else {
            INTERIOR_START
        }
    } else {
        SHAPES[usize::from(mask & MASK_ENCLOSED)]
    };
    Some(if index < template.variants { index } else { 0 })
}

/// Resolves sprites against an atlas.
pub struct AutoTiler<'a> {
    atlas: &'a TileAtlas,
}

impl<'a> AutoTiler<'a> {
    /// Creates a tiler over `atlas`.
    #[must_use]
    pub const fn new(atlas: &'a TileAtlas) -> Self {
        Self { atlas }
    }

    /// Sprite for a cell holding `tile` drawn from `template`.
    ///
    /// Returns None for unknown or empty templates.
    pub fn resolve_sprite<R: Rng + ?Sized>(
        &self,
        terrain: &TerrainGrid,
        pos: CellPos,
        template: TemplateId,
        tile: TileType,
        layer: Layer,
        rng: &mut R,
    ) -> Option<SpriteRef> {
        let definition = self.atlas.get(template)?;
        let mask = neighbor_mask(terrain, pos, layer, tile);
        variant_for(definition, mask, rng).map(|variant| SpriteRef { template, variant })
    }

    /// Re-resolves the auto-tiled sprites of the 8 cells around `pos`.
    ///
    /// One ring only. Hand-picked variants (trees, cacti, flora) are left alone,
    /// and an enclosed cell keeps its existing interior filler.
    pub fn refresh_neighbors<R: Rng + ?Sized>(
        &self,
        terrain: &TerrainGrid,
        sprites: &mut SpriteLayers,
        pos: CellPos,
        rng: &mut R,
    ) {
        for neighbor in pos.neighbors8() {
            if !terrain.contains(neighbor) {
                continue;
            }
            for layer in [Layer::Foreground, Layer::Background] {
                let Some(current) = sprites.get(layer, neighbor) else {
                    continue;
                };
                let Some(definition) = self.atlas.get(current.template) else {
                    continue;
                };
                if !definition.autotile {
                    continue;
                }
                let tile = match layer {
                    Layer::Foreground => terrain.tile_type(neighbor),
                    Layer::Background => TileType::Wall,
                };
                let mask = neighbor_mask(terrain, neighbor, layer, tile);
                if mask == MASK_ENCLOSED && current.variant >= INTERIOR_START {
                    continue;
                }
                let sprite = variant_for(definition, mask, rng).map(|variant| SpriteRef {
                    template: current.template,
                    variant,
                });
                sprites.set(layer, neighbor, sprite);
            }
        }
    }
}
