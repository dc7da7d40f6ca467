//! # Skylight
//!
//! A cell is sky-lit while no solid cell exists above it in its column. The
//! first solid cell is itself lit; everything below it is not.
//!
//! Columns are independent, so an edit rescans exactly one column.

use tessaria_core::{CellPos, Grid, TerrainGrid};

use crate::light::{LightContext, LightEngine, LightField};

/// Per-cell sky exposure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkylightMask {
    lit: Grid<bool>,
}

impl SkylightMask {
    /// Scans every column of `terrain`.
    #[must_use]
    pub fn from_terrain(terrain: &TerrainGrid) -> Self {
        let size = terrain.size();
        let mut mask = Self {
            lit: Grid::new(size, size, false),
        };
        for x in 0..size as i32 {
            mask.update_column(terrain, x);
        }
        mask
    }

    /// Whether `pos` sees the sky. False when out of bounds.
    #[inline]
    #[must_use]
    pub fn is_lit(&self, pos: CellPos) -> bool {
        self.lit.value_or(pos.x, pos.y, false)
    }

    /// Rescans column `x` top to bottom. Returns how many cells changed.
    pub fn update_column(&mut self, terrain: &TerrainGrid, x: i32) -> usize {
        self.rescan_column(terrain, x).len()
    }

    /// Rescans column `x` top to bottom and returns the cells that flipped.
    pub fn rescan_column(&mut self, terrain: &TerrainGrid, x: i32) -> Vec<CellPos> {
        let height = self.lit.height() as i32;
        if x < 0 || x >= self.lit.width() as i32 {
            return Vec::new();
        }
        let mut changed = Vec::new();
        let mut blocked = false;
        for y in (0..height).rev() {
            let pos = CellPos::new(x, y);
            let lit = !blocked;
            if self.lit.value_or(x, y, false) != lit {
                self.lit.set(x, y, lit);
                changed.push(pos);
            }
            if terrain.is_solid(pos) {
                blocked = true;
            }
        }
        changed
    }

    /// The raw mask.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &Grid<bool> {
        &self.lit
    }
}

/// Seeds the light field from the sky.
///
/// For every column the first sky-lit non-solid cell from the top is seeded at
/// sky intensity; propagation fills in the rest.
pub fn seed_initial_light(
    engine: &LightEngine,
    field: &mut LightField,
    terrain: &TerrainGrid,
    skylight: &SkylightMask,
) {
    let ctx = LightContext::new(terrain, skylight);
    let size = terrain.size() as i32;
    let mut seeded = 0usize;
    for x in 0..size {
        let source = (0..size)
            .rev()
            .map(|y| CellPos::new(x, y))
            .take_while(|&pos| skylight.is_lit(pos))
            .find(|&pos| !terrain.is_solid(pos));
        if let Some(pos) = source {
            engine.seed(field, &ctx, pos, engine.sky_intensity());
            seeded += 1;
        }
    }
    tracing::debug!(columns = seeded, "skylight seeded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessaria_core::TileType;

    #[test]
    fn test_first_solid_cell_is_lit() {
        let mut terrain = TerrainGrid::new(6);
        terrain.set_tile(CellPos::new(2, 3), TileType::Stone);
        terrain.set_tile(CellPos::new(2, 4), TileType::Tree);
        terrain.set_tile(CellPos::new(3, 4), TileType::Wall);
        let mask = SkylightMask::from_terrain(&terrain);

        assert!(mask.is_lit(CellPos::new(2, 5)));
        assert!(mask.is_lit(CellPos::new(2, 4)), "trees do not block the sky");
        assert!(mask.is_lit(CellPos::new(2, 3)), "first solid cell is lit");
        assert!(!mask.is_lit(CellPos::new(2, 2)));
        assert!(mask.is_lit(CellPos::new(3, 0)), "walls do not block the sky");
        assert!(!mask.is_lit(CellPos::new(9, 0)));
    }

    #[test]
    fn test_update_column_reports_changes() {
        let mut terrain = TerrainGrid::new(6);
        let mut mask = SkylightMask::from_terrain(&terrain);
        terrain.set_tile(CellPos::new(1, 4), TileType::Dirt);
        assert_eq!(mask.update_column(&terrain, 1), 4);
        assert_eq!(mask.update_column(&terrain, 1), 0);
        assert_eq!(mask.update_column(&terrain, 7), 0);
    }

    fn same<T: Eq>(a: &T, b: &T) -> bool {
        a == b
    }

    #[test]
    fn test_rescanned_mask_equals_fresh_scan() {
        let mut terrain = TerrainGrid::new(6);
        let mut mask = SkylightMask::from_terrain(&terrain);
        terrain.set_tile(CellPos::new(4, 2), TileType::Stone);
        mask.update_column(&terrain, 4);
        assert!(same(&mask, &SkylightMask::from_terrain(&terrain)));
        terrain.set_tile(CellPos::new(4, 2), TileType::Air);
        assert!(!same(&mask, &SkylightMask::from_terrain(&terrain)));
    }
}
