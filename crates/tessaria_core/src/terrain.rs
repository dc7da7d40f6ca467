//! # Terrain Grid
//!
//! The two parallel world arrays: the foreground [`TileType`] of every cell
//! and an independent background-wall flag.

use crate::grid::{CellPos, Grid};
use crate::tile::{Medium, TileType};

/// Foreground types plus background walls for an `N x N` world.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainGrid {
    types: Grid<TileType>,
    walls: Grid<bool>,
}

impl TerrainGrid {
    /// Creates an all-Air, unwalled world of `size x size` cells.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            types: Grid::new(size, size, TileType::Air),
            walls: Grid::new(size, size, false),
        }
    }

    /// Side length of the world.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.types.width()
    }

    /// Returns true if `pos` lies inside the world.
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: CellPos) -> bool {
        self.types.contains(pos.x, pos.y)
    }

    /// Foreground type at `pos`; Air when out of bounds.
    #[inline]
    #[must_use]
    pub fn tile_type(&self, pos: CellPos) -> TileType {
        self.types.value_or(pos.x, pos.y, TileType::Air)
    }

    /// Background wall flag at `pos`; false when out of bounds.
    #[inline]
    #[must_use]
    pub fn has_wall(&self, pos: CellPos) -> bool {
        self.walls.value_or(pos.x, pos.y, false)
    }

    /// Returns true if the cell blocks skylight.
    #[inline]
    #[must_use]
    pub fn is_solid(&self, pos: CellPos) -> bool {
        self.tile_type(pos).is_solid()
    }

    /// Light medium of the cell. Out-of-bounds cells read as Open Air.
    #[inline]
    #[must_use]
    pub fn medium(&self, pos: CellPos) -> Medium {
        self.tile_type(pos).medium()
    }

    /// Writes the foreground type. Returns false if out of bounds.
    pub fn set_tile(&mut self, pos: CellPos, tile: TileType) -> bool {
        self.types.set(pos.x, pos.y, tile)
    }

    /// Writes the background wall flag. Returns false if out of bounds.
    pub fn set_wall(&mut self, pos: CellPos, wall: bool) -> bool {
        self.walls.set(pos.x, pos.y, wall)
    }

    /// Borrows the raw type grid.
    #[inline]
    #[must_use]
    pub const fn types(&self) -> &Grid<TileType> {
        &self.types
    }

    /// Borrows the raw wall grid.
    #[inline]
    #[must_use]
    pub const fn walls(&self) -> &Grid<bool> {
        &self.walls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let terrain = TerrainGrid::new(4);
        assert_eq!(terrain.tile_type(CellPos::new(-1, 2)), TileType::Air);
        assert!(!terrain.has_wall(CellPos::new(9, 9)));
        assert_eq!(terrain.medium(CellPos::new(9, 9)), Medium::Open);
    }

    #[test]
    fn test_layers_are_independent() {
        let mut terrain = TerrainGrid::new(4);
        let pos = CellPos::new(1, 1);
        assert!(terrain.set_wall(pos, true));
        assert!(terrain.set_tile(pos, TileType::Stone));
        assert!(terrain.has_wall(pos));
        assert!(terrain.is_solid(pos));
        assert!(!terrain.set_tile(CellPos::new(4, 0), TileType::Stone));
    }
}
