//! # Tile Types
//!
//! The closed set of terrain types a cell can hold, plus the classification
//! helpers every subsystem shares: which types block skylight, which ones the
//! auto-tiler joins together, and which edit tag owns them.

use serde::{Deserialize, Serialize};

/// Terrain type of a cell's foreground.
///
/// `Wall` is special: the foreground is open, but a background wall is present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileType {
    /// Empty cell.
    #[default]
    Air = 0,
    /// Surface soil.
    Grass = 1,
    /// Sub-surface soil.
    Dirt = 2,
    /// Deep rock.
    Stone = 3,
    /// Coal ore.
    Coal = 4,
    /// Iron ore.
    Iron = 5,
    /// Copper ore.
    Copper = 6,
    /// Silver ore.
    Silver = 7,
    /// Gold ore.
    Gold = 8,
    /// Diamond ore.
    Diamond = 9,
    /// Tree segment (trunk, branch or canopy cap).
    Tree = 10,
    /// Cactus segment.
    Cactus = 11,
    /// Short grass tuft.
    SmallGrass = 12,
    /// Flower (including sunflowers).
    Flower = 13,
    /// Open foreground over a background wall.
    Wall = 14,
}

impl TileType {
    /// Every tile type, in discriminant order.
    pub const ALL: [Self; 15] = [
        Self::Air,
        Self::Grass,
        Self::Dirt,
        Self::Stone,
        Self::Coal,
        Self::Iron,
        Self::Copper,
        Self::Silver,
        Self::Gold,
        Self::Diamond,
        Self::Tree,
        Self::Cactus,
        Self::SmallGrass,
        Self::Flower,
        Self::Wall,
    ];

    /// The six ore kinds, in their default catalog order.
    pub const ORES: [Self; 6] = [
        Self::Coal,
        Self::Iron,
        Self::Copper,
        Self::Silver,
        Self::Gold,
        Self::Diamond,
    ];

    /// Returns true for ore kinds.
    #[inline]
    #[must_use]
    pub const fn is_ore(self) -> bool {
        matches!(
            self,
            Self::Coal | Self::Iron | Self::Copper | Self::Silver | Self::Gold | Self::Diamond
        )
    }

    /// Returns true if the type blocks skylight (ground and ores).
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Grass | Self::Dirt | Self::Stone) || self.is_ore()
    }

    /// Returns true for plant growth: trees, cacti and flora.
    #[inline]
    #[must_use]
    pub const fn is_decoration(self) -> bool {
        matches!(
            self,
            Self::Tree | Self::Cactus | Self::SmallGrass | Self::Flower
        )
    }

    /// Returns true if something occupies the foreground layer.
    #[inline]
    #[must_use]
    pub const fn occupies_foreground(self) -> bool {
        !matches!(self, Self::Air | Self::Wall)
    }

    /// Auto-tile compatibility: same type, and grass/dirt blend into each other.
    #[inline]
    #[must_use]
    pub fn connects_to(self, other: Self) -> bool {
        self == other
            || matches!(
                (self, other),
                (Self::Grass, Self::Dirt) | (Self::Dirt, Self::Grass)
            )
    }

    /// Light medium of a cell holding this type.
    #[inline]
    #[must_use]
    pub const fn medium(self) -> Medium {
        if self.is_solid() {
            Medium::Opaque
        } else if matches!(self, Self::Wall) {
            Medium::Background
        } else {
            Medium::Open
        }
    }

    /// The edit tag that owns this type.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> Option<TileTag> {
        if self.is_solid() {
            Some(TileTag::Ground)
        } else if self.is_decoration() {
            Some(TileTag::Decoration)
        } else if matches!(self, Self::Wall) {
            Some(TileTag::Wall)
        } else {
            None
        }
    }

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Grass => "grass",
            Self::Dirt => "dirt",
            Self::Stone => "stone",
            Self::Coal => "coal",
            Self::Iron => "iron",
            Self::Copper => "copper",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
            Self::Tree => "tree",
            Self::Cactus => "cactus",
            Self::SmallGrass => "small_grass",
            Self::Flower => "flower",
            Self::Wall => "wall",
        }
    }
}

/// The two independent occupancy layers of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    /// Ground, ores and plants.
    Foreground,
    /// Background walls.
    Background,
}

/// Edit tag: which kind of occupant a place/remove request targets.
///
/// Separates ordinary ground tiles from plant segments so that removing
/// "ground" never chops a tree by accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileTag {
    /// Solid foreground (soil, stone, ore).
    Ground,
    /// Plant segments and flora.
    Decoration,
    /// Background wall.
    Wall,
}

impl TileTag {
    /// Layer this tag edits.
    #[inline]
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Ground | Self::Decoration => Layer::Foreground,
            Self::Wall => Layer::Background,
        }
    }
}

/// How light travels through a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Medium {
    /// Solid foreground: strong decay.
    Opaque,
    /// Air and non-blocking plants: weak decay.
    Open,
    /// Open foreground over a wall: weak decay plus a write boost.
    Background,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solidity_excludes_decorations_and_walls() {
        for ty in TileType::ALL {
            if ty.is_solid() {
                assert!(!ty.is_decoration(), "{ty:?} cannot be both");
                assert_eq!(ty.medium(), Medium::Opaque);
            }
        }
        assert!(!TileType::Air.is_solid());
        assert!(!TileType::Wall.is_solid());
        assert!(!TileType::Tree.is_solid());
        assert!(TileType::Diamond.is_solid());
    }

    #[test]
    fn test_grass_dirt_connect() {
        assert!(TileType::Grass.connects_to(TileType::Dirt));
        assert!(TileType::Dirt.connects_to(TileType::Grass));
        assert!(!TileType::Stone.connects_to(TileType::Dirt));
        assert!(TileType::Stone.connects_to(TileType::Stone));
    }

    #[test]
    fn test_tags() {
        assert_eq!(TileType::Iron.tag(), Some(TileTag::Ground));
        assert_eq!(TileType::Cactus.tag(), Some(TileTag::Decoration));
        assert_eq!(TileType::Wall.tag(), Some(TileTag::Wall));
        assert_eq!(TileType::Air.tag(), None);
        assert_eq!(TileTag::Wall.layer(), Layer::Background);
    }

    #[test]
    fn test_discriminants_are_dense() {
        for (i, ty) in TileType::ALL.iter().enumerate() {
            assert_eq!(*ty as usize, i);
        }
    }
}
