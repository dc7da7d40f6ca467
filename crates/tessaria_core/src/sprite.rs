//! # Sprites and the Tile Atlas
//!
//! Rendering is an external collaborator; the core only decides *which*
//! sprite a cell shows. A [`TileTemplate`] names a family of variants (for
//! auto-tiled ground that is the 16 bitmask shapes plus interior fillers),
//! the [`TileAtlas`] indexes templates by id, name and default tile type, and
//! [`SpriteLayers`] stores the resolved `(template, variant)` per cell and layer.
//!
//! ## Variant Layouts
//!
//! | template | variants | layout |
//! |---|---|---|
//! | ground, ores, wall | 20 | bitmask table `0..15`, enclosed fillers `15..20` |
//! | tree | 9 | [`TreePart`] |
//! | cactus | 6 | [`CactusPart`] |
//! | flora | 1-4 | picked at random |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grid::{CellPos, Grid};
use crate::tile::{Layer, TileType};

/// Index of a template inside the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub u16);

impl TemplateId {
    /// Position in the atlas.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resolved sprite: which template, which of its variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    /// Template the sprite comes from.
    pub template: TemplateId,
    /// Variant index within the template.
    pub variant: u16,
}

/// A named family of sprite variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTemplate {
    /// Unique template name (e.g. `"stone"`).
    pub name: String,
    /// Number of variants. Zero means "nothing to draw".
    pub variants: u16,
    /// Whether variants are chosen by the neighbor bitmask.
    #[serde(default)]
    pub autotile: bool,
    /// Tile type this template is the default for, if any.
    #[serde(default)]
    pub tile: Option<TileType>,
}

impl TileTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new(name: &str, variants: u16, autotile: bool, tile: Option<TileType>) -> Self {
        Self {
            name: name.to_owned(),
            variants,
            autotile,
            tile,
        }
    }
}

/// Number of variants in an auto-tiled template: 15 shapes plus 5 fillers.
pub const AUTOTILE_VARIANTS: u16 = 20;

/// Variant layout of the tree template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TreePart {
    /// Plain trunk segment.
    Trunk = 0,
    /// Lowest trunk segment, sitting on the ground.
    TrunkBase = 1,
    /// Branch filler growing left.
    BranchLeft = 2,
    /// Branch filler growing right.
    BranchRight = 3,
    /// Leafy end of a left branch.
    BranchEndLeft = 4,
    /// Leafy end of a right branch.
    BranchEndRight = 5,
    /// Canopy cap on top of the trunk.
    Top = 6,
    /// Canopy left of the cap.
    TopLeft = 7,
    /// Canopy right of the cap.
    TopRight = 8,
}

impl TreePart {
    /// Every part, in variant order.
    pub const ALL: [Self; 9] = [
        Self::Trunk,
        Self::TrunkBase,
        Self::BranchLeft,
        Self::BranchRight,
        Self::BranchEndLeft,
        Self::BranchEndRight,
        Self::Top,
        Self::TopLeft,
        Self::TopRight,
    ];

    /// Variant index.
    #[inline]
    #[must_use]
    pub const fn variant(self) -> u16 {
        self as u16
    }

    /// Part drawn by `variant`, if any.
    #[must_use]
    pub fn from_variant(variant: u16) -> Option<Self> {
        Self::ALL.get(usize::from(variant)).copied()
    }

    /// Parts that hang off the trunk to the left.
    #[must_use]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::BranchLeft | Self::BranchEndLeft | Self::TopLeft)
    }

    /// Parts that hang off the trunk to the right.
    #[must_use]
    pub const fn is_right(self) -> bool {
        matches!(self, Self::BranchRight | Self::BranchEndRight | Self::TopRight)
    }
}

/// Variant layout of the cactus template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CactusPart {
    /// Body segment.
    Body = 0,
    /// Rounded top of the body.
    Top = 1,
    /// Arm joint leaving the body to the left.
    ArmLeft = 2,
    /// Arm joint leaving the body to the right.
    ArmRight = 3,
    /// Upturned end of a left arm.
    ArmEndLeft = 4,
    /// Upturned end of a right arm.
    ArmEndRight = 5,
}

impl CactusPart {
    /// Variant index.
    #[inline]
    #[must_use]
    pub const fn variant(self) -> u16 {
        self as u16
    }
}

/// All known templates, addressable by id, name or default tile type.
#[derive(Clone, Debug, Default)]
pub struct TileAtlas {
    templates: Vec<TileTemplate>,
    by_name: HashMap<String, TemplateId>,
    by_tile: HashMap<TileType, TemplateId>,
}

impl TileAtlas {
    /// Builds an atlas. For names and tile types listed twice, the first entry wins.
    #[must_use]
    pub fn new(templates: Vec<TileTemplate>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_tile = HashMap::new();
        for (i, template) in templates.iter().enumerate() {
            let id = TemplateId(i as u16);
            by_name.entry(template.name.clone()).or_insert(id);
            if let Some(tile) = template.tile {
                by_tile.entry(tile).or_insert(id);
            }
        }
        Self {
            templates,
            by_name,
            by_tile,
        }
    }

    /// The built-in template set.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_templates())
    }

    /// Looks up a template by id.
    #[inline]
    #[must_use]
    pub fn get(&self, id: TemplateId) -> Option<&TileTemplate> {
        self.templates.get(id.index())
    }

    /// Looks up a template id by name.
    #[inline]
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    /// Default template for a tile type.
    #[inline]
    #[must_use]
    pub fn template_for(&self, tile: TileType) -> Option<TemplateId> {
        self.by_tile.get(&tile).copied()
    }

    /// Number of templates.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if the atlas holds no templates.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The built-in templates, one per generated tile type plus sunflowers.
#[must_use]
pub fn standard_templates() -> Vec<TileTemplate> {
    let mut templates = vec![
        TileTemplate::new("grass", AUTOTILE_VARIANTS, true, Some(TileType::Grass)),
        TileTemplate::new("dirt", AUTOTILE_VARIANTS, true, Some(TileType::Dirt)),
        TileTemplate::new("stone", AUTOTILE_VARIANTS, true, Some(TileType::Stone)),
    ];
    for ore in TileType::ORES {
        templates.push(TileTemplate::new(
            ore.name(),
            AUTOTILE_VARIANTS,
            true,
            Some(ore),
        ));
    }
    templates.extend([
        TileTemplate::new("wall", AUTOTILE_VARIANTS, true, Some(TileType::Wall)),
        TileTemplate::new("tree", 9, false, Some(TileType::Tree)),
        TileTemplate::new("cactus", 6, false, Some(TileType::Cactus)),
        TileTemplate::new("small_grass", 3, false, Some(TileType::SmallGrass)),
        TileTemplate::new("flower", 4, false, Some(TileType::Flower)),
        TileTemplate::new("sunflower", 1, false, None),
    ]);
    templates
}

/// Resolved sprites for both layers of every cell.
#[derive(Clone, Debug)]
pub struct SpriteLayers {
    foreground: Grid<Option<SpriteRef>>,
    background: Grid<Option<SpriteRef>>,
}

impl SpriteLayers {
    /// Creates empty layers for a `size x size` world.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            foreground: Grid::new(size, size, None),
            background: Grid::new(size, size, None),
        }
    }

    fn layer(&self, layer: Layer) -> &Grid<Option<SpriteRef>> {
        match layer {
            Layer::Foreground => &self.foreground,
            Layer::Background => &self.background,
        }
    }

    /// Sprite at `pos` on `layer`; None when empty or out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, layer: Layer, pos: CellPos) -> Option<SpriteRef> {
        self.layer(layer).get(pos.x, pos.y).copied().flatten()
    }

    /// Writes (or clears) the sprite at `pos`. Returns false if out of bounds.
    pub fn set(&mut self, layer: Layer, pos: CellPos, sprite: Option<SpriteRef>) -> bool {
        let grid = match layer {
            Layer::Foreground => &mut self.foreground,
            Layer::Background => &mut self.background,
        };
        grid.set(pos.x, pos.y, sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_atlas_covers_generated_types() {
        let atlas = TileAtlas::standard();
        for tile in TileType::ALL {
            if tile != TileType::Air {
                assert!(atlas.template_for(tile).is_some(), "no template for {tile:?}");
            }
        }
        assert!(atlas.id_of("sunflower").is_some());
        assert_eq!(atlas.template_for(TileType::Flower), atlas.id_of("flower"));
    }

    #[test]
    fn test_tree_part_variants() {
        for part in TreePart::ALL {
            assert_eq!(TreePart::from_variant(part.variant()), Some(part));
        }
        assert_eq!(TreePart::from_variant(9), None);
        assert!(TreePart::TopLeft.is_left());
        assert!(!TreePart::Trunk.is_left() && !TreePart::Trunk.is_right());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let atlas = TileAtlas::new(vec![
            TileTemplate::new("a", 1, false, Some(TileType::Stone)),
            TileTemplate::new("b", 2, false, Some(TileType::Stone)),
        ]);
        assert_eq!(atlas.template_for(TileType::Stone), Some(TemplateId(0)));
        assert_eq!(atlas.id_of("b"), Some(TemplateId(1)));
        assert!(atlas.get(TemplateId(5)).is_none());
    }

    #[test]
    fn test_sprite_layers() {
        let mut layers = SpriteLayers::new(3);
        let sprite = SpriteRef {
            template: TemplateId(2),
            variant: 7,
        };
        assert!(layers.set(Layer::Background, CellPos::new(1, 2), Some(sprite)));
        assert_eq!(layers.get(Layer::Background, CellPos::new(1, 2)), Some(sprite));
        assert_eq!(layers.get(Layer::Foreground, CellPos::new(1, 2)), None);
        assert!(!layers.set(Layer::Foreground, CellPos::new(3, 0), Some(sprite)));
    }
}
