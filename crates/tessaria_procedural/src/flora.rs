//! # Feature Placement
//!
//! Grows flora, trees and cacti on top of a finished heightfield.
//!
//! The scan is column-major from the bottom-left. A Grass cell with Air
//! directly above draws one uniform value, consumed against the biome's
//! cumulative feature chances in fixed order:
//!
//! | order | feature | tile |
//! |---|---|---|
//! | 1 | small grass | `SmallGrass` |
//! | 2 | flower | `Flower` |
//! | 3 | sunflower | `Flower` (sunflower template) |
//! | 4 | small tree | `Tree` |
//! | 5 | large growth | `Tree` or `Cactus` |
//!
//! Growth only ever writes into in-bounds Air cells. A blocked trunk is
//! truncated, a blocked branch stops where it is.

use rand::Rng;
use tessaria_core::{
    BiomeCategory, CactusPart, CellPos, Grid, GrowthKind, SpriteRef, TemplateId, TerrainGrid,
    TileAtlas, TileType, TreePart, TreeSettings,
};

use crate::biome::{BiomeCatalog, BiomeId};

/// One segment written by the placer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedSegment {
    /// Cell the segment occupies.
    pub pos: CellPos,
    /// Tile type written to the terrain.
    pub tile: TileType,
    /// Sprite chosen for the segment.
    pub sprite: SpriteRef,
    /// Biome the growth belongs to.
    pub biome: BiomeId,
}

/// Templates the placer draws from.
#[derive(Clone, Copy, Debug)]
struct FeatureTemplates {
    small_grass: Option<(TemplateId, u16)>,
    flower: Option<(TemplateId, u16)>,
    sunflower: Option<(TemplateId, u16)>,
    tree: Option<TemplateId>,
    cactus: Option<TemplateId>,
}

impl FeatureTemplates {
    fn from_atlas(atlas: &TileAtlas) -> Self {
        let with_variants = |id: Option<TemplateId>| {
            id.and_then(|id| atlas.get(id).map(|t| (id, t.variants)))
                .filter(|&(_, variants)| variants > 0)
        };
        let flower = with_variants(atlas.template_for(TileType::Flower));
        Self {
            small_grass: with_variants(atlas.template_for(TileType::SmallGrass)),
            flower,
            sunflower: with_variants(atlas.id_of("sunflower")).or(flower),
            tree: atlas.template_for(TileType::Tree),
            cactus: atlas.template_for(TileType::Cactus),
        }
    }
}

/// Which side of a trunk a branch grows on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    const fn dx(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// Per-side branch budget and spacing.
#[derive(Clone, Copy, Debug, Default)]
struct BranchBudget {
    count: u32,
    last_row: Option<u32>,
}

impl BranchBudget {
    fn allows(&self, row: u32, settings: &TreeSettings) -> bool {
        self.count < settings.max_branches_per_side
            && self
                .last_row
                .map_or(true, |last| row - last >= settings.branch_spacing)
    }
}

/// Grows every feature of a world.
pub struct FeaturePlacer<'a> {
    catalog: &'a BiomeCatalog,
    templates: FeatureTemplates,
}

/// Segments of one growth plus the terrain they are written to.
struct Growth<'t> {
    terrain: &'t mut TerrainGrid,
    biome: BiomeId,
    segments: Vec<PlacedSegment>,
}

impl Growth<'_> {
    fn is_free(&self, pos: CellPos) -> bool {
        self.terrain.contains(pos) && self.terrain.tile_type(pos) == TileType::Air
    }

    /// Writes a segment if the cell is free.
    fn put(&mut self, pos: CellPos, tile: TileType, template: TemplateId, variant: u16) -> bool {
        if !self.is_free(pos) {
            return false;
        }
        self.terrain.set_tile(pos, tile);
        self.segments.push(PlacedSegment {
            pos,
            tile,
            sprite: SpriteRef { template, variant },
            biome: self.biome,
        });
        true
    }
}

impl<'a> FeaturePlacer<'a> {
    /// Creates a placer drawing templates from `atlas`.
    #[must_use]
    pub fn new(catalog: &'a BiomeCatalog, atlas: &TileAtlas) -> Self {
        Self {
            catalog,
            templates: FeatureTemplates::from_atlas(atlas),
        }
    }

    /// Scans the world and grows features, writing them into `terrain`.
    pub fn place<R: Rng + ?Sized>(
        &self,
        terrain: &mut TerrainGrid,
        biomes: &Grid<BiomeId>,
        rng: &mut R,
    ) -> Vec<PlacedSegment> {
        let n = terrain.size() as i32;
        let mut placed = Vec::new();
        let mut last_large: Option<i32> = None;

        for x in 0..n {
            for y in 0..n - 1 {
                let ground = CellPos::new(x, y);
                if terrain.tile_type(ground) != TileType::Grass
                    || terrain.tile_type(ground.offset(0, 1)) != TileType::Air
                {
                    continue;
                }
                let biome_id = biomes.value_or(x, y, self.catalog.default_id());
                let biome = self.catalog.get_or_default(biome_id);
                let roll: f32 = rng.gen();
                let Some(feature) = pick_feature(roll, biome.chances.ordered()) else {
                    continue;
                };

                let mut growth = Growth {
                    terrain: &mut *terrain,
                    biome: biome_id,
                    segments: Vec::new(),
                };
                let root = ground.offset(0, 1);
                match feature {
                    0 => self.plant(&mut growth, root, TileType::SmallGrass, self.templates.small_grass, rng),
                    1 => self.plant(&mut growth, root, TileType::Flower, self.templates.flower, rng),
                    2 => self.plant(&mut growth, root, TileType::Flower, self.templates.sunflower, rng),
                    3 => self.grow_small_tree(&mut growth, root, &biome.tree, rng),
                    _ => {
                        let spaced = last_large.map_or(true, |last| x - last >= biome.tree.min_spacing);
                        if spaced {
                            let snow = self.catalog.category(biome_id) == BiomeCategory::Snow;
                            match biome.large_growth {
                                GrowthKind::Tree => self.grow_tree(&mut growth, root, &biome.tree, snow, rng),
                                GrowthKind::Cactus => self.grow_cactus(&mut growth, root, &biome.tree, rng),
                                GrowthKind::None => {}
                            }
                            if !growth.segments.is_empty() {
                                last_large = Some(x);
                            }
                        }
                    }
                }
                placed.append(&mut growth.segments);
            }
        }

        tracing::debug!(segments = placed.len(), "features placed");
        placed
    }

    fn plant<R: Rng + ?Sized>(
        &self,
        growth: &mut Growth<'_>,
        pos: CellPos,
        tile: TileType,
        template: Option<(TemplateId, u16)>,
        rng: &mut R,
    ) {
        if let Some((template, variants)) = template {
            let variant = rng.gen_range(0..variants);
            growth.put(pos, tile, template, variant);
        }
    }

    /// Lays a trunk of up to `height` segments; returns how many were placed.
    fn trunk(growth: &mut Growth<'_>, base: CellPos, height: u32, template: TemplateId) -> u32 {
        let mut placed = 0;
        for row in 0..height {
            let part = if row == 0 { TreePart::TrunkBase } else { TreePart::Trunk };
            if !growth.put(base.offset(0, row as i32), TileType::Tree, template, part.variant()) {
                break;
            }
            placed += 1;
        }
        placed
    }

    fn grow_small_tree<R: Rng + ?Sized>(
        &self,
        growth: &mut Growth<'_>,
        base: CellPos,
        settings: &TreeSettings,
        rng: &mut R,
    ) {
        let Some(template) = self.templates.tree else {
            return;
        };
        let height = rng.gen_range(settings.small_min_height..=settings.small_max_height);
        let placed = Self::trunk(growth, base, height, template);
        if placed > 0 {
            growth.put(base.offset(0, placed as i32), TileType::Tree, template, TreePart::Top.variant());
        }
    }

    fn grow_tree<R: Rng + ?Sized>(
        &self,
        growth: &mut Growth<'_>,
        base: CellPos,
        settings: &TreeSettings,
        snow: bool,
        rng: &mut R,
    ) {
        let Some(template) = self.templates.tree else {
            return;
        };
        let height = rng.gen_range(settings.min_height..=settings.max_height);
        let mut budgets = [BranchBudget::default(); 2];
        let mut placed = 0;
        for row in 0..height {
            let part = if row == 0 { TreePart::TrunkBase } else { TreePart::Trunk };
            let pos = base.offset(0, row as i32);
            if !growth.put(pos, TileType::Tree, template, part.variant()) {
                break;
            }
            placed += 1;
            if row == 0 || row + 1 == height {
                continue;
            }
            for (budget, side) in budgets.iter_mut().zip([Side::Left, Side::Right]) {
                if budget.allows(row, settings) && rng.gen::<f32>() < settings.branch_chance {
                    let (filler, end) = match side {
                        Side::Left => (TreePart::BranchLeft, TreePart::BranchEndLeft),
                        Side::Right => (TreePart::BranchRight, TreePart::BranchEndRight),
                    };
                    let length = rng.gen_range(1..=settings.max_branch_length);
                    if branch(growth, pos, side, length, TileType::Tree, template, filler.variant(), end.variant()) {
                        budget.count += 1;
                        budget.last_row = Some(row);
                    }
                }
            }
        }
        if placed == 0 {
            return;
        }

        let bald = rng.gen::<f32>() < settings.bald_chance || snow;
        let cap = base.offset(0, placed as i32);
        if growth.put(cap, TileType::Tree, template, TreePart::Top.variant()) && !bald {
            growth.put(cap.offset(-1, 0), TileType::Tree, template, TreePart::TopLeft.variant());
            growth.put(cap.offset(1, 0), TileType::Tree, template, TreePart::TopRight.variant());
        }
    }

    fn grow_cactus<R: Rng + ?Sized>(
        &self,
        growth: &mut Growth<'_>,
        base: CellPos,
        settings: &TreeSettings,
        rng: &mut R,
    ) {
        let Some(template) = self.templates.cactus else {
            return;
        };
        let height = rng.gen_range(settings.min_height..=settings.max_height);
        let mut budgets = [BranchBudget::default(); 2];
        let mut top: Option<usize> = None;
        for row in 0..height {
            let pos = base.offset(0, row as i32);
            let part = if row + 1 == height { CactusPart::Top } else { CactusPart::Body };
            if !growth.put(pos, TileType::Cactus, template, part.variant()) {
                break;
            }
            top = Some(growth.segments.len() - 1);
            for (budget, side) in budgets.iter_mut().zip([Side::Left, Side::Right]) {
                if budget.allows(row, settings) && rng.gen::<f32>() < settings.branch_chance {
                    let (arm, end) = match side {
                        Side::Left => (CactusPart::ArmLeft, CactusPart::ArmEndLeft),
                        Side::Right => (CactusPart::ArmRight, CactusPart::ArmEndRight),
                    };
                    let length = rng.gen_range(1..=settings.max_branch_length);
                    if branch(growth, pos, side, length, TileType::Cactus, template, arm.variant(), end.variant()) {
                        budget.count += 1;
                        budget.last_row = Some(row);
                    }
                }
            }
        }
        // A truncated body still ends in a rounded top.
        if let Some(index) = top {
            growth.segments[index].sprite.variant = CactusPart::Top.variant();
        }
    }
}

/// Lays a filler run of `length` cells beside `from`, then an end cap.
/// Returns true if at least one cell was placed.
#[allow(clippy::too_many_arguments)]
fn branch(
    growth: &mut Growth<'_>,
    from: CellPos,
    side: Side,
    length: u32,
    tile: TileType,
    template: TemplateId,
    filler: u16,
    end: u16,
) -> bool {
    let dx = side.dx();
    let mut laid = 0;
    for step in 1..=length as i32 {
        if !growth.put(from.offset(dx * step, 0), tile, template, filler) {
            return laid > 0;
        }
        laid += 1;
    }
    growth.put(from.offset(dx * (length as i32 + 1), 0), tile, template, end);
    true
}

/// Index of the first cumulative interval containing `roll`.
fn pick_feature(roll: f32, chances: [f32; 5]) -> Option<usize> {
    let mut upper = 0.0;
    for (i, chance) in chances.into_iter().enumerate() {
        upper += chance;
        if roll < upper {
            return Some(i);
        }
    }
    None
}
