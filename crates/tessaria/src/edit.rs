//! # Tile Edit Controller
//!
//! Every runtime edit goes through [`TileEditController`], which keeps the
//! terrain grid, sprite layers, occupancy lists, chunks, metadata, skylight and
//! the light queue consistent with each other.
//!
//! ## Place
//!
//! ```text
//! validate ─> write grid ─> resolve sprite ─> occupancy + chunk + metadata
//!          ─> rescan column skylight ─> queue light block ─> refresh neighbors
//! ```
//!
//! ## Remove
//!
//! ```text
//! validate ─> read metadata ─> collect connected segments ─> clear cell
//!          ─> clear segments ─> patch tree top ─> rescan touched columns
//!          ─> queue light ─> refresh neighbors ─> drops
//! ```
//!
//! A drop's quantity is the number of cells it took.
//!
//! A rejected edit returns an [`EditError`] before anything is written.

use std::collections::{BTreeSet, HashSet};

use rand_chacha::ChaCha8Rng;
use tessaria_core::{
    CellPos, Layer, Medium, SpriteLayers, SpriteRef, TemplateId, TerrainGrid, TileAtlas, TileTag,
    TileType, TreePart, NEIGHBORS_8,
};
use tessaria_lighting::{LightEdit, LightEngine, SkylightMask};
use tessaria_procedural::AutoTiler;

use crate::chunk::{ChunkManager, TileKey};
use crate::error::{EditError, EditResult};
use crate::metadata::{ItemDropFactory, MetadataStore, Occupancy, TileMetadata};

/// Direction a tree removal is travelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Heading {
    Up,
    Left,
    Right,
}

/// Borrowed view of every world part an edit mutates.
pub struct TileEditController<'w> {
    pub(crate) terrain: &'w mut TerrainGrid,
    pub(crate) sprites: &'w mut SpriteLayers,
    pub(crate) occupancy: &'w mut Occupancy,
    pub(crate) chunks: &'w mut ChunkManager,
    pub(crate) metadata: &'w mut MetadataStore,
    pub(crate) skylight: &'w mut SkylightMask,
    pub(crate) light: &'w mut LightEngine,
    pub(crate) rng: &'w mut ChaCha8Rng,
    pub(crate) atlas: &'w TileAtlas,
    pub(crate) cluster_radius: i32,
}

impl TileEditController<'_> {
    /// Places `tile` at `pos`, drawn from `template`.
    ///
    /// # Errors
    ///
    /// Out of bounds, a tag that does not describe `tile`, an unknown template,
    /// or an occupied target layer.
    pub fn try_place(
        &mut self,
        pos: CellPos,
        template: TemplateId,
        tile: TileType,
        tag: TileTag,
        biome: &str,
    ) -> EditResult<()> {
        if !self.terrain.contains(pos) {
            return Err(EditError::OutOfBounds { x: pos.x, y: pos.y });
        }
        if tile.tag() != Some(tag) {
            return Err(EditError::TagMismatch { tile, tag });
        }
        if self.atlas.get(template).is_none() {
            return Err(EditError::UnknownTemplate(template));
        }
        let layer = tag.layer();
        if self.occupancy.is_occupied(layer, pos) {
            return Err(EditError::Occupied {
                x: pos.x,
                y: pos.y,
                layer,
            });
        }

        match layer {
            Layer::Foreground => {
                self.terrain.set_tile(pos, tile);
            }
            Layer::Background => {
                self.terrain.set_wall(pos, true);
                if !self.terrain.tile_type(pos).occupies_foreground() {
                    self.terrain.set_tile(pos, TileType::Wall);
                }
            }
        }

        let tiler = AutoTiler::new(self.atlas);
        let sprite = tiler.resolve_sprite(&*self.terrain, pos, template, tile, layer, &mut *self.rng);
        self.sprites.set(layer, pos, sprite);

        let key = TileKey::new(pos, layer);
        self.occupancy.insert(layer, pos);
        self.chunks.insert(key);
        self.metadata.insert(
            key,
            TileMetadata {
                template,
                tile_type: tile,
                biome: biome.to_owned(),
                player_placed: true,
            },
        );

        let flipped = self.skylight.rescan_column(&*self.terrain, pos.x);
        self.light.enqueue(LightEdit::Block(pos));
        for cell in flipped {
            if cell != pos && !self.skylight.is_lit(cell) {
                self.light.enqueue(LightEdit::Block(cell));
            }
        }
        tiler.refresh_neighbors(&*self.terrain, &mut *self.sprites, pos, &mut *self.rng);

        tracing::debug!(x = pos.x, y = pos.y, ?tile, "tile placed");
        Ok(())
    }

    /// Boolean form of [`TileEditController::try_place`].
    pub fn place(
        &mut self,
        pos: CellPos,
        template: TemplateId,
        tile: TileType,
        tag: TileTag,
        biome: &str,
    ) -> bool {
        match self.try_place(pos, template, tile, tag, biome) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "place rejected");
                false
            }
        }
    }

    /// Removes the `tag` occupant at `pos` and delivers its drop to `drops`.
    ///
    /// Returns the drop quantity: 1, or every segment taken for trees and cacti.
    /// A plant standing on removed ground leaves its own drop.
    ///
    /// # Errors
    ///
    /// Out of bounds, nothing on the cell, or an occupant the tag does not describe.
    pub fn try_remove<F: ItemDropFactory + ?Sized>(
        &mut self,
        pos: CellPos,
        tag: TileTag,
        drops: &mut F,
    ) -> EditResult<u32> {
        if !self.terrain.contains(pos) {
            return Err(EditError::OutOfBounds { x: pos.x, y: pos.y });
        }
        let tile = self.terrain.tile_type(pos);
        let removed = self.check_occupant(pos, tile, tag)?;
        let layer = tag.layer();

        let record = self.drop_record(pos, layer, removed);
        let part = self.tree_part(pos);
        let connected = match (tag, removed) {
            (TileTag::Decoration, TileType::Tree) => self.tree_segments(pos),
            (TileTag::Decoration, TileType::Cactus) => self.cactus_segments(pos),
            (TileTag::Ground, _) => self.standing_on(pos.offset(0, 1)),
            _ => Vec::new(),
        };
        let (quantity, plant) = if tag == TileTag::Ground {
            let plant = connected.first().and_then(|&base| {
                let record = self.drop_record(base, Layer::Foreground, self.terrain.tile_type(base))?;
                Some((base, record, connected.len() as u32))
            });
            (1, plant)
        } else {
            (connected.len() as u32 + 1, None)
        };

        let mut cleared = vec![(pos, self.clear(pos, layer))];
        for &cell in &connected {
            cleared.push((cell, self.clear(cell, Layer::Foreground)));
        }
        if part.is_some_and(|part| !part.is_left() && !part.is_right()) {
            self.patch_tree_top(pos.offset(0, -1));
        }

        let columns: BTreeSet<i32> = cleared.iter().map(|(cell, _)| cell.x).collect();
        let cleared_cells: HashSet<CellPos> = cleared.iter().map(|&(cell, _)| cell).collect();
        for &(_, edit) in &cleared {
            self.light.enqueue(edit);
        }
        for x in columns {
            for cell in self.skylight.rescan_column(&*self.terrain, x) {
                if !cleared_cells.contains(&cell) && self.skylight.is_lit(cell) {
                    self.light.enqueue(LightEdit::Open(cell));
                }
            }
        }
        let tiler = AutoTiler::new(self.atlas);
        for &(cell, _) in &cleared {
            tiler.refresh_neighbors(&*self.terrain, &mut *self.sprites, cell, &mut *self.rng);
        }

        if let Some(record) = record {
            drops.spawn(record.into_drop(pos, quantity));
        }
        if let Some((base, record, count)) = plant {
            drops.spawn(record.into_drop(base, count));
        }
        tracing::debug!(
            x = pos.x,
            y = pos.y,
            tile = ?removed,
            quantity,
            cleared = cleared.len(),
            "tile removed"
        );
        Ok(quantity)
    }

    /// Boolean form of [`TileEditController::try_remove`].
    pub fn remove<F: ItemDropFactory + ?Sized>(
        &mut self,
        pos: CellPos,
        tag: TileTag,
        drops: &mut F,
    ) -> bool {
        match self.try_remove(pos, tag, drops) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(%err, "remove rejected");
                false
            }
        }
    }

    /// The type being removed, or why the tag does not fit the cell.
    fn check_occupant(&self, pos: CellPos, tile: TileType, tag: TileTag) -> EditResult<TileType> {
        let empty = EditError::Empty {
            x: pos.x,
            y: pos.y,
            tag,
        };
        match tag {
            TileTag::Ground | TileTag::Decoration => {
                let fits = match tag {
                    TileTag::Ground => tile.is_solid(),
                    _ => tile.is_decoration(),
                };
                if fits {
                    Ok(tile)
                } else if tile.occupies_foreground() {
                    Err(EditError::TagMismatch { tile, tag })
                } else {
                    Err(empty)
                }
            }
            TileTag::Wall => {
                if !self.terrain.has_wall(pos) {
                    Err(empty)
                } else if tile.occupies_foreground() {
                    Err(EditError::TagMismatch { tile, tag })
                } else {
                    Ok(TileType::Wall)
                }
            }
        }
    }

    /// Clears one layer of a cell and forgets its bookkeeping.
    ///
    /// Returns the light edit the medium change calls for.
    fn clear(&mut self, pos: CellPos, layer: Layer) -> LightEdit {
        let before = self.terrain.medium(pos);
        match layer {
            Layer::Foreground => {
                let next = if self.terrain.has_wall(pos) {
                    TileType::Wall
                } else {
                    TileType::Air
                };
                self.terrain.set_tile(pos, next);
            }
            Layer::Background => {
                self.terrain.set_wall(pos, false);
                if self.terrain.tile_type(pos) == TileType::Wall {
                    self.terrain.set_tile(pos, TileType::Air);
                }
            }
        }
        self.sprites.set(layer, pos, None);
        let key = TileKey::new(pos, layer);
        self.metadata.remove(key);
        self.occupancy.remove(layer, pos);
        self.chunks.remove(key);

        let after = self.terrain.medium(pos);
        if before == Medium::Background || after == Medium::Background {
            LightEdit::Block(pos)
        } else {
            LightEdit::Open(pos)
        }
    }

    /// Recorded provenance of a cell, or an unplaced default from the atlas.
    fn drop_record(&self, pos: CellPos, layer: Layer, tile: TileType) -> Option<TileMetadata> {
        self.metadata.get(TileKey::new(pos, layer)).cloned().or_else(|| {
            self.atlas.template_for(tile).map(|template| TileMetadata {
                template,
                tile_type: tile,
                biome: String::new(),
                player_placed: false,
            })
        })
    }

    fn tree_part(&self, pos: CellPos) -> Option<TreePart> {
        if self.terrain.tile_type(pos) != TileType::Tree {
            return None;
        }
        self.sprites
            .get(Layer::Foreground, pos)
            .and_then(|sprite| TreePart::from_variant(sprite.variant))
    }

    fn within_radius(&self, origin: CellPos, pos: CellPos) -> bool {
        pos.chebyshev(origin) <= self.cluster_radius
    }

    fn cactus_segments(&self, origin: CellPos) -> Vec<CellPos> {
        self.flood(origin, TileType::Cactus, &NEIGHBORS_8)
    }

    /// Cells of `tile` reachable from `origin` through `steps`, excluding `origin`.
    fn flood(&self, origin: CellPos, tile: TileType, steps: &[(i32, i32)]) -> Vec<CellPos> {
        let mut visited = HashSet::from([origin]);
        let mut stack = vec![origin];
        let mut found = Vec::new();
        while let Some(pos) = stack.pop() {
            for &(dx, dy) in steps {
                let next = pos.offset(dx, dy);
                if self.terrain.tile_type(next) == tile
                    && self.within_radius(origin, next)
                    && visited.insert(next)
                {
                    found.push(next);
                    stack.push(next);
                }
            }
        }
        found
    }

    /// Tree segments carried away with `origin`: everything above it and the
    /// branches leading away from those cells.
    fn tree_segments(&self, origin: CellPos) -> Vec<CellPos> {
        let heading = match self.tree_part(origin) {
            Some(part) if part.is_left() => Heading::Left,
            Some(part) if part.is_right() => Heading::Right,
            _ => Heading::Up,
        };
        self.tree_segments_from(origin, heading)
    }

    fn tree_segments_from(&self, origin: CellPos, heading: Heading) -> Vec<CellPos> {
        let mut visited = HashSet::from([origin]);
        let mut stack = vec![(origin, heading)];
        let mut found = Vec::new();
        while let Some((pos, heading)) = stack.pop() {
            let steps: &[(i32, i32, Heading)] = match heading {
                Heading::Up => &[(0, 1, Heading::Up), (-1, 0, Heading::Left), (1, 0, Heading::Right)],
                Heading::Left => &[(-1, 0, Heading::Left)],
                Heading::Right => &[(1, 0, Heading::Right)],
            };
            for &(dx, dy, next_heading) in steps {
                let next = pos.offset(dx, dy);
                let Some(part) = self.tree_part(next) else {
                    continue;
                };
                let fits = match next_heading {
                    Heading::Up => !part.is_left() && !part.is_right(),
                    Heading::Left => part.is_left(),
                    Heading::Right => part.is_right(),
                };
                if fits && self.within_radius(origin, next) && visited.insert(next) {
                    found.push(next);
                    stack.push((next, next_heading));
                }
            }
        }
        found
    }

    /// Flora standing on a removed ground cell, including whole plants.
    fn standing_on(&self, pos: CellPos) -> Vec<CellPos> {
        let mut cells = match self.terrain.tile_type(pos) {
            TileType::SmallGrass | TileType::Flower => Vec::new(),
            TileType::Tree => self.tree_segments_from(pos, Heading::Up),
            TileType::Cactus => self.cactus_segments(pos),
            _ => return Vec::new(),
        };
        cells.insert(0, pos);
        cells
    }

    /// Gives the new topmost trunk segment a canopy cap.
    fn patch_tree_top(&mut self, pos: CellPos) {
        let Some(part) = self.tree_part(pos) else {
            return;
        };
        if !matches!(part, TreePart::Trunk | TreePart::TrunkBase) {
            return;
        }
        if let Some(current) = self.sprites.get(Layer::Foreground, pos) {
            self.sprites.set(
                Layer::Foreground,
                pos,
                Some(SpriteRef {
                    template: current.template,
                    variant: TreePart::Top.variant(),
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use tessaria_core::LightingSettings;

    const SIZE: usize = 24;
    const GROUND: i32 = 8;

    /// Owns everything a controller borrows.
    struct Fixture {
        terrain: TerrainGrid,
        sprites: SpriteLayers,
        occupancy: Occupancy,
        chunks: ChunkManager,
        metadata: MetadataStore,
        skylight: SkylightMask,
        light: LightEngine,
        rng: ChaCha8Rng,
        atlas: TileAtlas,
    }

    impl Fixture {
        /// Flat grass at `GROUND - 1` over dirt; nothing registered yet.
        fn flat() -> Self {
            let mut terrain = TerrainGrid::new(SIZE);
            for x in 0..SIZE as i32 {
                for y in 0..GROUND {
                    let tile = if y == GROUND - 1 {
                        TileType::Grass
                    } else {
                        TileType::Dirt
                    };
                    terrain.set_tile(CellPos::new(x, y), tile);
                }
            }
            let mut fixture = Self {
                skylight: SkylightMask::from_terrain(&terrain),
                terrain,
                sprites: SpriteLayers::new(SIZE),
                occupancy: Occupancy::new(),
                chunks: ChunkManager::partition(SIZE, 8).unwrap(),
                metadata: MetadataStore::new(),
                light: LightEngine::new(&LightingSettings::default()),
                rng: ChaCha8Rng::seed_from_u64(7),
                atlas: TileAtlas::standard(),
            };
            let cells: Vec<(CellPos, TileType)> = fixture
                .terrain
                .types()
                .iter()
                .filter(|(_, t)| t.occupies_foreground())
                .map(|(p, &t)| (p, t))
                .collect();
            for (pos, tile) in cells {
                fixture.register(pos, tile, None);
            }
            fixture
        }

        fn register(&mut self, pos: CellPos, tile: TileType, variant: Option<u16>) {
            let template = self.atlas.template_for(tile).unwrap();
            self.terrain.set_tile(pos, tile);
            self.sprites.set(
                Layer::Foreground,
                pos,
                Some(SpriteRef {
                    template,
                    variant: variant.unwrap_or(0),
                }),
            );
            let key = TileKey::new(pos, Layer::Foreground);
            self.occupancy.insert(Layer::Foreground, pos);
            self.chunks.insert(key);
            self.metadata.insert(
                key,
                TileMetadata {
                    template,
                    tile_type: tile,
                    biome: "grassland".to_owned(),
                    player_placed: false,
                },
            );
        }

        /// A trunk of `height` at `x` with a left branch on row 2 and a capped top.
        fn tree(&mut self, x: i32, height: i32) {
            for row in 0..height {
                let part = if row == 0 { TreePart::TrunkBase } else { TreePart::Trunk };
                self.register(CellPos::new(x, GROUND + row), TileType::Tree, Some(part.variant()));
            }
            self.register(CellPos::new(x - 1, GROUND + 2), TileType::Tree, Some(TreePart::BranchLeft.variant()));
            self.register(CellPos::new(x - 2, GROUND + 2), TileType::Tree, Some(TreePart::BranchEndLeft.variant()));
            let top = GROUND + height;
            self.register(CellPos::new(x, top), TileType::Tree, Some(TreePart::Top.variant()));
            self.register(CellPos::new(x - 1, top), TileType::Tree, Some(TreePart::TopLeft.variant()));
            self.register(CellPos::new(x + 1, top), TileType::Tree, Some(TreePart::TopRight.variant()));
            self.skylight = SkylightMask::from_terrain(&self.terrain);
        }

        fn controller(&mut self) -> TileEditController<'_> {
            TileEditController {
                terrain: &mut self.terrain,
                sprites: &mut self.sprites,
                occupancy: &mut self.occupancy,
                chunks: &mut self.chunks,
                metadata: &mut self.metadata,
                skylight: &mut self.skylight,
                light: &mut self.light,
                rng: &mut self.rng,
                atlas: &self.atlas,
                cluster_radius: 16,
            }
        }

        fn fg(&self, x: i32, y: i32) -> TileKey {
            TileKey::new(CellPos::new(x, y), Layer::Foreground)
        }
    }

    #[test]
    fn test_place_rejections_leave_world_untouched() {
        let mut fx = Fixture::flat();
        let stone = fx.atlas.template_for(TileType::Stone).unwrap();
        let before = fx.terrain.clone();
        let mut edit = fx.controller();

        assert_eq!(
            edit.try_place(CellPos::new(-1, 3), stone, TileType::Stone, TileTag::Ground, "g"),
            Err(EditError::OutOfBounds { x: -1, y: 3 })
        );
        assert_eq!(
            edit.try_place(CellPos::new(3, GROUND), stone, TileType::Stone, TileTag::Wall, "g"),
            Err(EditError::TagMismatch {
                tile: TileType::Stone,
                tag: TileTag::Wall
            })
        );
        assert_eq!(
            edit.try_place(CellPos::new(3, GROUND), TemplateId(999), TileType::Stone, TileTag::Ground, "g"),
            Err(EditError::UnknownTemplate(TemplateId(999)))
        );
        assert!(matches!(
            edit.try_place(CellPos::new(3, GROUND - 1), stone, TileType::Stone, TileTag::Ground, "g"),
            Err(EditError::Occupied { .. })
        ));
        assert_eq!(fx.terrain, before);
        assert_eq!(fx.light.pending(), 0);
    }

    #[test]
    fn test_place_registers_everything() {
        let mut fx = Fixture::flat();
        let stone = fx.atlas.template_for(TileType::Stone).unwrap();
        let pos = CellPos::new(5, GROUND);
        assert!(fx.controller().place(pos, stone, TileType::Stone, TileTag::Ground, "desert"));

        assert_eq!(fx.terrain.tile_type(pos), TileType::Stone);
        assert!(fx.occupancy.is_occupied(Layer::Foreground, pos));
        assert!(fx.chunks.contains(fx.fg(5, GROUND)));
        let record = fx.metadata.get(fx.fg(5, GROUND)).unwrap();
        assert!(record.player_placed);
        assert_eq!(record.biome, "desert");
        assert!(fx.sprites.get(Layer::Foreground, pos).is_some());
        // The grass below lost its sky.
        assert!(!fx.skylight.is_lit(CellPos::new(5, GROUND - 1)));
        assert!(fx.light.pending() >= 2);
    }

    #[test]
    fn test_wall_round_trip() {
        let mut fx = Fixture::flat();
        let wall = fx.atlas.template_for(TileType::Wall).unwrap();
        let pos = CellPos::new(4, GROUND + 1);
        let mut drops = Vec::new();

        assert!(fx.controller().place(pos, wall, TileType::Wall, TileTag::Wall, "g"));
        assert!(fx.terrain.has_wall(pos));
        assert_eq!(fx.terrain.tile_type(pos), TileType::Wall);
        assert!(fx.sprites.get(Layer::Background, pos).is_some());
        assert!(fx.skylight.is_lit(pos));

        assert!(!fx.controller().remove(pos, TileTag::Ground, &mut drops));
        assert!(fx.controller().remove(pos, TileTag::Wall, &mut drops));
        assert!(!fx.terrain.has_wall(pos));
        assert_eq!(fx.terrain.tile_type(pos), TileType::Air);
        assert!(fx.metadata.get(TileKey::new(pos, Layer::Background)).is_none());
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].tile_type, TileType::Wall);
        assert!(drops[0].player_placed);
    }

    #[test]
    fn test_ground_over_wall_clears_to_wall() {
        let mut fx = Fixture::flat();
        let wall = fx.atlas.template_for(TileType::Wall).unwrap();
        let dirt = fx.atlas.template_for(TileType::Dirt).unwrap();
        let pos = CellPos::new(9, GROUND + 1);
        let mut drops = Vec::new();
        let mut edit = fx.controller();
        assert!(edit.place(pos, wall, TileType::Wall, TileTag::Wall, "g"));
        assert!(edit.place(pos, dirt, TileType::Dirt, TileTag::Ground, "g"));
        assert!(matches!(
            edit.try_remove(pos, TileTag::Wall, &mut drops),
            Err(EditError::TagMismatch { .. })
        ));
        assert_eq!(edit.try_remove(pos, TileTag::Ground, &mut drops), Ok(1));
        assert_eq!(fx.terrain.tile_type(pos), TileType::Wall);
        assert!(fx.terrain.has_wall(pos));
        assert!(!fx.occupancy.is_occupied(Layer::Foreground, pos));
        assert!(fx.occupancy.is_occupied(Layer::Background, pos));
    }

    #[test]
    fn test_remove_requires_matching_occupant() {
        let mut fx = Fixture::flat();
        let mut drops = Vec::new();
        let mut edit = fx.controller();
        assert_eq!(
            edit.try_remove(CellPos::new(2, GROUND + 3), TileTag::Ground, &mut drops),
            Err(EditError::Empty {
                x: 2,
                y: GROUND + 3,
                tag: TileTag::Ground
            })
        );
        assert!(matches!(
            edit.try_remove(CellPos::new(2, GROUND - 1), TileTag::Decoration, &mut drops),
            Err(EditError::TagMismatch { .. })
        ));
        assert!(drops.is_empty());
    }

    #[test]
    fn test_chopping_trunk_takes_everything_above() {
        let mut fx = Fixture::flat();
        fx.tree(10, 5);
        let mut drops = Vec::new();
        let cut = CellPos::new(10, GROUND + 2);

        let quantity = fx.controller().try_remove(cut, TileTag::Decoration, &mut drops).unwrap();
        // The cut cell, branch and end beside it, trunk x2 and top above, both canopies.
        assert_eq!(quantity, 8);
        for y in GROUND + 2..=GROUND + 5 {
            assert_eq!(fx.terrain.tile_type(CellPos::new(10, y)), TileType::Air, "y {y}");
        }
        assert_eq!(fx.terrain.tile_type(CellPos::new(8, GROUND + 2)), TileType::Air);
        assert_eq!(fx.terrain.tile_type(CellPos::new(11, GROUND + 5)), TileType::Air);
        assert!(fx.metadata.get(fx.fg(9, GROUND + 5)).is_none());

        // Stump keeps its lower trunk and gets a fresh cap.
        let stump = CellPos::new(10, GROUND + 1);
        assert_eq!(fx.terrain.tile_type(stump), TileType::Tree);
        assert_eq!(
            fx.sprites.get(Layer::Foreground, stump).map(|s| s.variant),
            Some(TreePart::Top.variant())
        );
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].quantity, 8);
        assert_eq!(drops[0].biome, "grassland");
    }

    #[test]
    fn test_cutting_branch_keeps_trunk() {
        let mut fx = Fixture::flat();
        fx.tree(10, 5);
        let mut drops = Vec::new();
        let quantity = fx
            .controller()
            .try_remove(CellPos::new(9, GROUND + 2), TileTag::Decoration, &mut drops)
            .unwrap();
        assert_eq!(quantity, 2);
        assert_eq!(fx.terrain.tile_type(CellPos::new(8, GROUND + 2)), TileType::Air);
        assert_eq!(fx.terrain.tile_type(CellPos::new(10, GROUND + 2)), TileType::Tree);
        assert_eq!(fx.terrain.tile_type(CellPos::new(10, GROUND + 5)), TileType::Tree);
        assert_eq!(drops[0].quantity, 2);
    }

    #[test]
    fn test_drop_quantity_counts_removed_segments() {
        let cuts = [
            CellPos::new(9, GROUND + 2),
            CellPos::new(9, GROUND + 5),
            CellPos::new(11, GROUND + 5),
            CellPos::new(10, GROUND + 5),
            CellPos::new(10, GROUND + 3),
            CellPos::new(10, GROUND),
        ];
        for cut in cuts {
            let mut fx = Fixture::flat();
            fx.tree(10, 5);
            let count_trees = |terrain: &TerrainGrid| {
                terrain
                    .types()
                    .iter()
                    .filter(|&(_, &t)| t == TileType::Tree)
                    .count() as u32
            };
            let before = count_trees(&fx.terrain);
            let mut drops = Vec::new();
            let quantity = fx
                .controller()
                .try_remove(cut, TileTag::Decoration, &mut drops)
                .unwrap();
            let removed = before - count_trees(&fx.terrain);
            assert_eq!(quantity, removed, "cut at {cut:?}");
            assert_eq!(drops.len(), 1);
            assert_eq!(drops[0].quantity, removed);
        }
    }

    #[test]
    fn test_digging_under_tree_fells_it() {
        let mut fx = Fixture::flat();
        fx.tree(10, 4);
        let mut drops = Vec::new();
        assert!(fx
            .controller()
            .remove(CellPos::new(10, GROUND - 1), TileTag::Ground, &mut drops));
        let remaining = fx
            .terrain
            .types()
            .iter()
            .filter(|&(_, &t)| t == TileType::Tree)
            .count();
        assert_eq!(remaining, 0);
        assert_eq!(drops.len(), 2);
        assert_eq!(drops[0].tile_type, TileType::Grass);
        assert_eq!(drops[0].quantity, 1);
        // Trunk x4, branch and end, top with both canopies.
        assert_eq!(drops[1].tile_type, TileType::Tree);
        assert_eq!(drops[1].pos, CellPos::new(10, GROUND));
        assert_eq!(drops[1].quantity, 9);
        assert_eq!(drops[1].biome, "grassland");
        assert!(fx.skylight.is_lit(CellPos::new(10, GROUND - 2)));
    }

    #[test]
    fn test_cactus_flood_removal() {
        let mut fx = Fixture::flat();
        for y in GROUND..GROUND + 3 {
            fx.register(CellPos::new(5, y), TileType::Cactus, None);
        }
        fx.register(CellPos::new(6, GROUND + 1), TileType::Cactus, None);
        fx.register(CellPos::new(12, GROUND), TileType::Cactus, None);
        let mut drops = Vec::new();

        let quantity = fx
            .controller()
            .try_remove(CellPos::new(5, GROUND + 2), TileTag::Decoration, &mut drops)
            .unwrap();
        assert_eq!(quantity, 4);
        for pos in [
            CellPos::new(5, GROUND),
            CellPos::new(5, GROUND + 1),
            CellPos::new(6, GROUND + 1),
        ] {
            assert_eq!(fx.terrain.tile_type(pos), TileType::Air);
        }
        assert_eq!(fx.terrain.tile_type(CellPos::new(12, GROUND)), TileType::Cactus);
    }

    #[test]
    fn test_flora_on_removed_ground_goes_too() {
        let mut fx = Fixture::flat();
        fx.register(CellPos::new(3, GROUND), TileType::Flower, None);
        let mut drops = Vec::new();
        assert!(fx
            .controller()
            .remove(CellPos::new(3, GROUND - 1), TileTag::Ground, &mut drops));
        assert_eq!(fx.terrain.tile_type(CellPos::new(3, GROUND)), TileType::Air);
        assert!(fx.metadata.get(fx.fg(3, GROUND)).is_none());
        assert!(!fx.chunks.contains(fx.fg(3, GROUND)));
        assert_eq!(drops.len(), 2);
        assert_eq!(drops[1].tile_type, TileType::Flower);
        assert_eq!(drops[1].pos, CellPos::new(3, GROUND));
        assert_eq!(drops[1].quantity, 1);
    }
}
