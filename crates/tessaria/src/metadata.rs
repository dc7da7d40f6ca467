//! # Tile Metadata and Drops
//!
//! Every occupied cell and layer carries a provenance record. Records are
//! created when a cell becomes occupied (by generation or by an edit), removed
//! when it is cleared, and read when the cell's item drop is built.

use std::collections::{BTreeSet, HashMap};

use tessaria_core::{CellPos, Layer, TemplateId, TileType};

use crate::chunk::TileKey;

/// Provenance of one occupied cell and layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMetadata {
    /// Template the tile was drawn from.
    pub template: TemplateId,
    /// Terrain type written to the cell.
    pub tile_type: TileType,
    /// Name of the biome the tile came from.
    pub biome: String,
    /// Placed by an edit rather than generated.
    pub player_placed: bool,
}

impl TileMetadata {
    /// Drop of `quantity` items at `pos` carrying this provenance.
    #[must_use]
    pub fn into_drop(self, pos: CellPos, quantity: u32) -> ItemDrop {
        ItemDrop {
            pos,
            template: self.template,
            tile_type: self.tile_type,
            biome: self.biome,
            quantity,
            player_placed: self.player_placed,
        }
    }
}

/// Metadata records keyed by cell and layer.
#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
    records: HashMap<TileKey, TileMetadata>,
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record, replacing any previous one.
    pub fn insert(&mut self, key: TileKey, record: TileMetadata) {
        self.records.insert(key, record);
    }

    /// Record for `key`.
    #[must_use]
    pub fn get(&self, key: TileKey) -> Option<&TileMetadata> {
        self.records.get(&key)
    }

    /// Removes and returns the record for `key`.
    pub fn remove(&mut self, key: TileKey) -> Option<TileMetadata> {
        self.records.remove(&key)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-layer lists of occupied cells.
#[derive(Clone, Debug, Default)]
pub struct Occupancy {
    foreground: BTreeSet<CellPos>,
    background: BTreeSet<CellPos>,
}

impl Occupancy {
    /// Creates empty lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut(&mut self, layer: Layer) -> &mut BTreeSet<CellPos> {
        match layer {
            Layer::Foreground => &mut self.foreground,
            Layer::Background => &mut self.background,
        }
    }

    /// The occupied cells of `layer`, in position order.
    #[must_use]
    pub fn list(&self, layer: Layer) -> &BTreeSet<CellPos> {
        match layer {
            Layer::Foreground => &self.foreground,
            Layer::Background => &self.background,
        }
    }

    /// Returns true if `layer` is occupied at `pos`.
    #[must_use]
    pub fn is_occupied(&self, layer: Layer, pos: CellPos) -> bool {
        self.list(layer).contains(&pos)
    }

    /// Marks a cell occupied. Returns false if it already was.
    pub fn insert(&mut self, layer: Layer, pos: CellPos) -> bool {
        self.list_mut(layer).insert(pos)
    }

    /// Marks a cell free. Returns false if it was not occupied.
    pub fn remove(&mut self, layer: Layer, pos: CellPos) -> bool {
        self.list_mut(layer).remove(&pos)
    }
}

/// An item produced by removing a tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemDrop {
    /// Where the tile was removed.
    pub pos: CellPos,
    /// Template of the removed tile.
    pub template: TemplateId,
    /// Terrain type of the removed tile.
    pub tile_type: TileType,
    /// Biome the tile came from.
    pub biome: String,
    /// Number of items: 1, or the tree or cactus segments taken.
    pub quantity: u32,
    /// Whether the removed tile had been placed by an edit.
    pub player_placed: bool,
}

/// Receives item drops from tile removals.
pub trait ItemDropFactory {
    /// Delivers one drop.
    fn spawn(&mut self, drop: ItemDrop);
}

impl ItemDropFactory for Vec<ItemDrop> {
    fn spawn(&mut self, drop: ItemDrop) {
        self.push(drop);
    }
}
