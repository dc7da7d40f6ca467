//! # Chunk Manager
//!
//! The world is split into fixed-width vertical slices. Every tile belongs to
//! the chunk covering its x; chunks are created once and never resized.
//!
//! ```text
//! x:  0 ........ 15 | 16 ....... 31 | 32 ... N-1
//!     [ chunk 0    ] [ chunk 1     ] [ chunk 2  ]
//! ```
//!
//! Activation is recomputed every tick from the camera: a chunk is active
//! while its horizontal center lies within the camera half-extent plus a
//! buffer.

use std::collections::BTreeSet;

use tessaria_core::{CellPos, Layer};

/// One tile object: a cell on a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Cell position.
    pub pos: CellPos,
    /// Occupied layer.
    pub layer: Layer,
}

impl TileKey {
    /// Creates a key.
    #[inline]
    #[must_use]
    pub const fn new(pos: CellPos, layer: Layer) -> Self {
        Self { pos, layer }
    }
}

/// Horizontal camera window, in cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// Camera center x.
    pub center_x: f32,
    /// Half the visible width.
    pub half_extent: f32,
}

/// An activation change reported by [`ChunkManager::update_activation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkToggle {
    /// Chunk index.
    pub chunk: usize,
    /// New state.
    pub active: bool,
}

/// A vertical slice of the world.
#[derive(Clone, Debug)]
pub struct Chunk {
    start_x: i32,
    width: i32,
    tiles: BTreeSet<TileKey>,
    active: bool,
}

impl Chunk {
    /// First column covered.
    #[must_use]
    pub const fn start_x(&self) -> i32 {
        self.start_x
    }

    /// Number of columns covered. The last chunk may be narrower.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Horizontal center in cells.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.start_x as f32 + self.width as f32 / 2.0
    }

    /// Whether the chunk is currently active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Tile objects in this chunk.
    pub fn tiles(&self) -> impl Iterator<Item = &TileKey> {
        self.tiles.iter()
    }

    /// Number of tile objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if the chunk holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Owns every chunk of a world.
#[derive(Clone, Debug)]
pub struct ChunkManager {
    chunk_size: usize,
    world_size: usize,
    chunks: Vec<Chunk>,
}

impl ChunkManager {
    /// Creates `ceil(world_size / chunk_size)` inactive chunks.
    ///
    /// Returns None for a zero chunk size.
    #[must_use]
    pub fn partition(world_size: usize, chunk_size: usize) -> Option<Self> {
        if chunk_size == 0 {
            return None;
        }
        let count = world_size.div_ceil(chunk_size);
        let chunks = (0..count)
            .map(|i| {
                let start = i * chunk_size;
                Chunk {
                    start_x: start as i32,
                    width: chunk_size.min(world_size - start) as i32,
                    tiles: BTreeSet::new(),
                    active: false,
                }
            })
            .collect();
        Some(Self {
            chunk_size,
            world_size,
            chunks,
        })
    }

    /// Chunk covering column `x`.
    #[inline]
    #[must_use]
    pub fn chunk_index(&self, x: i32) -> Option<usize> {
        if x < 0 || x as usize >= self.world_size {
            return None;
        }
        Some(x as usize / self.chunk_size)
    }

    /// Registers a tile. Returns false if out of range or already present.
    pub fn insert(&mut self, key: TileKey) -> bool {
        match self.chunk_index(key.pos.x) {
            Some(i) => self.chunks[i].tiles.insert(key),
            None => false,
        }
    }

    /// Unregisters a tile. Returns false if it was not registered.
    pub fn remove(&mut self, key: TileKey) -> bool {
        match self.chunk_index(key.pos.x) {
            Some(i) => self.chunks[i].tiles.remove(&key),
            None => false,
        }
    }

    /// Returns true if the tile is registered.
    #[must_use]
    pub fn contains(&self, key: TileKey) -> bool {
        self.chunk_index(key.pos.x)
            .is_some_and(|i| self.chunks[i].tiles.contains(&key))
    }

    /// Recomputes activation against `camera` and reports the chunks that flipped.
    pub fn update_activation(&mut self, camera: CameraView, buffer: f32) -> Vec<ChunkToggle> {
        let reach = camera.half_extent + buffer;
        let mut toggles = Vec::new();
        for (i, chunk) in self.chunks.iter_mut().enumerate() {
            let active = (chunk.center_x() - camera.center_x).abs() <= reach;
            if chunk.active != active {
                chunk.active = active;
                toggles.push(ChunkToggle { chunk: i, active });
            }
        }
        if !toggles.is_empty() {
            tracing::debug!(toggled = toggles.len(), "chunk activation changed");
        }
        toggles
    }

    /// All chunks in x order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Indices of the active chunks.
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.active)
            .map(|(i, _)| i)
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the world has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: i32) -> TileKey {
        TileKey::new(CellPos::new(x, 0), Layer::Foreground)
    }

    #[test]
    fn test_partition_counts() {
        assert!(ChunkManager::partition(100, 0).is_none());
        let chunks = ChunkManager::partition(100, 16).unwrap();
        assert_eq!(chunks.len(), 7);
        assert_eq!(chunks.chunks()[6].width(), 4);
        assert_eq!(ChunkManager::partition(64, 16).unwrap().len(), 4);
        assert!(ChunkManager::partition(0, 16).unwrap().is_empty());
    }

    #[test]
    fn test_tiles_land_in_their_column_chunk() {
        let mut chunks = ChunkManager::partition(64, 16).unwrap();
        assert!(chunks.insert(key(0)));
        assert!(chunks.insert(key(15)));
        assert!(chunks.insert(key(16)));
        assert!(!chunks.insert(key(16)));
        assert!(!chunks.insert(key(64)));
        assert_eq!(chunks.chunks()[0].len(), 2);
        assert_eq!(chunks.chunks()[1].len(), 1);
        assert!(chunks.remove(key(15)));
        assert!(!chunks.contains(key(15)));
        assert!(!chunks.remove(key(15)));
    }

    #[test]
    fn test_activation_toggles_once() {
        let mut chunks = ChunkManager::partition(64, 16).unwrap();
        let camera = CameraView {
            center_x: 8.0,
            half_extent: 10.0,
        };
        // Centers: 8, 24, 40, 56. Reach 10 + 8 = 18.
        let toggles = chunks.update_activation(camera, 8.0);
        assert_eq!(
            toggles,
            vec![
                ChunkToggle { chunk: 0, active: true },
                ChunkToggle { chunk: 1, active: true },
            ]
        );
        assert!(chunks.update_activation(camera, 8.0).is_empty());

        let moved = CameraView {
            center_x: 56.0,
            half_extent: 10.0,
        };
        let toggles = chunks.update_activation(moved, 8.0);
        assert_eq!(toggles.len(), 4);
        assert_eq!(chunks.active().collect::<Vec<_>>(), vec![2, 3]);
    }
}
