//! # Light Propagation
//!
//! Approximate per-cell light: each step into one of the 8 neighbors
//! multiplies the intensity by the decay of the cell it leaves, raised to the
//! step length (1 or sqrt 2).
//!
//! ## Mediums
//!
//! | medium | cells | decay | write rule |
//! |---|---|---|---|
//! | Opaque | ground, ores | ground | plain |
//! | Open | air, flora, trees | air | plain; sky sources write sky intensity |
//! | Background | `Wall` cells | air | `min(candidate * boost, predecessor)` |
//!
//! ## Batching
//!
//! Edits are queued as [`LightEdit`]s and applied in FIFO order by
//! [`LightEngine::drain`], once per tick. Each drain returns a
//! [`LightCommit`] with exactly the cells whose value changed.
//!
//! ## Worklists
//!
//! Relaxation is an explicit FIFO worklist. An entry only expands while its
//! depth is below the light radius, and a neighbor is only written (and
//! queued) when the candidate strictly improves it. Reaching a sky source
//! writes the sky intensity and restarts the depth count.
//!
//! Every lit cell stores the depth it was reached at. Light that passed
//! through a cell never travels more than the light radius beyond it, so a
//! retraction only has to rebuild the Chebyshev box of that radius: the box is
//! cleared, then refilled from the sky sources and emitters inside it and from
//! the ring just outside it, each at its stored depth.

use std::collections::{BTreeMap, VecDeque};

use tessaria_core::{CellPos, DirtyCells, Grid, LightingSettings, Medium, TerrainGrid, NEIGHBORS_8};

use crate::skylight::SkylightMask;

/// A queued light change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightEdit {
    /// The cell became blocked or changed medium: retract its light.
    Block(CellPos),
    /// The cell was opened by a removal: re-expand light into it.
    Open(CellPos),
}

/// Inclusive bounding box of a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    /// Bottom-left corner.
    pub min: CellPos,
    /// Top-right corner.
    pub max: CellPos,
}

/// Cells changed since the previous commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LightCommit {
    /// Changed cells in first-touch order.
    pub cells: Vec<CellPos>,
    /// Bounding box of `cells`, None when empty.
    pub bounds: Option<CellRect>,
}

impl LightCommit {
    /// Returns true if nothing changed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// World-sized light buffer, the depth each value was reached at, and the
/// dirty list.
#[derive(Clone, Debug)]
pub struct LightField {
    values: Grid<f32>,
    depths: Grid<u32>,
    dirty: DirtyCells,
}

impl LightField {
    /// Creates an all-dark field.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            values: Grid::new(size, size, 0.0),
            depths: Grid::new(size, size, 0),
            dirty: DirtyCells::new(size, size),
        }
    }

    /// Intensity at `pos`; 0.0 when out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: CellPos) -> f32 {
        self.values.value_or(pos.x, pos.y, 0.0)
    }

    /// Steps from the source that lit `pos`. None for dark or out-of-bounds cells.
    #[inline]
    #[must_use]
    pub fn depth(&self, pos: CellPos) -> Option<u32> {
        if self.get(pos) > 0.0 {
            self.depths.get(pos.x, pos.y).copied()
        } else {
            None
        }
    }

    /// Writes an intensity as a source (depth 0), clamped to `[0, 1]`.
    /// Marks the cell dirty if it changed.
    pub fn set(&mut self, pos: CellPos, value: f32) {
        self.write(pos, value, 0);
    }

    fn write(&mut self, pos: CellPos, value: f32, depth: u32) {
        let value = value.clamp(0.0, 1.0);
        if let Some(cell) = self.values.get_mut(pos.x, pos.y) {
            if *cell != value {
                *cell = value;
                self.dirty.mark(pos);
            }
            self.depths.set(pos.x, pos.y, depth);
        }
    }

    /// Returns true if `pos` lies inside the field.
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: CellPos) -> bool {
        self.values.contains(pos.x, pos.y)
    }

    /// Takes every cell changed since the last call.
    pub fn take_dirty(&mut self) -> LightCommit {
        let cells = self.dirty.take();
        let bounds = cells.iter().fold(None, |acc: Option<CellRect>, &pos| {
            Some(match acc {
                None => CellRect { min: pos, max: pos },
                Some(rect) => CellRect {
                    min: CellPos::new(rect.min.x.min(pos.x), rect.min.y.min(pos.y)),
                    max: CellPos::new(rect.max.x.max(pos.x), rect.max.y.max(pos.y)),
                },
            })
        });
        LightCommit { cells, bounds }
    }

    /// The raw buffer.
    #[inline]
    #[must_use]
    pub const fn values(&self) -> &Grid<f32> {
        &self.values
    }

    /// The raw buffer as bytes, row-major, native-endian `f32`.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.values.as_slice())
    }
}

/// Read-only world state the engine consults.
#[derive(Clone, Copy)]
pub struct LightContext<'a> {
    terrain: &'a TerrainGrid,
    skylight: &'a SkylightMask,
}

impl<'a> LightContext<'a> {
    /// Bundles terrain and skylight.
    #[must_use]
    pub const fn new(terrain: &'a TerrainGrid, skylight: &'a SkylightMask) -> Self {
        Self { terrain, skylight }
    }

    /// Medium of a cell.
    #[inline]
    #[must_use]
    pub fn medium(&self, pos: CellPos) -> Medium {
        self.terrain.medium(pos)
    }

    /// A sky-lit cell with an open medium.
    #[inline]
    #[must_use]
    pub fn is_sky_source(&self, pos: CellPos) -> bool {
        self.terrain.contains(pos)
            && self.skylight.is_lit(pos)
            && self.terrain.medium(pos) == Medium::Open
    }
}

/// Worklist entry: a written cell waiting to expand.
#[derive(Clone, Copy, Debug)]
struct Pending {
    pos: CellPos,
    value: f32,
    depth: u32,
}

/// Batched light relaxation and retraction.
#[derive(Clone, Debug)]
pub struct LightEngine {
    radius: u32,
    /// `[decay^1, decay^sqrt2]` through open and background cells.
    air: [f32; 2],
    /// `[decay^1, decay^sqrt2]` through opaque cells.
    ground: [f32; 2],
    wall_boost: f32,
    sky: f32,
    /// Lasting light sources placed by the host (torches, lava, ...).
    emitters: BTreeMap<CellPos, f32>,
    queue: VecDeque<LightEdit>,
}

impl LightEngine {
    /// Creates an engine with the given tuning.
    #[must_use]
    pub fn new(settings: &LightingSettings) -> Self {
        let powers = |d: f32| [d, d.powf(std::f32::consts::SQRT_2)];
        Self {
            radius: settings.radius,
            air: powers(settings.air_decay),
            ground: powers(settings.ground_decay),
            wall_boost: settings.wall_boost,
            sky: settings.sky_intensity.clamp(0.0, 1.0),
            emitters: BTreeMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Intensity written into sky sources.
    #[inline]
    #[must_use]
    pub const fn sky_intensity(&self) -> f32 {
        self.sky
    }

    /// Maximum propagation depth.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of queued edits.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queues an edit for the next [`LightEngine::drain`].
    pub fn enqueue(&mut self, edit: LightEdit) {
        self.queue.push_back(edit);
    }

    /// Applies every queued edit in order and commits the changed cells.
    pub fn drain(&mut self, field: &mut LightField, ctx: &LightContext<'_>) -> LightCommit {
        let edits = self.queue.len();
        while let Some(edit) = self.queue.pop_front() {
            match edit {
                LightEdit::Block(pos) => self.retract(field, ctx, pos),
                LightEdit::Open(pos) => self.open(field, ctx, pos),
            }
        }
        let commit = field.take_dirty();
        tracing::trace!(edits, changed = commit.cells.len(), "light drained");
        commit
    }

    /// Registers a lasting source at `pos` and seeds it.
    ///
    /// Unlike [`LightEngine::seed`], emitters survive later retractions around them.
    pub fn add_emitter(
        &mut self,
        field: &mut LightField,
        ctx: &LightContext<'_>,
        pos: CellPos,
        intensity: f32,
    ) {
        if !field.contains(pos) {
            return;
        }
        let intensity = intensity.clamp(0.0, 1.0);
        self.emitters.insert(pos, intensity);
        self.seed(field, ctx, pos, intensity);
    }

    /// Forgets the emitter at `pos` and queues the retraction of its light.
    ///
    /// Returns false if no emitter was registered there.
    pub fn remove_emitter(&mut self, pos: CellPos) -> bool {
        let removed = self.emitters.remove(&pos).is_some();
        if removed {
            self.enqueue(LightEdit::Block(pos));
        }
        removed
    }

    /// Raises `pos` to `intensity` if that is brighter, then relaxes outward.
    ///
    /// A no-op when the cell is already at least as bright. The seed is
    /// transient: a later retraction nearby only keeps it if it is a sky
    /// source or an emitter.
    pub fn seed(&self, field: &mut LightField, ctx: &LightContext<'_>, pos: CellPos, intensity: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        if !field.contains(pos) || intensity <= field.get(pos) {
            return;
        }
        field.write(pos, intensity, 0);
        self.relax(
            field,
            ctx,
            VecDeque::from([Pending {
                pos,
                value: intensity,
                depth: 0,
            }]),
        );
    }

    /// Removes the light that flowed through `origin`, then refills the
    /// retraction box from the sources that are still valid.
    pub fn retract(&self, field: &mut LightField, ctx: &LightContext<'_>, origin: CellPos) {
        if !field.contains(origin) {
            return;
        }
        let radius = self.radius as i32;
        let mut work = VecDeque::new();

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let pos = origin.offset(dx, dy);
                if !field.contains(pos) {
                    continue;
                }
                if ctx.is_sky_source(pos) {
                    field.write(pos, self.sky, 0);
                    work.push_back(Pending {
                        pos,
                        value: self.sky,
                        depth: 0,
                    });
                } else {
                    field.write(pos, 0.0, 0);
                }
            }
        }

        for (&pos, &intensity) in &self.emitters {
            if pos.chebyshev(origin) <= radius && intensity > field.get(pos) {
                field.write(pos, intensity, 0);
                work.push_back(Pending {
                    pos,
                    value: intensity,
                    depth: 0,
                });
            }
        }

        // The ring just outside the box cannot hold light that passed through
        // `origin`; it refills the box at its stored depth.
        let ring = radius + 1;
        let edge = (-ring..=ring)
            .flat_map(|d| [origin.offset(d, -ring), origin.offset(d, ring)])
            .chain((-radius..=radius).flat_map(|d| [origin.offset(-ring, d), origin.offset(ring, d)]));
        for pos in edge {
            if let Some(depth) = field.depth(pos) {
                work.push_back(Pending {
                    pos,
                    value: field.get(pos),
                    depth,
                });
            }
        }

        self.relax(field, ctx, work);
    }

    /// Re-expands light into a freshly opened cell.
    pub fn open(&self, field: &mut LightField, ctx: &LightContext<'_>, pos: CellPos) {
        if !field.contains(pos) {
            return;
        }
        let (best, best_depth) = if ctx.is_sky_source(pos) {
            (self.sky, 0)
        } else {
            let background = ctx.medium(pos) == Medium::Background;
            NEIGHBORS_8
                .iter()
                .filter_map(|&(dx, dy)| {
                    let from = pos.offset(dx, dy);
                    let depth = field.depth(from).filter(|&d| d < self.radius)?;
                    let value = field.get(from);
                    let candidate = self.decay(ctx.medium(from), dx != 0 && dy != 0) * value;
                    let candidate = if background {
                        (candidate * self.wall_boost).min(value)
                    } else {
                        candidate
                    };
                    Some((candidate, depth + 1))
                })
                .fold((0.0f32, 0), |best, offer| if offer.0 > best.0 { offer } else { best })
        };
        let (value, depth) = match field.depth(pos) {
            Some(current) if field.get(pos) >= best => (field.get(pos), current),
            _ => (best.clamp(0.0, 1.0), best_depth),
        };
        if value <= 0.0 {
            return;
        }
        field.write(pos, value, depth);
        self.relax(field, ctx, VecDeque::from([Pending { pos, value, depth }]));
    }

    #[inline]
    fn decay(&self, medium: Medium, diagonal: bool) -> f32 {
        let table = match medium {
            Medium::Opaque => &self.ground,
            Medium::Open | Medium::Background => &self.air,
        };
        table[usize::from(diagonal)]
    }

    /// Expands written cells until nothing improves.
    fn relax(&self, field: &mut LightField, ctx: &LightContext<'_>, mut work: VecDeque<Pending>) {
        while let Some(entry) = work.pop_front() {
            if entry.depth >= self.radius || field.get(entry.pos) > entry.value {
                continue;
            }
            let medium = ctx.medium(entry.pos);
            for &(dx, dy) in &NEIGHBORS_8 {
                let next = entry.pos.offset(dx, dy);
                if !field.contains(next) {
                    continue;
                }
                let (candidate, depth) = if ctx.is_sky_source(next) {
                    (self.sky, 0)
                } else {
                    let mut candidate = self.decay(medium, dx != 0 && dy != 0) * entry.value;
                    if ctx.medium(next) == Medium::Background {
                        candidate = (candidate * self.wall_boost).min(entry.value);
                    }
                    (candidate, entry.depth + 1)
                };
                let candidate = candidate.clamp(0.0, 1.0);
                if candidate > field.get(next) {
                    field.write(next, candidate, depth);
                    work.push_back(Pending {
                        pos: next,
                        value: candidate,
                        depth,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessaria_core::TileType;

    fn settings() -> LightingSettings {
        LightingSettings::default()
    }

    /// A fully enclosed cave: no sky anywhere.
    fn cave(size: usize) -> (TerrainGrid, SkylightMask) {
        let mut terrain = TerrainGrid::new(size);
        for x in 0..size as i32 {
            terrain.set_tile(CellPos::new(x, size as i32 - 1), TileType::Stone);
        }
        let skylight = SkylightMask::from_terrain(&terrain);
        (terrain, skylight)
    }

    #[test]
    fn test_seed_decays_with_distance() {
        let (terrain, skylight) = cave(21);
        let ctx = LightContext::new(&terrain, &skylight);
        let engine = LightEngine::new(&settings());
        let mut field = LightField::new(21);
        let center = CellPos::new(10, 10);
        engine.seed(&mut field, &ctx, center, 1.0);

        assert!((field.get(center) - 1.0).abs() < f32::EPSILON);
        assert!((field.get(center.offset(1, 0)) - 0.85).abs() < 1e-6);
        let diagonal = 0.85f32.powf(std::f32::consts::SQRT_2);
        assert!((field.get(center.offset(1, 1)) - diagonal).abs() < 1e-6);
        // Radius 7: nothing reaches 8 cells away.
        assert_eq!(field.get(center.offset(8, 0)), 0.0);
        assert!(field.get(center.offset(7, 0)) > 0.0);
    }

    #[test]
    fn test_seed_is_idempotent_against_brighter_cells() {
        let (terrain, skylight) = cave(9);
        let ctx = LightContext::new(&terrain, &skylight);
        let engine = LightEngine::new(&settings());
        let mut field = LightField::new(9);
        engine.seed(&mut field, &ctx, CellPos::new(4, 4), 1.0);
        field.take_dirty();

        engine.seed(&mut field, &ctx, CellPos::new(4, 4), 1.0);
        engine.seed(&mut field, &ctx, CellPos::new(4, 4), 0.5);
        assert!(field.take_dirty().is_empty());
    }

    #[test]
    fn test_retract_then_refill() {
        let (mut terrain, skylight) = cave(21);
        let mut engine = LightEngine::new(&settings());
        let mut field = LightField::new(21);
        let lamp = CellPos::new(5, 10);
        {
            let ctx = LightContext::new(&terrain, &skylight);
            engine.add_emitter(&mut field, &ctx, lamp, 1.0);
        }
        let before = field.get(CellPos::new(7, 10));

        // Block the cell between the lamp and the far side.
        terrain.set_tile(CellPos::new(6, 10), TileType::Stone);
        let ctx = LightContext::new(&terrain, &skylight);
        engine.retract(&mut field, &ctx, CellPos::new(6, 10));

        assert!((field.get(lamp) - 1.0).abs() < f32::EPSILON);
        let after = field.get(CellPos::new(7, 10));
        assert!(after > 0.0, "light still leaks around the block");
        assert!(after < before);
        for (_, value) in field.values().iter() {
            assert!((0.0..=1.0).contains(value));
        }
    }

    #[test]
    fn test_retract_forgets_transient_seed() {
        let (terrain, skylight) = cave(21);
        let ctx = LightContext::new(&terrain, &skylight);
        let engine = LightEngine::new(&settings());
        let mut field = LightField::new(21);
        engine.seed(&mut field, &ctx, CellPos::new(10, 10), 1.0);
        engine.retract(&mut field, &ctx, CellPos::new(10, 10));
        assert!(field.values().iter().all(|(_, &v)| v == 0.0));
    }

    #[test]
    fn test_removed_emitter_goes_dark() {
        let (terrain, skylight) = cave(21);
        let ctx = LightContext::new(&terrain, &skylight);
        let mut engine = LightEngine::new(&settings());
        let mut field = LightField::new(21);
        let lamp = CellPos::new(10, 10);
        engine.add_emitter(&mut field, &ctx, lamp, 0.9);
        assert!(!engine.remove_emitter(CellPos::new(3, 3)));
        assert!(engine.remove_emitter(lamp));
        assert_eq!(engine.pending(), 1);
        engine.drain(&mut field, &ctx);
        assert_eq!(field.get(lamp), 0.0);
        assert_eq!(field.get(lamp.offset(2, 1)), 0.0);
    }

    #[test]
    fn test_depth_tracks_steps_from_source() {
        let (terrain, skylight) = cave(21);
        let ctx = LightContext::new(&terrain, &skylight);
        let engine = LightEngine::new(&settings());
        let mut field = LightField::new(21);
        let center = CellPos::new(10, 10);
        engine.seed(&mut field, &ctx, center, 1.0);
        assert_eq!(field.depth(center), Some(0));
        assert_eq!(field.depth(center.offset(3, 1)), Some(3));
        assert_eq!(field.depth(center.offset(7, 0)), Some(7));
        assert_eq!(field.depth(center.offset(8, 0)), None);
        assert_eq!(field.depth(CellPos::new(-1, 0)), None);
    }

    #[test]
    fn test_open_takes_best_neighbor() {
        let (terrain, skylight) = cave(9);
        let ctx = LightContext::new(&terrain, &skylight);
        let engine = LightEngine::new(&settings());
        let mut field = LightField::new(9);
        field.set(CellPos::new(3, 4), 0.8);
        engine.open(&mut field, &ctx, CellPos::new(4, 4));
        assert!((field.get(CellPos::new(4, 4)) - 0.8 * 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_background_writes_are_boosted_and_clamped() {
        let (mut terrain, _) = cave(9);
        terrain.set_tile(CellPos::new(5, 4), TileType::Wall);
        terrain.set_wall(CellPos::new(5, 4), true);
        let skylight = SkylightMask::from_terrain(&terrain);
        let ctx = LightContext::new(&terrain, &skylight);
        let engine = LightEngine::new(&settings());
        let mut field = LightField::new(9);
        engine.seed(&mut field, &ctx, CellPos::new(4, 4), 1.0);
        let expected = (0.85f32 * 1.1).min(1.0);
        assert!((field.get(CellPos::new(5, 4)) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_drain_is_fifo_and_reports_bounds() {
        let (terrain, skylight) = cave(16);
        let ctx = LightContext::new(&terrain, &skylight);
        let mut engine = LightEngine::new(&settings());
        let mut field = LightField::new(16);
        field.set(CellPos::new(2, 2), 0.9);
        field.take_dirty();

        engine.enqueue(LightEdit::Open(CellPos::new(3, 2)));
        engine.enqueue(LightEdit::Block(CellPos::new(3, 2)));
        assert_eq!(engine.pending(), 2);
        let commit = engine.drain(&mut field, &ctx);
        assert_eq!(engine.pending(), 0);
        assert!(!commit.is_empty());
        let bounds = commit.bounds.unwrap();
        assert!(bounds.min.x <= 3 && bounds.max.x >= 3);
        assert!(engine.drain(&mut field, &ctx).is_empty());
    }

    #[test]
    fn test_as_bytes_length() {
        let field = LightField::new(4);
        assert_eq!(field.as_bytes().len(), 16 * 4);
    }
}
