//! # Dense 2D Grids
//!
//! Every world-sized buffer (terrain types, walls, light, skylight, biome ids,
//! noise fields) is a [`Grid`]: a row-major `Vec<T>` with bounds-checked access.
//!
//! ## Coordinates
//!
//! `x` grows to the right, `y` grows upward. Row `y = 0` is the bottom of the
//! world. Coordinates are `i32` so that neighbor arithmetic near the edges
//! never underflows; any out-of-range lookup simply returns `None`.

/// A cell coordinate in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    /// Column.
    pub x: i32,
    /// Row (0 = bottom).
    pub y: i32,
}

impl CellPos {
    /// Creates a new cell coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this coordinate shifted by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev (king-move) distance to another cell.
    #[inline]
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Iterates the 8 surrounding cells (may be out of bounds).
    pub fn neighbors8(self) -> impl Iterator<Item = Self> {
        NEIGHBORS_8
            .iter()
            .map(move |&(dx, dy)| self.offset(dx, dy))
    }
}

/// Offsets of the 8 surrounding cells, row by row from the bottom-left.
pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Dense 2D storage, indexed `[y * width + x]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid filled with `fill`.
    #[must_use]
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    /// Overwrites every cell with `value`.
    pub fn fill(&mut self, value: T) {
        for cell in &mut self.cells {
            *cell = value.clone();
        }
    }
}

impl<T> Grid<T> {
    /// Creates a grid by evaluating `f(x, y)` for every cell, column by column.
    ///
    /// Evaluation order is x-major (all rows of column 0, then column 1, ...),
    /// matching how the generators sweep the world.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut slots: Vec<Option<T>> = Vec::with_capacity(width * height);
        slots.resize_with(width * height, || None);
        for x in 0..width {
            for y in 0..height {
                slots[y * width + x] = Some(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells: slots.into_iter().flatten().collect(),
        }
    }

    /// Grid width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns true if `(x, y)` lies inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Linear index of `(x, y)`, if in bounds.
    #[inline]
    #[must_use]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if self.contains(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Inverse of [`Grid::index_of`].
    #[inline]
    #[must_use]
    pub fn pos_of(&self, index: usize) -> CellPos {
        CellPos::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Borrows the cell at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Mutably borrows the cell at `(x, y)`.
    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        self.index_of(x, y).map(move |i| &mut self.cells[i])
    }

    /// Writes `value` at `(x, y)`. Returns false (and drops the value) if out of bounds.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.get_mut(x, y) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Raw row-major storage.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Iterates `(position, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| (CellPos::new((i % width) as i32, (i / width) as i32), v))
    }
}

impl<T: Copy> Grid<T> {
    /// Copies the cell at `(x, y)`, or returns `default` when out of bounds.
    #[inline]
    #[must_use]
    pub fn value_or(&self, x: i32, y: i32, default: T) -> T {
        self.get(x, y).copied().unwrap_or(default)
    }
}

/// Ordered set of changed cells.
///
/// A bitset answers "already dirty?" in O(1); the list keeps first-touch order
/// so commits are deterministic.
#[derive(Clone, Debug)]
pub struct DirtyCells {
    /// 1 = dirty. 64 cells per word.
    bits: Vec<u64>,
    /// Width of the tracked grid.
    width: usize,
    /// Height of the tracked grid.
    height: usize,
    /// Dirty cells in first-touch order.
    order: Vec<CellPos>,
}

impl DirtyCells {
    /// Creates a tracker for a `width` x `height` grid.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            bits: vec![0u64; (width * height).div_ceil(64)],
            width,
            height,
            order: Vec::new(),
        }
    }

    /// Marks a cell dirty. Out-of-range cells are ignored.
    #[inline]
    pub fn mark(&mut self, pos: CellPos) {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width || pos.y as usize >= self.height {
            return;
        }
        let index = pos.y as usize * self.width + pos.x as usize;
        let (word, bit) = (index / 64, index % 64);
        if let Some(bits) = self.bits.get_mut(word) {
            let mask = 1u64 << bit;
            if *bits & mask == 0 {
                *bits |= mask;
                self.order.push(pos);
            }
        }
    }

    /// Number of dirty cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is dirty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Takes the dirty list and clears the tracker.
    pub fn take(&mut self) -> Vec<CellPos> {
        for pos in &self.order {
            let index = pos.y as usize * self.width + pos.x as usize;
            self.bits[index / 64] &= !(1u64 << (index % 64));
        }
        std::mem::take(&mut self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_none() {
        let grid = Grid::new(4, 3, 7u8);
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(4, 0), None);
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.value_or(10, 10, 0), 0);
        assert_eq!(grid.value_or(3, 2, 0), 7);
    }

    #[test]
    fn test_from_fn_layout() {
        let grid = Grid::from_fn(3, 2, |x, y| (x * 10 + y) as u32);
        assert_eq!(grid.get(2, 1), Some(&21));
        assert_eq!(grid.as_slice()[grid.index_of(1, 1).unwrap()], 11);
        assert_eq!(grid.pos_of(4), CellPos::new(1, 1));
    }

    #[test]
    fn test_grids_compare_by_contents() {
        fn same<T: Eq>(a: &T, b: &T) -> bool {
            a == b
        }
        let mut a = Grid::new(3, 3, false);
        let b = Grid::new(3, 3, false);
        assert!(same(&a, &b));
        a.set(1, 1, true);
        assert!(!same(&a, &b));
        assert!(!same(&Grid::new(3, 1, 0u8), &Grid::new(1, 3, 0u8)));
    }

    #[test]
    fn test_dirty_cells_dedup_and_order() {
        let mut dirty = DirtyCells::new(8, 8);
        dirty.mark(CellPos::new(3, 3));
        dirty.mark(CellPos::new(1, 2));
        dirty.mark(CellPos::new(3, 3));
        dirty.mark(CellPos::new(-1, 0));
        assert_eq!(dirty.len(), 2);

        let taken = dirty.take();
        assert_eq!(taken, vec![CellPos::new(3, 3), CellPos::new(1, 2)]);
        assert!(dirty.is_empty());

        // Cleared bits allow re-marking.
        dirty.mark(CellPos::new(3, 3));
        assert_eq!(dirty.len(), 1);
    }
}
