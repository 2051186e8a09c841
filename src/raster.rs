//! Grid primitives: [`Raster<T>`], [`BBox`], and the suitable-cells index.
//!
//! Grounded in the teacher's `TerrainGrid` (row-major `Vec` buffer, bounds
//! checked `cell_index`, `world_to_grid`/`grid_to_world` conversions) from
//! `terrain.rs`, generalized from a fixed `TerrainCell` payload to any `T`.

use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// A uniform 2D array with known resolution, stored row-major.
///
/// Out-of-range `(row, col)` access is a programmer error, not a recoverable
/// condition: the engine's own code paths never produce one, so accessors
/// bounds-check with `debug_assert!` rather than returning `Option`/`Result`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    rows: usize,
    cols: usize,
    /// North-south cell size in map units.
    pub ns_res: f64,
    /// East-west cell size in map units.
    pub ew_res: f64,
    data: Vec<T>,
}

impl<T: Clone + Default> Raster<T> {
    /// Create a raster filled with `T::default()`.
    pub fn new(rows: usize, cols: usize, ns_res: f64, ew_res: f64) -> Self {
        Raster {
            rows,
            cols,
            ns_res,
            ew_res,
            data: vec![T::default(); rows * cols],
        }
    }
}

impl<T: Clone> Raster<T> {
    /// Create a raster filled with `value`.
    pub fn filled(rows: usize, cols: usize, ns_res: f64, ew_res: f64, value: T) -> Self {
        Raster {
            rows,
            cols,
            ns_res,
            ew_res,
            data: vec![value; rows * cols],
        }
    }

    /// Build a raster from a row-major `Vec`. Panics if `data.len() !=
    /// rows*cols`.
    pub fn from_vec(rows: usize, cols: usize, ns_res: f64, ew_res: f64, data: Vec<T>) -> Self {
        assert_eq!(data.len(), rows * cols, "raster data length mismatch");
        Raster { rows, cols, ns_res, ew_res, data }
    }

    /// Fill every cell with `value`.
    pub fn fill(&mut self, value: T) {
        for cell in self.data.iter_mut() {
            *cell = value.clone();
        }
    }
}

impl<T> Raster<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True when `(row, col)` lies within `[0,rows) x [0,cols)`.
    #[inline]
    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols, "raster index out of bounds");
        row * self.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[self.index(row, col)]
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        let idx = self.index(row, col);
        &mut self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }

    /// Iterate `(row, col, &value)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let cols = self.cols;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (i / cols, i % cols, v))
    }
}

impl<T> Raster<T>
where
    T: Copy + PartialOrd + Default + AddAssign + Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T>,
{
    /// Elementwise add another raster of identical shape, in place.
    pub fn add_assign_raster(&mut self, other: &Raster<T>) {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += *b;
        }
    }

    /// Add a scalar to every cell, in place.
    pub fn add_scalar(&mut self, scalar: T) {
        for a in self.data.iter_mut() {
            *a += scalar;
        }
    }

    /// Value-returning elementwise add.
    pub fn added(&self, other: &Raster<T>) -> Raster<T> {
        let mut out = self.clone_shape();
        for ((o, a), b) in out.data.iter_mut().zip(self.data.iter()).zip(other.data.iter()) {
            *o = *a + *b;
        }
        out
    }

    /// Value-returning elementwise subtract.
    pub fn subtracted(&self, other: &Raster<T>) -> Raster<T> {
        let mut out = self.clone_shape();
        for ((o, a), b) in out.data.iter_mut().zip(self.data.iter()).zip(other.data.iter()) {
            *o = *a - *b;
        }
        out
    }

    /// Value-returning elementwise multiply by scalar.
    pub fn scaled(&self, scalar: T) -> Raster<T> {
        let mut out = self.clone_shape();
        for (o, a) in out.data.iter_mut().zip(self.data.iter()) {
            *o = *a * scalar;
        }
        out
    }

    fn clone_shape(&self) -> Raster<T> {
        Raster {
            rows: self.rows,
            cols: self.cols,
            ns_res: self.ns_res,
            ew_res: self.ew_res,
            data: vec![T::default(); self.rows * self.cols],
        }
    }
}

impl Raster<i32> {
    /// Scan once and return every `(row, col)` with a positive value. A
    /// read-only reduction over the whole grid: with the `parallel`
    /// feature enabled, large grids scan with `rayon` instead of serially,
    /// which does not affect the deterministic per-cell mutation order the
    /// engine's ordering guarantees bind (this is the only place that
    /// order touches).
    #[cfg(not(feature = "parallel"))]
    pub fn find_suitable_cells(&self) -> Vec<(usize, usize)> {
        self.iter_cells()
            .filter(|(_, _, &v)| v > 0)
            .map(|(r, c, _)| (r, c))
            .collect()
    }

    #[cfg(feature = "parallel")]
    pub fn find_suitable_cells(&self) -> Vec<(usize, usize)> {
        use rayon::prelude::*;
        let cols = self.cols;
        self.data
            .par_iter()
            .enumerate()
            .filter(|(_, &v)| v > 0)
            .map(|(i, _)| (i / cols, i % cols))
            .collect()
    }
}

/// Four geographic bounds, used by the network subsystem and by the
/// spread-rate / quarantine-escape analytics.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        BBox { north, south, east, west }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.west && x <= self.east && y >= self.south && y <= self.north
    }
}

/// Integer bounding box over raster row/col space, used as the tight bbox of
/// infected cells by spread-rate and quarantine-escape. `(-1,-1,-1,-1)`
/// represents "no infected cells".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBBox {
    pub north: i32,
    pub south: i32,
    pub east: i32,
    pub west: i32,
}

impl CellBBox {
    pub const INVALID: CellBBox = CellBBox { north: -1, south: -1, east: -1, west: -1 };

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Tight bbox (row = north/south, col = east/west) of every cell where
    /// `predicate(row, col)` is true, scanning only `cells`.
    pub fn from_cells<I: IntoIterator<Item = (usize, usize)>>(cells: I) -> CellBBox {
        let mut north = i32::MAX;
        let mut south = i32::MIN;
        let mut east = i32::MIN;
        let mut west = i32::MAX;
        let mut any = false;
        for (r, c) in cells {
            any = true;
            let (r, c) = (r as i32, c as i32);
            if r < north {
                north = r;
            }
            if r > south {
                south = r;
            }
            if c > east {
                east = c;
            }
            if c < west {
                west = c;
            }
        }
        if !any {
            CellBBox::INVALID
        } else {
            CellBBox { north, south, east, west }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_bounds_and_access() {
        let mut r: Raster<i32> = Raster::new(3, 4, 30.0, 30.0);
        assert!(r.in_bounds(0, 0));
        assert!(r.in_bounds(2, 3));
        assert!(!r.in_bounds(3, 0));
        assert!(!r.in_bounds(0, -1));
        r.set(1, 2, 5);
        assert_eq!(*r.get(1, 2), 5);
    }

    #[test]
    fn find_suitable_cells_scans_positive() {
        let data = vec![0, 1, 0, 2, 0, 0];
        let r = Raster::from_vec(2, 3, 30.0, 30.0, data);
        let suitable = r.find_suitable_cells();
        assert_eq!(suitable, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn cell_bbox_from_cells() {
        let bbox = CellBBox::from_cells([(0, 0), (2, 2), (1, 3)]);
        assert_eq!(bbox, CellBBox { north: 0, south: 2, east: 3, west: 0 });
        assert_eq!(CellBBox::from_cells(std::iter::empty()), CellBBox::INVALID);
    }

    #[test]
    fn elementwise_add() {
        let a: Raster<i32> = Raster::filled(2, 2, 30.0, 30.0, 3);
        let b: Raster<i32> = Raster::filled(2, 2, 30.0, 30.0, 4);
        let c = a.added(&b);
        assert!(c.iter().all(|&v| v == 7));
    }
}
