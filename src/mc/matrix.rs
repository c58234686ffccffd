//! Row-major `paths x (steps + 1)` storage shared by the simulation stages.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Dense matrix with one row per simulated path and one column per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> PathMatrix<T> {
    /// Zero-initialised (`T::default()`) matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Wraps row-major `data`.
    ///
    /// # Panics
    /// Panics when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), rows * cols, "matrix data length mismatch");
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    pub fn iter_rows_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        let rows = self.rows;
        self.data.chunks_exact_mut(self.cols.max(1)).take(rows)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(feature = "parallel")]
impl<T: Copy + Default + Send + Sync> PathMatrix<T> {
    /// Disjoint mutable rows for data-parallel per-path stages.
    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, T> {
        self.data.par_chunks_exact_mut(self.cols.max(1))
    }
}
