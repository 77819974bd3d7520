//! Typed row-major grids.

use crate::error::MatrixError;
use std::fmt;
use std::ops::{Index, IndexMut};

/// A single cell of a connectivity matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Value decided before enumeration (0 or 1)
    Fixed(u8),
    /// Undetermined; set to 0 or 1 during enumeration
    Free,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Fixed(v) => write!(f, "{}", v),
            Cell::Free => f.write_str("*"),
        }
    }
}

/// Rectangular grid stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

/// Matrix with some cells still undetermined.
pub type ConnectivityMatrix = Grid<Cell>;

/// Fully determined 0/1 matrix.
pub type BinaryMatrix = Grid<u8>;

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    /// Build a grid from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, MatrixError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(MatrixError::Ragged {
                    row: i + 1,
                    found: row.len(),
                    expected: n_cols,
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            cells,
        })
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks() panics on zero, and a zero-column grid has no cells anyway
        self.cells.chunks(self.cols.max(1))
    }

    /// Iterate over `((row, col), cell)` in row-major order.
    pub fn iter_positions(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / cols, i % cols), cell))
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.rows && col < self.cols, "grid index out of bounds");
        &self.cells[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(row < self.rows && col < self.cols, "grid index out of bounds");
        &mut self.cells[row * self.cols + col]
    }
}

impl ConnectivityMatrix {
    /// Square matrix of `n` nodes with every cell free.
    pub fn all_free(n: usize) -> Self {
        Self::filled(n, n, Cell::Free)
    }

    /// Positions of free cells in row-major order.
    pub fn free_positions(&self) -> Vec<(usize, usize)> {
        self.iter_positions()
            .filter(|(_, cell)| **cell == Cell::Free)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Copy with every free cell set to 0.
    pub fn resolve_free_to_zero(&self) -> BinaryMatrix {
        self.map(|cell| match cell {
            Cell::Fixed(v) => *v,
            Cell::Free => 0,
        })
    }
}

impl BinaryMatrix {
    /// Number of cells equal to 1.
    pub fn count_ones(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Grid::from_rows(vec![vec![1u8, 0], vec![1]]).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::Ragged {
                row: 2,
                found: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn test_free_positions_row_major() {
        let mut m = ConnectivityMatrix::all_free(2);
        m[(0, 1)] = Cell::Fixed(1);
        assert_eq!(m.free_positions(), vec![(0, 0), (1, 0), (1, 1)]);
        assert_eq!(m.resolve_free_to_zero().count_ones(), 1);
    }

    #[test]
    #[should_panic(expected = "grid index out of bounds")]
    fn test_index_out_of_bounds() {
        let g = Grid::filled(2, 3, 0u8);
        assert_eq!(g[(1, 2)], 0);
        let _ = g[(2, 0)];
    }

    #[test]
    fn test_iter_rows() {
        let g = Grid::from_rows(vec![vec![1u8, 2], vec![3, 4]]).unwrap();
        let rows: Vec<&[u8]> = g.iter_rows().collect();
        assert_eq!(rows, vec![&[1, 2][..], &[3, 4][..]]);
    }
}
