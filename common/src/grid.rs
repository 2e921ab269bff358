use crate::error::{Error, Result};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate on the field, addressed by row then column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

/// The dimensions of a field. This is the only geometric knowledge the agent
/// has about the game it is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub height: usize,
    pub width: usize,
}

impl Bounds {
    pub const fn new(height: usize, width: usize) -> Self {
        Bounds { height, width }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Fails with [`Error::OutOfBounds`] unless the cell lies on the field.
    pub fn check(&self, cell: Cell) -> Result<()> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// The number of cells, or [`Error::InvalidConfig`] if it does not fit in
    /// a `usize`.
    pub fn checked_area(&self) -> Result<usize> {
        self.height.checked_mul(self.width).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "a {}x{} field has too many cells",
                self.height, self.width
            ))
        })
    }

    /// The number of cells. Saturates for bounds that [`Bounds::checked_area`]
    /// rejects.
    pub fn area(&self) -> usize {
        self.height.saturating_mul(self.width)
    }

    /// Every cell of the field in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        iproduct!(0..self.height, 0..self.width).map(Cell::from)
    }

    /// The up-to-eight cells within Chebyshev distance 1 of `cell`, clipped to
    /// the field. The cell itself is never included.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        let height = self.height as isize;
        let width = self.width as isize;

        iproduct!(-1isize..=1, -1isize..=1).filter_map(move |(dr, dc)| {
            if dr == 0 && dc == 0 {
                return None;
            }

            let row = cell.row as isize + dr;
            let col = cell.col as isize + dc;

            if (0..height).contains(&row) && (0..width).contains(&col) {
                Some(Cell::new(row as usize, col as usize))
            } else {
                None
            }
        })
    }
}
