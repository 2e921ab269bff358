use crate::error::{Error, Result};
use crate::grid::Cell;
use std::collections::BTreeSet;
use std::fmt;

/// A logical sentence about the field: exactly `count` of `cells` are mines.
///
/// The count never exceeds the number of cells. Removing cells whose status
/// became known keeps the sentence's meaning intact, and any update that would
/// break the invariant is reported as [`Error::Contradiction`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(Error::Contradiction(format!(
                "{count} mines cannot fit in {} cells",
                cells.len()
            )));
        }
        Ok(Constraint { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty constraint says nothing and is dropped from the knowledge base.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells are mines when every unknown cell is needed to reach the count.
    pub fn known_mines(&self) -> Option<&BTreeSet<Cell>> {
        (!self.cells.is_empty() && self.count == self.cells.len()).then_some(&self.cells)
    }

    /// All cells are safe when no mines are left to place.
    pub fn known_safe(&self) -> Option<&BTreeSet<Cell>> {
        (!self.cells.is_empty() && self.count == 0).then_some(&self.cells)
    }

    /// Drops `cell` as a proven mine, so one fewer mine is still owed.
    /// Returns whether the constraint changed.
    pub fn remove_as_mine(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == 0 {
            return Err(Error::Contradiction(format!(
                "{cell} is a mine but {self} owes no more mines"
            )));
        }
        self.cells.remove(&cell);
        self.count -= 1;
        Ok(true)
    }

    /// Drops `cell` as proven safe; the mine count is untouched.
    /// Returns whether the constraint changed.
    pub fn remove_as_safe(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == self.cells.len() {
            return Err(Error::Contradiction(format!(
                "{cell} is safe but {self} needs every cell to be a mine"
            )));
        }
        self.cells.remove(&cell);
        Ok(true)
    }

    /// If `self` covers a strict subset of `other`, the cells only `other`
    /// covers must hold the mines `self` does not account for.
    pub fn difference_from(&self, other: &Constraint) -> Option<Result<Constraint>> {
        if self.cells.len() >= other.cells.len() || !self.cells.is_subset(&other.cells) {
            return None;
        }

        let Some(count) = other.count.checked_sub(self.count) else {
            return Some(Err(Error::Contradiction(format!(
                "{self} needs more mines than its superset {other}"
            ))));
        };

        Some(Constraint::new(
            other.cells.difference(&self.cells).copied(),
            count,
        ))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cell}")?;
        }
        write!(f, "}} = {}", self.count)
    }
}
