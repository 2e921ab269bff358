use crate::error::{Error, Result};
use crate::grid::{Bounds, Cell};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The hidden mine layout. It answers neighbor counts and membership tests
/// and knows nothing about inference.
///
/// On the wire a field is its bounds plus its mines in row-major order, and
/// decoding goes through [`Field::with_mines`], so a decoded field is always
/// in bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldLayout", into = "FieldLayout")]
pub struct Field {
    bounds: Bounds,
    mines: HashSet<Cell>,
}

#[derive(Serialize, Deserialize)]
struct FieldLayout {
    bounds: Bounds,
    mines: Vec<Cell>,
}

impl TryFrom<FieldLayout> for Field {
    type Error = Error;

    fn try_from(layout: FieldLayout) -> Result<Self> {
        if layout.mines.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(
                "mines must be listed once each in row-major order".to_string(),
            ));
        }
        Field::with_mines(layout.bounds, layout.mines)
    }
}

impl From<Field> for FieldLayout {
    fn from(field: Field) -> Self {
        let mut mines: Vec<Cell> = field.mines.into_iter().collect();
        mines.sort();
        FieldLayout {
            bounds: field.bounds,
            mines,
        }
    }
}

impl Field {
    /// Places `mines` mines uniformly at random, leaving at least one safe cell.
    pub fn random<R: Rng + ?Sized>(bounds: Bounds, mines: usize, rng: &mut R) -> Result<Self> {
        if mines >= bounds.checked_area()? {
            return Err(Error::InvalidConfig(format!(
                "{mines} mines leave no safe cell on a {}x{} field",
                bounds.height, bounds.width
            )));
        }

        let cells: Vec<Cell> = bounds.cells().collect();
        Field::with_mines(bounds, cells.choose_multiple(rng, mines).copied())
    }

    /// A field with mines at exactly the given cells.
    pub fn with_mines(bounds: Bounds, mines: impl IntoIterator<Item = Cell>) -> Result<Self> {
        bounds.checked_area()?;

        let mut placed = HashSet::new();
        for cell in mines {
            bounds.check(cell)?;
            placed.insert(cell);
        }

        Ok(Field {
            bounds,
            mines: placed,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    pub fn is_mine(&self, cell: Cell) -> Result<bool> {
        self.bounds.check(cell)?;
        Ok(self.mines.contains(&cell))
    }

    /// Mines among the up-to-eight cells around `cell`, not counting itself.
    pub fn neighbor_mine_count(&self, cell: Cell) -> Result<usize> {
        self.bounds.check(cell)?;
        Ok(self
            .bounds
            .neighbors(cell)
            .filter(|n| self.mines.contains(n))
            .count())
    }

    /// The game is won once the flagged cells are exactly the mines.
    pub fn won(&self, flagged: &HashSet<Cell>) -> bool {
        flagged == &self.mines
    }

    /// A text diagram of where the mines are.
    pub fn render(&self) -> String {
        let rule = format!("{}-\n", "--".repeat(self.bounds.width));
        let mut out = String::new();

        for row in 0..self.bounds.height {
            out.push_str(&rule);
            for col in 0..self.bounds.width {
                out.push_str(if self.mines.contains(&Cell::new(row, col)) {
                    "|X"
                } else {
                    "| "
                });
            }
            out.push_str("|\n");
        }
        out.push_str(&rule);
        out
    }

    /// Deserializes a field from bytes.
    pub fn from_bytes(bts: &[u8]) -> Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the field to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}
