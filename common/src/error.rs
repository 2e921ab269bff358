use crate::grid::Cell;
use thiserror::Error;

/// Everything that can go wrong inside the deduction engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// The cell lies outside the field.
    #[error("cell {cell} is outside a {height}x{width} field")]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    /// The caller reported an observation for a cell that was already played.
    #[error("cell {0} has already been observed")]
    AlreadyObserved(Cell),

    /// The reported mine count cannot be produced by the cell's neighborhood.
    #[error("count {count} at {cell} exceeds its {neighbors} neighbors")]
    CountOutOfRange {
        cell: Cell,
        count: usize,
        neighbors: usize,
    },

    /// The accumulated facts contradict each other. The knowledge base is
    /// unusable after this and must be discarded.
    #[error("contradiction: {0}")]
    Contradiction(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("codec error: {0}")]
    Codec(#[from] bcs::Error),

    #[error("solver error: {0}")]
    Solver(String),

    /// A move was requested after the game finished.
    #[error("game_ended")]
    GameOver,
}

pub type Result<T> = std::result::Result<T, Error>;
