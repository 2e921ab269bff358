//! A knowledge-based minesweeper agent.
//!
//! The agent is told, one turn at a time, that a cell is safe and how many of
//! its neighbors are mines. It keeps every such fact as a [`Constraint`] and
//! propagates them to a fixpoint, proving cells safe or mined without guessing
//! wherever the facts allow it.

pub mod agent;
pub mod config;
pub mod constraint;
pub mod error;
pub mod field;
pub mod game;
pub mod grid;
pub mod knowledge;
pub mod sat;

pub use agent::{Agent, Move, MoveKind};
pub use config::{Config, ConsistencyCheck};
pub use constraint::Constraint;
pub use error::{Error, Result};
pub use field::Field;
pub use game::{Game, GameState, Step};
pub use grid::{Bounds, Cell};
pub use knowledge::{KnowledgeBase, Propagation};
