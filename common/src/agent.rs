use crate::config::{Config, ConsistencyCheck};
use crate::error::Result;
use crate::grid::{Bounds, Cell};
use crate::knowledge::{KnowledgeBase, Propagation};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use tracing::debug;

/// How the agent arrived at a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// The cell is proven safe.
    Safe,
    /// Nothing is proven safe, so the agent guessed among cells not known to be mines.
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub cell: Cell,
    pub kind: MoveKind,
}

/// A player that only learns through the observations it is handed, one safe
/// cell and its neighbor mine count at a time.
#[derive(Debug, Clone)]
pub struct Agent {
    knowledge: KnowledgeBase,
    consistency: ConsistencyCheck,
}

impl Agent {
    pub fn new(bounds: Bounds, consistency: ConsistencyCheck) -> Self {
        Agent {
            knowledge: KnowledgeBase::new(bounds),
            consistency,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Agent::new(config.bounds(), config.consistency)
    }

    /// Feeds one observation into the knowledge base and runs it to a fixpoint.
    pub fn record_observation(&mut self, cell: Cell, count: usize) -> Result<Propagation> {
        let summary = self.knowledge.record_observation(cell, count)?;
        debug!(
            row = cell.row,
            col = cell.col,
            count,
            safe = self.knowledge.safe().len(),
            mines = self.knowledge.mine().len(),
            constraints = self.knowledge.constraints().len(),
            "observation recorded"
        );

        if self.consistency == ConsistencyCheck::Sat {
            self.knowledge.verify_satisfiable()?;
        }
        Ok(summary)
    }

    /// A proven-safe cell that has not been played yet.
    ///
    /// Any eligible cell is a correct answer; this picks the smallest in
    /// row-major order so that seeded games replay identically.
    pub fn choose_safe_move(&self) -> Option<Cell> {
        self.knowledge
            .safe()
            .difference(self.knowledge.moves_made())
            .min()
            .copied()
    }

    /// A uniformly random cell that is neither played nor known to be a mine.
    pub fn choose_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let moves_made = self.knowledge.moves_made();
        let mine = self.knowledge.mine();

        let candidates: Vec<Cell> = self
            .knowledge
            .bounds()
            .cells()
            .filter(|cell| !moves_made.contains(cell) && !mine.contains(cell))
            .collect();

        candidates.choose(rng).copied()
    }

    /// Prefers a proven-safe move and falls back to a random one.
    pub fn next_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        if let Some(cell) = self.choose_safe_move() {
            return Some(Move {
                cell,
                kind: MoveKind::Safe,
            });
        }

        self.choose_random_move(rng).map(|cell| Move {
            cell,
            kind: MoveKind::Random,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.knowledge.bounds()
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        self.knowledge.moves_made()
    }

    pub fn safes(&self) -> &HashSet<Cell> {
        self.knowledge.safe()
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        self.knowledge.mine()
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }
}
