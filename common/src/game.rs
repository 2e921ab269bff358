use crate::agent::{Agent, Move, MoveKind};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::grid::Cell;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// The outcome of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The chosen cell was safe and reported `count` neighboring mines.
    Revealed {
        cell: Cell,
        count: usize,
        kind: MoveKind,
    },
    /// The agent guessed and hit a mine.
    Exploded(Cell),
    /// No cell is left to play.
    Exhausted,
}

/// An agent playing against a field, one observation per turn.
#[derive(Debug, Clone)]
pub struct Game {
    field: Field,
    agent: Agent,
    state: GameState,
}

impl Game {
    pub fn new(field: Field, agent: Agent) -> Self {
        Game {
            field,
            agent,
            state: GameState::Playing,
        }
    }

    /// Builds a random field from `config` and an agent that matches it.
    pub fn from_config<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let field = Field::random(config.bounds(), config.mines, rng)?;
        Ok(Game::new(field, Agent::from_config(config)))
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Plays one move: a proven-safe cell if there is one, otherwise a guess.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Step> {
        if self.state != GameState::Playing {
            return Err(Error::GameOver);
        }

        let Some(Move { cell, kind }) = self.agent.next_move(rng) else {
            // Only proven mines are left unplayed.
            self.state = if self.field.won(self.agent.mines()) {
                GameState::Won
            } else {
                GameState::Lost
            };
            return Ok(Step::Exhausted);
        };

        if self.field.is_mine(cell)? {
            info!(row = cell.row, col = cell.col, "hit a mine");
            self.state = GameState::Lost;
            return Ok(Step::Exploded(cell));
        }

        let count = self.field.neighbor_mine_count(cell)?;
        self.agent.record_observation(cell, count)?;

        if self.check_win_condition() {
            info!(moves = self.agent.moves_made().len(), "every safe cell played");
            self.state = GameState::Won;
        }

        Ok(Step::Revealed { cell, count, kind })
    }

    /// Plays until the game is decided.
    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<GameState> {
        while self.state == GameState::Playing {
            self.step(rng)?;
        }
        Ok(self.state)
    }

    /// Won once every safe cell has been played.
    pub fn check_win_condition(&self) -> bool {
        let safe_cells = self.field.bounds().area() - self.field.mines().len();
        self.agent.moves_made().len() >= safe_cells
    }

    /// The agent's view: played cells show their count, proven mines `F`,
    /// proven-safe cells `.`, and everything else `■`.
    pub fn render(&self) -> Result<String> {
        let bounds = self.field.bounds();
        let mut out = String::from("   ");
        for col in 0..bounds.width {
            out.push_str(&format!("{:^3}", col));
        }
        out.push_str(&format!("\n  +{}\n", "---".repeat(bounds.width)));

        for row in 0..bounds.height {
            out.push_str(&format!("{:^2}|", row));
            for col in 0..bounds.width {
                let cell = Cell::new(row, col);
                let display = if self.agent.moves_made().contains(&cell) {
                    format!(" {} ", self.field.neighbor_mine_count(cell)?)
                } else if self.agent.mines().contains(&cell) {
                    " F ".to_string()
                } else if self.agent.safes().contains(&cell) {
                    " . ".to_string()
                } else {
                    " ■ ".to_string()
                };
                out.push_str(&display);
            }
            out.push('\n');
        }
        Ok(out)
    }
}
