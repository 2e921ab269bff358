use crate::error::{Error, Result};
use crate::grid::Bounds;
use serde::{Deserialize, Serialize};

/// How eagerly the agent looks for contradictions in what it has been told.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyCheck {
    /// Report a contradiction once propagation breaks a constraint.
    #[default]
    Lazy,
    /// Also ask the SAT oracle after every observation.
    Sat,
}

/// Settings for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    pub consistency: ConsistencyCheck,
    /// Seed for mine placement and random moves. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            height: 8,
            width: 8,
            mines: 8,
            consistency: ConsistencyCheck::Lazy,
            seed: None,
        }
    }
}

impl Config {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.height, self.width)
    }

    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(Error::InvalidConfig(format!(
                "field must not be empty, got {}x{}",
                self.height, self.width
            )));
        }
        if self.mines >= self.bounds().checked_area()? {
            return Err(Error::InvalidConfig(format!(
                "{} mines leave no safe cell on a {}x{} field",
                self.mines, self.height, self.width
            )));
        }
        Ok(())
    }
}
