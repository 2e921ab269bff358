use minesweeper_ai as ms;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_field(height: u8, width: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let bounds = ms::Bounds::new(height as usize, width as usize);
    let field = ms::Field::random(bounds, mines as usize, &mut rand::rng())
        .map_err(|e| e.to_string())?;
    field.to_bytes().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn render_field(bts: Vec<u8>) -> Result<String, String> {
    console_error_panic_hook::set_once();

    let field = ms::Field::from_bytes(&bts).map_err(|e| e.to_string())?;
    Ok(field.render())
}

/// An agent playing a field handed over as bytes.
#[wasm_bindgen]
pub struct Bot {
    game: ms::Game,
    rng: StdRng,
}

#[wasm_bindgen]
impl Bot {
    #[wasm_bindgen(constructor)]
    pub fn new(field: Vec<u8>, seed: u64) -> Result<Bot, String> {
        console_error_panic_hook::set_once();

        let field = ms::Field::from_bytes(&field).map_err(|e| e.to_string())?;
        let agent = ms::Agent::new(field.bounds(), ms::ConsistencyCheck::Lazy);
        Ok(Bot {
            game: ms::Game::new(field, agent),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Plays one move. Returns `[row, col, count]` for a revealed cell,
    /// `[row, col, -1]` for a mine, and an empty vector once nothing is left.
    pub fn step(&mut self) -> Result<Vec<i32>, String> {
        let step = self.game.step(&mut self.rng).map_err(|e| e.to_string())?;
        Ok(match step {
            ms::Step::Revealed { cell, count, .. } => {
                vec![cell.row as i32, cell.col as i32, count as i32]
            }
            ms::Step::Exploded(cell) => vec![cell.row as i32, cell.col as i32, -1],
            ms::Step::Exhausted => Vec::new(),
        })
    }

    /// 0 while playing, 1 when won, 2 when lost.
    pub fn state(&self) -> u8 {
        match self.game.state() {
            ms::GameState::Playing => 0,
            ms::GameState::Won => 1,
            ms::GameState::Lost => 2,
        }
    }

    /// The agent's view in row-major order: a played cell's count, -2 for a
    /// proven mine, -3 for a proven-safe cell and -1 for unknown.
    pub fn cells(&self) -> Result<Vec<i8>, String> {
        let agent = self.game.agent();
        agent
            .bounds()
            .cells()
            .map(|cell| {
                if agent.moves_made().contains(&cell) {
                    self.game
                        .field()
                        .neighbor_mine_count(cell)
                        .map(|n| n as i8)
                        .map_err(|e| e.to_string())
                } else if agent.mines().contains(&cell) {
                    Ok(-2)
                } else if agent.safes().contains(&cell) {
                    Ok(-3)
                } else {
                    Ok(-1)
                }
            })
            .collect()
    }
}
