use anyhow::Context;
use minesweeper_ai::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Usage: `minesweeper-ai [height] [width] [mines] [seed]`
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- 1. Initialization ---
    let config = parse_args(std::env::args().skip(1))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut game = Game::from_config(&config, &mut rng).context("invalid game settings")?;

    println!("--- Autonomous Minesweeper Agent ---");
    println!("Strategy: play proven-safe cells, guess randomly otherwise.");
    println!("Mine layout:");
    print!("{}", game.field().render());
    thread::sleep(Duration::from_secs(1));

    // --- 2. Game Loop ---
    let mut move_count = 0;
    while game.state() == GameState::Playing {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        match game.step(&mut rng)? {
            Step::Revealed { cell, count, kind } => {
                match kind {
                    MoveKind::Safe => println!("Knowledge found a safe cell."),
                    MoveKind::Random => println!("No safe move known. Guessing..."),
                }
                println!("Agent reveals ({}, {}): {} nearby.", cell.row, cell.col, count);
            }
            Step::Exploded(cell) => {
                println!("Agent reveals ({}, {}) and hits a mine.", cell.row, cell.col);
            }
            Step::Exhausted => println!("No valid moves left for the agent to make."),
        }

        print!("{}", game.render()?);

        // Add a delay to make the game watchable
        thread::sleep(Duration::from_millis(300));
    }

    // --- 3. Final Result ---
    println!("\n--- Game Over ---");
    println!(
        "Mines proven: {}/{}",
        game.agent().mines().len(),
        game.field().mines().len()
    );

    match game.state() {
        GameState::Won => println!("Result: The agent won!"),
        GameState::Lost => println!("Result: The agent hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(height) = args.next() {
        config.height = height.parse().context("height must be a number")?;
    }
    if let Some(width) = args.next() {
        config.width = width.parse().context("width must be a number")?;
    }
    if let Some(mines) = args.next() {
        config.mines = mines.parse().context("mines must be a number")?;
    }
    if let Some(seed) = args.next() {
        config.seed = Some(seed.parse().context("seed must be a number")?);
    }
    if std::env::var_os("MINESWEEPER_VERIFY").is_some() {
        config.consistency = ConsistencyCheck::Sat;
    }

    Ok(config)
}
