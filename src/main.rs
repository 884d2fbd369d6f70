use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use grid_2048::config::EngineConfig;
use grid_2048::engine::{GridEngine, Move};
use grid_2048::platform::HeadlessPlatform;
use grid_2048::session::{Outcome, Session};
use grid_2048::store::{JsonFileStore, MemoryStore, SaveStore};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "grid-2048",
    version,
    about = "Play 2048 in the terminal: w/a/s/d or up/down/left/right, r restart, o obstacle, q quit"
)]
struct Args {
    /// Engine configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Board size, overriding the config file
    #[arg(long)]
    size: Option<usize>,
    /// Seed for tile spawns (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Directory for the saved game and best score; nothing is saved if omitted
    #[arg(long, value_name = "DIR")]
    save_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml(path)?,
        None => EngineConfig::default(),
    };
    if let Some(size) = args.size {
        config.size = size;
        config.validate()?;
    }

    let engine = match args.seed {
        Some(seed) => GridEngine::with_seed(&config, seed),
        None => GridEngine::new(&config),
    };

    match &args.save_dir {
        Some(dir) => {
            let store = JsonFileStore::open(dir)?;
            info!("saving to {}", dir.display());
            play(Session::new(engine, HeadlessPlatform::default(), store))
        }
        None => play(Session::new(engine, HeadlessPlatform::default(), MemoryStore::default())),
    }
}

fn play<S: SaveStore>(mut session: Session<HeadlessPlatform, S>) -> anyhow::Result<()> {
    if session.start() {
        println!("Resumed saved game.");
    }
    print_board(&session);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let cmd = line.trim();
        match cmd {
            "" => continue,
            "q" | "quit" => break,
            "r" | "restart" => {
                session.new_game();
            }
            "o" | "obstacle" => {
                if session.inject_obstacle().is_none() {
                    println!("No empty cell for an obstacle.");
                } else if session.is_over() {
                    println!("Game over: tiles are walled in. Press r to restart.");
                }
            }
            _ => match cmd.parse::<Move>() {
                Ok(direction) => {
                    let turn = session.handle_move(direction);
                    match turn.outcome {
                        Outcome::Won => println!("You win! Merged to {}.", session.engine().win_value()),
                        Outcome::GameOver => println!("Game over: no moves left. Press r to restart."),
                        Outcome::Playing => {}
                    }
                }
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            },
        }
        print_board(&session);
    }

    println!(
        "Final score: {} | best: {}",
        session.engine().score(),
        session.best_score()
    );
    Ok(())
}

fn print_board<S: SaveStore>(session: &Session<HeadlessPlatform, S>) {
    let engine = session.engine();
    println!("{}", engine.board());
    println!("Score: {} | Best: {}", engine.score(), session.best_score());
    print!("> ");
    let _ = io::stdout().flush();
}
