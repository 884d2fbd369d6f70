use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use env_logger::Env;
use grid_2048::config::EngineConfig;
use grid_2048::engine::GridEngine;
use grid_2048::trace::{self, Recorder, Run};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "simulate",
    version,
    about = "Play seeded random-policy 2048 games in bulk and replay their traces"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play games in parallel and print aggregate stats
    Run {
        /// Number of games
        #[arg(short = 'n', long = "games", default_value_t = 100)]
        games: u64,
        /// Base seed; game i uses seed + i
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Engine configuration file (TOML)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Stop a game after this many moves
        #[arg(long)]
        max_steps: Option<u32>,
        /// Write one .mgt trace per game into this directory
        #[arg(short = 'o', long = "out", value_name = "DIR")]
        out: Option<PathBuf>,
        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },
    /// Replay a trace and print its final board
    Replay {
        /// Trace file written by `run --out`
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run { games, seed, config, max_steps, out, progress } => {
            let config = match config {
                Some(path) => EngineConfig::from_toml(path)?,
                None => EngineConfig::default(),
            };
            run_games(&config, games, seed, max_steps, out.as_deref(), progress)?;
        }
        Command::Replay { file } => {
            let run = trace::parse_run_file(&file)?;
            let engine = trace::replay(&run)?;
            println!("{}", engine.board());
            println!(
                "seed: {} | steps: {} | score: {} | highest tile: {} | terminal: {}",
                run.meta.seed,
                run.meta.steps,
                engine.score(),
                engine.highest_tile(),
                engine.is_terminal()
            );
        }
    }
    Ok(())
}

/// Play one game choosing uniformly among moves that change the board.
fn play_random(config: &EngineConfig, seed: u64, max_steps: Option<u32>) -> anyhow::Result<Run> {
    let mut engine = GridEngine::with_seed(config, seed);
    let mut policy = StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
    let mut recorder = Recorder::new(config, seed);
    loop {
        if max_steps.is_some_and(|limit| recorder.len() >= limit as usize) {
            break;
        }
        let legal = engine.legal_moves();
        if legal.is_empty() {
            break;
        }
        let direction = legal[policy.gen_range(0..legal.len())];
        engine.make_move(direction);
        recorder.record(direction);
    }
    Ok(recorder.finish(&engine)?)
}

fn run_games(
    config: &EngineConfig,
    games: u64,
    seed: u64,
    max_steps: Option<u32>,
    out: Option<&Path>,
    progress: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = out {
        fs::create_dir_all(dir)?;
    }
    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let start = Instant::now();
    let runs = (0..games)
        .into_par_iter()
        .map(|i| {
            let run = play_random(config, seed.wrapping_add(i), max_steps);
            pb.inc(1);
            run
        })
        .collect::<anyhow::Result<Vec<Run>>>()?;
    pb.finish_and_clear();

    if let Some(dir) = out {
        for (i, run) in runs.iter().enumerate() {
            trace::write_run_to_path(dir.join(format!("game-{i:05}.mgt")), run)?;
        }
        info!("wrote {} traces to {}", runs.len(), dir.display());
    }

    let total_steps: u64 = runs.iter().map(|r| r.meta.steps as u64).sum();
    let best = runs.iter().map(|r| r.meta.final_score).max().unwrap_or(0);
    let mean = if runs.is_empty() {
        0.0
    } else {
        runs.iter().map(|r| r.meta.final_score as f64).sum::<f64>() / runs.len() as f64
    };
    let highest = runs.iter().map(|r| r.meta.highest_tile).max().unwrap_or(0);
    let wins = runs
        .iter()
        .filter(|r| r.meta.highest_tile >= config.win_value as u64)
        .count();
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    println!(
        "games: {} | moves: {} | moves/sec: {:.1} | mean score: {:.1} | best score: {} | highest tile: {} | wins: {}",
        runs.len(),
        total_steps,
        total_steps as f64 / elapsed,
        mean,
        best,
        highest,
        wins
    );
    Ok(())
}
