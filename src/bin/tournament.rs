use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use obstacle_2048::ai::Persona;
use obstacle_2048::game::Duel;
use obstacle_2048::ids::SequentialIds;
use obstacle_2048::level::Level;
use obstacle_2048::serialization::{self, Snapshot};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "tournament", about = "Seeded solo games for every AI persona on one level")]
struct Args {
    /// Built-in level index (0-4)
    #[arg(long, default_value_t = 0)]
    level: usize,

    /// Load the level from a TOML file instead
    #[arg(long, conflicts_with = "level")]
    level_file: Option<PathBuf>,

    /// Games per persona
    #[arg(long, default_value_t = 32)]
    games: u64,

    /// First seed; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Cap on AI moves per game
    #[arg(long, default_value_t = 5000)]
    max_moves: u64,

    /// Only run these personas (comma separated names)
    #[arg(long, value_delimiter = ',')]
    personas: Vec<String>,

    /// Save the highest-scoring game as a snapshot
    #[arg(long)]
    out: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

struct GameResult {
    persona: Persona,
    seed: u64,
    score: u64,
    highest_tile: u32,
    moves: u64,
    won: bool,
    snapshot: Snapshot,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let level = match &args.level_file {
        Some(path) => Level::from_toml_path(path)?,
        None => Level::by_index(args.level)?,
    };
    let personas: Vec<Persona> = if args.personas.is_empty() {
        Persona::ALL.to_vec()
    } else {
        args.personas.iter().map(|n| Persona::from_name(n)).collect()
    };

    let jobs: Vec<(Persona, u64)> =
        personas.iter().flat_map(|&p| (0..args.games).map(move |i| (p, args.seed + i))).collect();

    let pb = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(jobs.len() as u64) };
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
            .progress_chars("=>-"),
    );
    let results: Vec<GameResult> = jobs
        .par_iter()
        .map(|&(persona, seed)| {
            let r = play_solo(&level, persona, seed, args.max_moves);
            pb.inc(1);
            r
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_and_clear();

    println!("Level: {} ({}x{}, target {})", level.name, level.grid_size, level.grid_size, level.winning_value);
    println!("{:<16} {:>6} {:>10} {:>10} {:>8} {:>8} {:>6}", "persona", "games", "mean", "best", "tile", "moves", "wins");
    for &persona in &personas {
        let mine: Vec<&GameResult> = results.iter().filter(|r| r.persona == persona).collect();
        if mine.is_empty() {
            continue;
        }
        let n = mine.len() as f64;
        let mean = mine.iter().map(|r| r.score as f64).sum::<f64>() / n;
        let best = mine.iter().map(|r| r.score).max().unwrap_or(0);
        let tile = mine.iter().map(|r| r.highest_tile).max().unwrap_or(0);
        let moves = mine.iter().map(|r| r.moves as f64).sum::<f64>() / n;
        let wins = mine.iter().filter(|r| r.won).count();
        println!("{:<16} {:>6} {:>10.1} {:>10} {:>8} {:>8.1} {:>6}", persona.name(), mine.len(), mean, best, tile, moves, wins);
    }

    if let Some(path) = args.out {
        if let Some(top) = results.iter().max_by_key(|r| r.score) {
            serialization::write_to_path(&path, &top.snapshot)?;
            println!("Saved {} seed {} (score {}) to {}", top.persona.name(), top.seed, top.score, path.display());
        }
    }
    Ok(())
}

/// Run the AI side of a duel alone until it stops or hits the move cap.
fn play_solo(level: &Level, persona: Persona, seed: u64, max_moves: u64) -> Result<GameResult> {
    let mut rng = StdRng::seed_from_u64(seed);
    let ids = SequentialIds::with_prefix(format!("s{seed}"));
    let mut duel = Duel::with_ids(level.clone(), persona, ids, &mut rng)?;
    let mut moves = 0u64;
    while moves < max_moves {
        match duel.ai_move(&mut rng) {
            Some(report) if report.moved => moves += 1,
            _ => break,
        }
    }
    tracing::debug!(persona = %persona, seed, score = duel.ai.board.score, moves, "game finished");
    Ok(GameResult {
        persona,
        seed,
        score: duel.ai.board.score,
        highest_tile: duel.ai.board.grid.highest_tile(),
        moves,
        won: duel.ai.board.won,
        snapshot: duel.snapshot(),
    })
}
