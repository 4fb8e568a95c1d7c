use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use obstacle_2048::ai::{choose_ai_move, Persona};
use obstacle_2048::game::Duel;
use obstacle_2048::ids::SequentialIds;
use obstacle_2048::level::Level;
use obstacle_2048::serialization;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};

/// Play one duel where a persona stands in for the human player.
#[derive(Debug, Parser)]
#[command(name = "obstacle-2048", about = "Watch a persona race the AI on an obstacle level")]
struct Args {
    /// Built-in level index (0-4)
    #[arg(long, default_value_t = 0)]
    level: usize,

    /// Load the level from a TOML file instead
    #[arg(long, conflicts_with = "level")]
    level_file: Option<PathBuf>,

    /// Persona driving the AI board
    #[arg(long, default_value = "balanced")]
    persona: String,

    /// Persona choosing the player's moves
    #[arg(long, default_value = "strategic")]
    player: String,

    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many player turns
    #[arg(long, default_value_t = 2000)]
    max_turns: u64,

    /// Keep playing after the player reaches the winning tile
    #[arg(long)]
    keep_playing: bool,

    /// Extra lives granted to the player
    #[arg(long, default_value_t = 0)]
    lives: u32,

    /// Print both boards every N turns (0 = final boards only)
    #[arg(long, default_value_t = 0)]
    every: u64,

    /// Resume from a saved duel
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the duel here when it ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let level = match &args.level_file {
        Some(path) => Level::from_toml_path(path)?,
        None => Level::by_index(args.level)?,
    };
    let persona = Persona::from_name(&args.persona);
    let player_persona = Persona::from_name(&args.player);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let saved = match &args.load {
        Some(path) => Some(std::fs::read(path).with_context(|| format!("reading {}", path.display()))?),
        None => None,
    };
    let mut duel = Duel::restore_or_new(saved.as_deref(), level, persona, &mut rng)?;
    duel.add_extra_lives(args.lives);
    tracing::info!(level = %duel.level().name, player = %player_persona, ai = %duel.ai.persona, "duel started");

    let mut probe = SequentialIds::with_prefix("probe");
    let mut turns = 0u64;
    while turns < args.max_turns {
        if duel.player.won && !duel.player.keep_playing {
            if !args.keep_playing {
                break;
            }
            duel.continue_playing();
        }
        if duel.player.over && !duel.use_extra_life() {
            break;
        }
        let obstacles = &duel.level().obstacles;
        let pick = choose_ai_move(&duel.player.grid, obstacles, duel.player.score, player_persona, &mut rng, &mut probe);
        let Some(direction) = pick.direction else {
            break;
        };
        duel.play_turn(direction, &mut rng);
        turns += 1;
        if args.every > 0 && turns % args.every == 0 {
            print_boards(&duel, turns);
        }
    }

    print_boards(&duel, turns);
    let verdict = match duel.player.score.cmp(&duel.ai.board.score) {
        std::cmp::Ordering::Greater => "player leads",
        std::cmp::Ordering::Less => "ai leads",
        std::cmp::Ordering::Equal => "tied",
    };
    println!(
        "Turns: {} | player ({}): {} | ai ({}): {} | {}",
        turns,
        player_persona.name(),
        duel.player.score,
        duel.ai.persona.name(),
        duel.ai.board.score,
        verdict
    );

    if let Some(path) = args.save {
        serialization::write_to_path(&path, &duel.snapshot()).with_context(|| format!("saving {}", path.display()))?;
        tracing::info!(path = %path.display(), "duel saved");
    }
    Ok(())
}

fn print_boards(duel: &Duel, turn: u64) {
    println!("== turn {turn} ==");
    println!("player  score {}  best {}", duel.player.score, duel.player.best_score);
    println!("{}", duel.player.grid);
    println!("ai      score {}  best {}", duel.ai.board.score, duel.ai.board.best_score);
    println!("{}", duel.ai.board.grid);
}
