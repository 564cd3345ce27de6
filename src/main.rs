//! Arena Raid headless runner
//!
//! Plays a session with the built-in autopilot, records the result in the
//! score table and prints the leaderboard.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use arena_raid::sim::{GamePhase, GameState, TickInput, TickTime, tick};
use arena_raid::{ChasePolicy, HighScores, ScoreStore, Settings};

#[derive(Parser, Debug)]
#[command(name = "arena-raid")]
#[command(about = "Run a headless Arena Raid session driven by the autopilot")]
struct Cli {
    /// Session seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Stop after this many ticks (60 per simulated second)
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// Name recorded in the score table
    #[arg(long, default_value = "autopilot")]
    name: String,
    /// JSON score file; scores are kept in memory only when omitted
    #[arg(long)]
    scores: Option<PathBuf>,
    /// JSON settings file; defaults are used when omitted
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the NPC chase policy from the settings
    #[arg(long, value_enum)]
    chase: Option<CliChase>,
    /// How many leaderboard rows to print
    #[arg(long, default_value_t = 10)]
    top: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliChase {
    Sticky,
    Revert,
}

impl From<CliChase> for ChasePolicy {
    fn from(value: CliChase) -> Self {
        match value {
            CliChase::Sticky => ChasePolicy::Sticky,
            CliChase::Revert => ChasePolicy::Revert,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => Settings::from_file(path).with_context(|| format!("loading settings {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(chase) = cli.chase {
        settings.npc.chase_policy = chase.into();
    }

    let mut scores = match &cli.scores {
        Some(path) => HighScores::open(path).with_context(|| format!("opening score file {}", path.display()))?,
        None => HighScores::new(),
    };

    log::info!("Arena Raid starting (seed {}, up to {} ticks)", cli.seed, cli.ticks);
    let mut state = GameState::new(settings, cli.seed);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut n = 0;
    while n < cli.ticks && state.phase == GamePhase::Playing {
        tick(&mut state, &input, TickTime::fixed(n));
        n += 1;
        if n % 3600 == 0 {
            log::info!("{}", state.hud_text());
        }
    }

    let outcome = if state.is_player_dead() { "died" } else { "survived" };
    println!(
        "{} {outcome} after {n} ticks: {} kills, reached wave {}",
        cli.name,
        state.kills(),
        state.waves.wave()
    );

    scores
        .add_score(&cli.name, state.final_score())
        .context("recording score")?;

    println!("\nTop scores:");
    for (i, entry) in scores.get_top_scores(cli.top).iter().enumerate() {
        println!("{:>3}. {:<16} {:>6}", i + 1, entry.name, entry.score);
    }
    Ok(())
}
