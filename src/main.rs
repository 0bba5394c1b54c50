use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use bitboard_2048::engine::{self as GameEngine, Board, EngineError};
use bitboard_2048::game::{seed_for_game, FixedOrder, Game, GameSummary, Greedy, Policy};
use bitboard_2048::record::{self, TrainingRecord};
use bitboard_2048::stats::MovingAverage;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    /// Best immediate merge score, then most empty cells
    Greedy,
    /// First legal move of Down, Right, Left, Up
    Fixed,
}

#[derive(Parser, Debug)]
#[command(
    name = "bitboard-2048",
    version,
    about = "Play deterministic 2048 games on the packed bitboard engine"
)]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1)]
    games: u32,
    /// Base seed, decimal or 0x-prefixed hex. Game i derives its own seed from it
    #[arg(short, long, value_parser = parse_seed, default_value = "0x17004711")]
    seed: u32,
    /// Move policy
    #[arg(short, long, value_enum, default_value_t = PolicyKind::Greedy)]
    policy: PolicyKind,
    /// Write (board, score-to-go) training records to this file
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,
    /// Write postcard-encoded game summaries to this file
    #[arg(long, value_name = "FILE")]
    summaries: Option<PathBuf>,
    /// Print the final board of every game
    #[arg(long)]
    show: bool,
    /// Window of the trailing average score
    #[arg(long, default_value_t = 1000)]
    window: usize,
    /// Disable the progress bar
    #[arg(short, long)]
    quiet: bool,
}

struct Played {
    summary: GameSummary,
    final_board: Board,
    records: Vec<TrainingRecord>,
}

fn parse_seed(s: &str) -> Result<u32, String> {
    let digits = s.replace('_', "");
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.map_err(|e| format!("invalid seed {s:?}: {e}"))
}

fn play_one(seed: u32, kind: PolicyKind, record: bool) -> Result<Played, EngineError> {
    let mut game = Game::new(seed)?;
    let mut policy: Box<dyn Policy> = match kind {
        PolicyKind::Greedy => Box::new(Greedy),
        PolicyKind::Fixed => Box::new(FixedOrder::default()),
    };
    let mut records = Vec::new();
    let summary = if record {
        game.play_out_recorded(policy.as_mut(), &mut records)?
    } else {
        game.play_out(policy.as_mut())?
    };
    Ok(Played { summary, final_board: game.board(), records })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    GameEngine::new();
    let start = Instant::now();

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(u64::from(args.games));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb
    };

    // Each game owns its generator, so the results do not depend on scheduling.
    let record = args.record.is_some();
    let played = (0..args.games)
        .into_par_iter()
        .map(|idx| {
            let res = play_one(seed_for_game(args.seed, idx), args.policy, record);
            pb.inc(1);
            res
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_and_clear();

    let mut trailing = MovingAverage::new(args.window);
    let mut total: u64 = 0;
    let mut best: Option<GameSummary> = None;
    for (idx, p) in played.iter().enumerate() {
        let s = &p.summary;
        println!(
            "game {}: seed={:#010x} score={} moves={} highest={} fours={}",
            idx, s.seed, s.game_score, s.moves, s.highest_tile, s.fours
        );
        if args.show {
            println!("{}", p.final_board);
        }
        trailing.push(s.game_score as f64);
        total += s.game_score;
        if best.map_or(true, |b| s.game_score > b.game_score) {
            best = Some(*s);
        }
    }

    if let Some(path) = &args.record {
        let all: Vec<TrainingRecord> = played.iter().flat_map(|p| p.records.iter().copied()).collect();
        record::write_records_to_path(path, &all)
            .with_context(|| format!("writing training records to {}", path.display()))?;
        eprintln!("Wrote {} training records to {}", all.len(), path.display());
    }
    if let Some(path) = &args.summaries {
        let summaries: Vec<GameSummary> = played.iter().map(|p| p.summary).collect();
        record::write_summaries_to_path(path, &summaries)
            .with_context(|| format!("writing game summaries to {}", path.display()))?;
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    if let Some(best) = best {
        eprintln!(
            "Games: {} | mean score: {:.1} | trailing mean ({}): {:.1} | best: {} (seed {:#010x}) | games/sec: {:.1}",
            played.len(),
            total as f64 / played.len() as f64,
            trailing.window(),
            trailing.mean().unwrap_or(0.0),
            best.game_score,
            best.seed,
            played.len() as f64 / elapsed,
        );
    } else {
        eprintln!("No games played");
    }
    Ok(())
}
