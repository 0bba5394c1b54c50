use std::path::PathBuf;

use anyhow::Context;
use bitboard_2048::engine::Board;
use bitboard_2048::record;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "records",
    version,
    about = "Inspect training-record streams and game-summary files"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a (board, target) training-record stream
    Training {
        /// Record file written by `bitboard-2048 --record`
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Print the first N records as boards
        #[arg(long, default_value_t = 0)]
        head: usize,
    },
    /// List game summaries written by `bitboard-2048 --summaries`
    Summaries {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Training { path, head } => {
            let records = record::read_records_from_path(&path)
                .with_context(|| format!("reading training records from {}", path.display()))?;
            println!("file: {}", path.display());
            println!("records: {}", records.len());
            if !records.is_empty() {
                let (mut lo, mut hi, mut sum) = (f32::INFINITY, f32::NEG_INFINITY, 0f64);
                for rec in &records {
                    lo = lo.min(rec.target);
                    hi = hi.max(rec.target);
                    sum += f64::from(rec.target);
                }
                println!("target: min={:.1} max={:.1} mean={:.1}", lo, hi, sum / records.len() as f64);
            }
            for rec in records.iter().take(head) {
                let board = Board::from_raw(rec.board);
                println!("{:?} target={:.1} empty={}", board, rec.target, board.count_empty());
                println!("{}", board);
            }
        }
        Command::Summaries { path } => {
            let summaries = record::read_summaries_from_path(&path)
                .with_context(|| format!("reading game summaries from {}", path.display()))?;
            for s in &summaries {
                println!(
                    "seed={:#010x} score={} raw_score={} moves={} highest={} fours={}",
                    s.seed, s.game_score, s.score, s.moves, s.highest_tile, s.fours
                );
            }
            let best = summaries.iter().map(|s| s.highest_tile).max().unwrap_or(0);
            eprintln!("games: {} | highest tile seen: {}", summaries.len(), best);
        }
    }
    Ok(())
}
