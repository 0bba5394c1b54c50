//! bitboard-2048: a deterministic 2048 engine on a packed `u64` board
//!
//! This crate provides:
//! - A compact `Board` type with table-driven moves (`shift`), SWAR empty-cell
//!   counting, spawning, scoring and the symmetries of the square (`engine` module)
//! - An explicit xorshift generator so a seed fully determines a game (`rng` module)
//! - A small game loop with pluggable move policies (`game` module)
//! - The little-endian training-record stream consumed by value learners (`record` module)
//!
//! Quick start:
//! ```
//! use bitboard_2048::engine::{self as GameEngine, Board, Move};
//! use bitboard_2048::rng::Xorshift32;
//!
//! // One-time table init (optional; first use does it too)
//! GameEngine::new();
//!
//! // Deterministic board initialization with a seeded generator
//! let mut rng = Xorshift32::new(42);
//! let b0 = Board::EMPTY.with_random_tile(&mut rng)?.with_random_tile(&mut rng)?;
//! let b1 = b0.shift(Move::Left);
//! if b1 != b0 {
//!     let _b2 = b1.with_random_tile(&mut rng)?;
//! }
//! # Ok::<(), bitboard_2048::engine::EngineError>(())
//! ```
//!
//! Full loop
//! ```
//! use bitboard_2048::game::{Game, Greedy};
//!
//! let mut game = Game::new(123)?;
//! let summary = game.play_out(&mut Greedy)?;
//! assert!(game.is_over());
//! assert_eq!(summary.score, game.board().score());
//! # Ok::<(), bitboard_2048::engine::EngineError>(())
//! ```
//!
pub mod engine;
pub mod game;
pub mod record;
pub mod rng;
pub mod stats;
