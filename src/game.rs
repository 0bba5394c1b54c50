//! The move/spawn loop around the engine.
//!
//! A [`Game`] owns its board, its generator and a few counters. Each step
//! slides the board, treats an unchanged board as an illegal move, and
//! otherwise spawns a tile. Games created from the same seed and driven by
//! the same policy always play out identically.

use serde::{Deserialize, Serialize};

use crate::engine::{Board, EngineError, Move, SpawnedTile};
use crate::record::TrainingRecord;
use crate::rng::Xorshift32;

/// Picks the next direction for a board, or `None` to stop.
///
/// Implementations should only return moves that change the board; the
/// game loop ends on the first move that does not.
pub trait Policy {
    fn choose(&mut self, board: Board) -> Option<Move>;
}

/// First legal move from a fixed priority list.
#[derive(Debug, Clone)]
pub struct FixedOrder {
    order: [Move; 4],
}

impl FixedOrder {
    pub fn new(order: [Move; 4]) -> Self { FixedOrder { order } }
}

impl Default for FixedOrder {
    /// Keep tiles in the bottom-right corner.
    fn default() -> Self { FixedOrder::new([Move::Down, Move::Right, Move::Left, Move::Up]) }
}

impl Policy for FixedOrder {
    fn choose(&mut self, board: Board) -> Option<Move> {
        self.order.iter().copied().find(|&dir| board.shift(dir) != board)
    }
}

/// Legal move with the largest immediate score, then the most empty cells.
/// Ties go to the earlier direction in [`Move::ALL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Policy for Greedy {
    fn choose(&mut self, board: Board) -> Option<Move> {
        let mut best: Option<((u64, u32), Move)> = None;
        for dir in Move::ALL {
            let moved = board.shift(dir);
            if moved == board {
                continue;
            }
            let key = (moved.score(), moved.count_empty());
            if best.map_or(true, |(best_key, _)| key > best_key) {
                best = Some((key, dir));
            }
        }
        best.map(|(_, dir)| dir)
    }
}

/// Result of [`Game::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The move changed nothing; no tile spawned and no draw was made.
    Illegal,
    /// The move was applied; `reward` is the score gained by its merges.
    Moved { reward: u64, spawned: SpawnedTile },
}

/// Final statistics of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub seed: u32,
    pub score: u64,
    pub game_score: u64,
    pub highest_tile: u32,
    pub moves: u32,
    pub fours: u32,
}

#[derive(Debug, Clone)]
pub struct Game {
    seed: u32,
    board: Board,
    rng: Xorshift32,
    fours: u32,
    moves: u32,
}

/// Seed for game `game_idx` of a batch started from `base`.
///
/// Game 0 uses `base` itself.
#[inline]
pub fn seed_for_game(base: u32, game_idx: u32) -> u32 { base ^ game_idx.wrapping_mul(0x9e37_79b9) }

impl Game {
    /// Start a game: two tiles spawned on an empty board.
    pub fn new(seed: u32) -> Result<Self, EngineError> {
        let mut game = Game::from_board(Board::EMPTY, Xorshift32::new(seed));
        game.seed = seed;
        for _ in 0..2 {
            let (board, spawned) = game.board.spawn(&mut game.rng)?;
            game.board = board;
            game.fours += u32::from(spawned.is_four());
        }
        Ok(game)
    }

    /// Resume from an arbitrary position.
    pub fn from_board(board: Board, rng: Xorshift32) -> Self {
        Game { seed: rng.state(), board, rng, fours: 0, moves: 0 }
    }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    #[inline]
    pub fn fours(&self) -> u32 { self.fours }

    #[inline]
    pub fn moves(&self) -> u32 { self.moves }

    #[inline]
    pub fn rng(&self) -> &Xorshift32 { &self.rng }

    #[inline]
    pub fn is_over(&self) -> bool { self.board.is_game_over() }

    #[inline]
    pub fn game_score(&self) -> u64 { self.board.game_score(self.fours) }

    pub fn step(&mut self, dir: Move) -> Result<StepOutcome, EngineError> {
        let moved = self.board.shift(dir);
        if moved == self.board {
            return Ok(StepOutcome::Illegal);
        }
        // saturated 15+15 merges lose score, hence saturating
        let reward = moved.score().saturating_sub(self.board.score());
        let (board, spawned) = moved.spawn(&mut self.rng)?;
        self.board = board;
        self.moves += 1;
        self.fours += u32::from(spawned.is_four());
        Ok(StepOutcome::Moved { reward, spawned })
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            seed: self.seed,
            score: self.board.score(),
            game_score: self.game_score(),
            highest_tile: self.board.highest_tile(),
            moves: self.moves,
            fours: self.fours,
        }
    }

    /// Let `policy` play until no move is possible, the policy stops, or it
    /// returns a move that changes nothing.
    pub fn play_out<P: Policy + ?Sized>(&mut self, policy: &mut P) -> Result<GameSummary, EngineError> {
        self.play(policy, |_, _| {})?;
        Ok(self.summary())
    }

    /// Like [`Game::play_out`], appending one record per applied move: the
    /// board before the move and the game score still to be earned from it.
    pub fn play_out_recorded<P: Policy + ?Sized>(
        &mut self,
        policy: &mut P,
        records: &mut Vec<TrainingRecord>,
    ) -> Result<GameSummary, EngineError> {
        let mut visited: Vec<(Board, u64)> = Vec::new();
        self.play(policy, |board, score| visited.push((board, score)))?;
        let final_score = self.game_score();
        records.extend(visited.into_iter().map(|(board, score)| TrainingRecord {
            board: board.raw(),
            target: final_score.saturating_sub(score) as f32,
        }));
        Ok(self.summary())
    }

    fn play<P, F>(&mut self, policy: &mut P, mut on_move: F) -> Result<(), EngineError>
    where
        P: Policy + ?Sized,
        F: FnMut(Board, u64),
    {
        while !self.is_over() {
            let Some(dir) = policy.choose(self.board) else { break };
            let (before, score) = (self.board, self.game_score());
            match self.step(dir)? {
                StepOutcome::Illegal => break,
                StepOutcome::Moved { .. } => on_move(before, score),
            }
        }
        Ok(())
    }
}
