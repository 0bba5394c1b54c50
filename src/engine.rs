use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::rng::Xorshift32;

/// A direction to slide/merge tiles.
///
/// Cell 0 is the least-significant nibble and renders bottom-right, so
/// `Right` packs every row toward its low nibble and `Down` packs every
/// column toward the low row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Stable one-byte code: Right=0, Down=1, Left=2, Up=3.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Move::Right => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Up => 3,
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = EngineError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Move::Right),
            1 => Ok(Move::Down),
            2 => Ok(Move::Left),
            3 => Ok(Move::Up),
            other => Err(EngineError::InvalidMoveCode(other)),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("cannot spawn a tile on a full board")]
    FullBoard,
    #[error("bounded draw requested with a zero bound")]
    ZeroBound,
    #[error("invalid move code: {0}")]
    InvalidMoveCode(u8),
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit rows
const ROW_MASK: u64 = 0xffff;
const NIBBLE_LOW_BITS: u64 = 0x1111_1111_1111_1111;

/// Divisor used by [`Board::features`].
pub const FEATURE_SCALE: f32 = 13.0;

struct Stores {
    slide_low: Box<[u16]>,
    slide_high: Box<[u16]>,
    score: Box<[u32]>,
}

type BoardRaw = u64;
type Row = u16;
type Score = u64;

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
///
/// Cell `i` lives in bits `4*i..4*i+4`; row `r` is bits `16*r..16*r+16`.
/// A nibble `v` is empty when 0, otherwise a tile of value `2^v`.
///
/// Every nibble is at most 15 by construction. Values built by hand through
/// [`Board::from_raw`] trivially satisfy that, but [`Board::with_tile`]
/// callers must not pass an exponent above 15.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

/// Where [`Board::spawn`] placed its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnedTile {
    pub index: usize,
    pub exponent: u8,
}

impl SpawnedTile {
    /// True for the rarer 4-tile.
    #[inline]
    pub fn is_four(self) -> bool { self.exponent == 2 }
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    #[inline]
    pub fn into_raw(self) -> BoardRaw { self.0 }

    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Nibble (exponent) at cell `idx`, 0 for empty.
    #[inline]
    pub fn tile(self, idx: usize) -> u8 {
        debug_assert!(idx < 16);
        ((self.0 >> (4 * idx)) & 0xf) as u8
    }

    /// Displayed value at cell `idx`: 0 if empty, else 2^exponent.
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 {
        match self.tile(idx) {
            0 => 0,
            v => 1 << v,
        }
    }

    /// Replace the nibble at `idx` with `exponent`.
    #[inline]
    pub fn with_tile(self, idx: usize, exponent: u8) -> Self {
        debug_assert!(idx < 16);
        debug_assert!(exponent <= 15, "tile exponent {exponent} does not fit in a nibble");
        let shift = 4 * idx;
        Board((self.0 & !(0xf << shift)) | (u64::from(exponent & 0xf) << shift))
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// A move that changes nothing returns a board equal to `self`; that equality is
    /// how callers detect an illegal move.
    ///
    /// ```
    /// use bitboard_2048::engine::{Board, Move};
    /// // row 0 holds 2,2,4,4 from cell 0 upward
    /// let b = Board::from_raw(0x2211);
    /// assert_eq!(b.shift(Move::Right), Board::from_raw(0x0032));
    /// assert_eq!(Board::EMPTY.shift(Move::Up), Board::EMPTY);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        let s = stores();
        match dir {
            Move::Right => Board(shift_rows(self.0, &s.slide_low)),
            Move::Left => Board(shift_rows(self.0, &s.slide_high)),
            Move::Down => Board(transpose(shift_rows(transpose(self.0), &s.slide_low))),
            Move::Up => Board(transpose(shift_rows(transpose(self.0), &s.slide_high))),
        }
    }

    /// Place a 2 (90%) or 4 (10%) on a uniformly chosen empty cell.
    ///
    /// Draws twice from `rng`: first the cell among the empty ones in index
    /// order, then the tile (a draw of 0 out of 10 gives the 4).
    ///
    /// ```
    /// use bitboard_2048::engine::{Board, EngineError};
    /// use bitboard_2048::rng::Xorshift32;
    /// let mut rng = Xorshift32::default();
    /// let (b, placed) = Board::EMPTY.spawn(&mut rng).unwrap();
    /// assert_eq!(b.count_empty(), 15);
    /// assert_eq!(b.tile(placed.index), placed.exponent);
    /// assert_eq!(Board::from_raw(u64::MAX).spawn(&mut rng), Err(EngineError::FullBoard));
    /// ```
    pub fn spawn(self, rng: &mut Xorshift32) -> Result<(Self, SpawnedTile), EngineError> {
        let empty = self.count_empty();
        if empty == 0 {
            return Err(EngineError::FullBoard);
        }
        let mut remaining = rng.draw(empty)?;
        let exponent = if rng.draw(10)? == 0 { 2 } else { 1 };
        let mut index = 0;
        loop {
            if self.tile(index) == 0 {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
            }
            index += 1;
        }
        let board = Board(self.0 | (u64::from(exponent) << (4 * index)));
        Ok((board, SpawnedTile { index, exponent }))
    }

    /// Like [`Board::spawn`] but only returns the board.
    #[inline]
    pub fn with_random_tile(self, rng: &mut Xorshift32) -> Result<Self, EngineError> {
        self.spawn(rng).map(|(board, _)| board)
    }

    /// Perform a move then insert a random tile if the move changed the board.
    ///
    /// Returns `Ok(None)` for a move that changes nothing; no draw happens then.
    pub fn make_move(self, dir: Move, rng: &mut Xorshift32) -> Result<Option<(Self, SpawnedTile)>, EngineError> {
        let moved = self.shift(dir);
        if moved == self {
            return Ok(None);
        }
        moved.spawn(rng).map(Some)
    }

    /// Sum of `(v - 1) * 2^v` over every tile: the score of all merges that
    /// built the layout, counting spawned 4s as if they had been merged.
    ///
    /// ```
    /// use bitboard_2048::engine::Board;
    /// assert_eq!(Board::EMPTY.with_tile(0, 3).score(), 16);
    /// ```
    #[inline]
    pub fn score(self) -> Score {
        let table = &stores().score;
        (0..4).fold(0, |acc, row_idx| {
            acc + Score::from(get_line_entry(table, extract_line(self.0, row_idx)))
        })
    }

    /// In-game score: [`Board::score`] minus 4 for every spawned 4-tile.
    #[inline]
    pub fn game_score(self, fours: u32) -> Score { self.score().saturating_sub(4 * Score::from(fours)) }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use bitboard_2048::engine::Board;
    /// // Nothing slides on an empty board either.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { Move::ALL.iter().all(|&dir| self.shift(dir) == self) }

    /// Directions that change the board, in [`Move::ALL`] order.
    pub fn legal_moves(self) -> impl Iterator<Item = Move> {
        Move::ALL.into_iter().filter(move |&dir| self.shift(dir) != self)
    }

    // https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
    /// Count the empty cells (0..=16).
    #[inline]
    pub fn count_empty(self) -> u32 {
        let b = self.0;
        // One flag bit per nibble, set when all four bits are clear.
        let flags = !(b | (b >> 1) | (b >> 2) | (b >> 3)) & NIBBLE_LOW_BITS;
        // Fold the four rows onto the low row: each lane holds 0..=4.
        let lanes = (flags + (flags >> 16) + (flags >> 32) + (flags >> 48)) & ROW_MASK;
        let pairs = (lanes & 0x0f0f) + ((lanes >> 4) & 0x0f0f);
        ((pairs & 0xff) + (pairs >> 8)) as u32
    }

    /// Count the occupied cells using a hardware popcount.
    #[inline]
    pub fn count_tiles(self) -> u32 {
        let mut b = self.0;
        b |= b >> 1;
        b |= b >> 2;
        b &= NIBBLE_LOW_BITS;
        b.count_ones()
    }

    /// Number of distinct tile values on the board.
    pub fn distinct(self) -> u32 {
        let mut seen = 0u16;
        let mut b = self.0;
        while b != 0 {
            seen |= 1 << (b & 0xf);
            b >>= 4;
        }
        // empty cells are not a value
        (seen & !1).count_ones()
    }

    /// Largest exponent on the board, 0 when empty.
    pub fn max_exponent(self) -> u8 { (0..16).map(|idx| self.tile(idx)).max().unwrap_or(0) }

    /// Highest tile value (e.g. 2048), 0 when empty.
    #[inline]
    pub fn highest_tile(self) -> u32 {
        match self.max_exponent() {
            0 => 0,
            v => 1 << v,
        }
    }

    #[inline]
    pub fn transpose(self) -> Self { Board(transpose(self.0)) }

    /// Mirror across the horizontal axis: row order is reversed.
    #[inline]
    pub fn flip_horizontal(self) -> Self {
        let halves = self.0.rotate_left(32);
        Board(((halves & 0x0000_ffff_0000_ffff) << 16) | ((halves >> 16) & 0x0000_ffff_0000_ffff))
    }

    /// Mirror across the vertical axis: cells within each row are reversed.
    #[inline]
    pub fn flip_vertical(self) -> Self {
        let a1 = self.0 & 0xf000_f000_f000_f000;
        let a2 = self.0 & 0x0f00_0f00_0f00_0f00;
        let a3 = self.0 & 0x00f0_00f0_00f0_00f0;
        let a4 = self.0 & 0x000f_000f_000f_000f;
        Board(a1 >> 12 | a2 >> 4 | a3 << 4 | a4 << 12)
    }

    /// All eight images under the symmetries of the square, starting with `self`.
    #[inline]
    pub fn symmetries(self) -> Symmetries { Symmetries { step: 0, board: self } }

    /// Per-cell model input in index order: `nibble / 13.0`.
    #[inline]
    pub fn features(self) -> [f32; 16] { std::array::from_fn(|idx| f32::from(self.tile(idx)) / FEATURE_SCALE) }
}

/// Iterator returned by [`Board::symmetries`].
///
/// Alternates row flips with cell flips and a single transpose so that every
/// step is one cheap operation away from the previous image.
#[derive(Debug, Clone)]
pub struct Symmetries {
    step: u8,
    board: Board,
}

impl Iterator for Symmetries {
    type Item = Board;

    fn next(&mut self) -> Option<Board> {
        self.board = match self.step {
            0 => self.board,
            1 | 3 | 5 | 7 => self.board.flip_horizontal(),
            2 | 6 => self.board.flip_vertical(),
            4 => self.board.transpose(),
            _ => return None,
        };
        self.step += 1;
        Some(self.board)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = 8usize.saturating_sub(self.step as usize);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Symmetries {}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Cell 15 is top-left, cell 0 bottom-right.
        for row in (0..4).rev() {
            let cells: Vec<String> = (0..4).rev().map(|col| format_val(self.tile_value(4 * row + col))).collect();
            writeln!(f, "{}", cells.join("|"))?;
            if row > 0 {
                writeln!(f, "-------------------------------")?;
            }
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.into_raw() } }

/// Initialize the lookup tables eagerly. Safe to call multiple times.
///
/// Every board operation initializes them on first use anyway; calling this at
/// startup keeps the one-time build out of the first move.
pub fn new() {
    STORES.get_or_init(create_stores);
}

/// Reverse the four nibbles of a row.
#[inline]
pub const fn reverse_row(row: Row) -> Row {
    ((row & 0xf000) >> 12) | ((row & 0x0f00) >> 4) | ((row & 0x00f0) << 4) | ((row & 0x000f) << 12)
}

/// Table entry for sliding `row` toward its low nibble.
#[inline]
pub fn slide_low(row: Row) -> Row { get_line_entry(&stores().slide_low, row) }

/// Table entry for sliding `row` toward its high nibble.
#[inline]
pub fn slide_high(row: Row) -> Row { get_line_entry(&stores().slide_high, row) }

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline(always)]
pub(crate) fn extract_line(board: BoardRaw, line_idx: u32) -> Row {
    ((board >> (16 * line_idx)) & ROW_MASK) as Row
}

static STORES: OnceLock<Stores> = OnceLock::new();

fn create_stores() -> Stores {
    // Allocate on the heap to avoid large stack frames
    let mut slide_low = vec![0u16; LINE_TABLE_SIZE];
    let mut slide_high = vec![0u16; LINE_TABLE_SIZE];
    let mut score = vec![0u32; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let row = val as Row;
        let res = compute_slide_low(row);
        slide_low[val] = res;
        slide_high[reverse_row(row) as usize] = reverse_row(res);
        score[val] = calc_score(row);
    }

    Stores {
        slide_low: slide_low.into_boxed_slice(),
        slide_high: slide_high.into_boxed_slice(),
        score: score.into_boxed_slice(),
    }
}

#[inline(always)]
fn stores() -> &'static Stores { STORES.get_or_init(create_stores) }

#[inline(always)]
fn get_line_entry<T: Copy>(table: &[T], idx: Row) -> T {
    debug_assert_eq!(table.len(), LINE_TABLE_SIZE);
    // SAFETY: every table holds LINE_TABLE_SIZE entries and `idx` is a u16.
    unsafe { *table.get_unchecked(idx as usize) }
}

fn shift_rows(board: BoardRaw, table: &[Row]) -> BoardRaw {
    (0..4).fold(0, |new_board, row_idx| {
        let new_row = get_line_entry(table, extract_line(board, row_idx));
        new_board | (u64::from(new_row) << (16 * row_idx))
    })
}

/// Slide the nonzero nibbles of `row` toward position 0, merging equal
/// neighbours once. A pair of 15s stays a single 15.
fn compute_slide_low(row: Row) -> Row {
    let mut out: Row = 0;
    let mut written = 0;
    let mut merge_candidate: Row = 0;
    for pos in 0..4 {
        let val = (row >> (4 * pos)) & 0xf;
        if val == 0 {
            continue;
        }
        if val == merge_candidate {
            let cursor = 4 * (written - 1);
            if (out >> cursor) & 0xf != 0xf {
                out += 1 << cursor;
            }
            merge_candidate = 0;
        } else {
            out |= val << (4 * written);
            written += 1;
            merge_candidate = val;
        }
    }
    out
}

// Credit to Nneonneo
fn calc_score(row: Row) -> u32 {
    (0..4).fold(0, |score, pos| {
        let tile_val = u32::from((row >> (4 * pos)) & 0xf);
        if tile_val >= 2 {
            // the score is the total sum of the tile and all intermediate merged tiles
            score + (tile_val - 1) * (1 << tile_val)
        } else {
            score
        }
    })
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
