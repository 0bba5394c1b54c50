//! Binary training-record stream and game-summary files.
//!
//! Training stream layout (all little-endian):
//! - `u32` record count
//! - `count` records of `u64` board followed by `f32` target
//!
//! Game summaries are written with postcard.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::game::GameSummary;

const HEADER_LEN: usize = 4;
/// Bytes per record: 8 board + 4 target.
pub const RECORD_LEN: usize = 12;

/// One row for an external value learner: a board and its regression target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub board: u64,
    pub target: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("missing record count header")]
    MissingHeader,
    #[error("header announces {expected} records but only {found} are present")]
    Truncated { expected: u32, found: usize },
    #[error("{0} trailing bytes after the last record")]
    TrailingBytes(usize),
    #[error("{0} records do not fit a u32 count")]
    TooMany(usize),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    let b: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(b))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    let b: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(b))
}

pub fn encode_records(records: &[TrainingRecord]) -> Result<Vec<u8>, RecordError> {
    let count: u32 = records.len().try_into().map_err(|_| RecordError::TooMany(records.len()))?;
    let mut buf = Vec::with_capacity(HEADER_LEN + records.len() * RECORD_LEN);
    buf.extend_from_slice(&count.to_le_bytes());
    for rec in records {
        buf.extend_from_slice(&rec.board.to_le_bytes());
        buf.extend_from_slice(&rec.target.to_bits().to_le_bytes());
    }
    Ok(buf)
}

pub fn write_records<W: Write>(mut writer: W, records: &[TrainingRecord]) -> Result<(), RecordError> {
    let data = encode_records(records)?;
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

pub fn write_records_to_path<P: AsRef<Path>>(path: P, records: &[TrainingRecord]) -> Result<(), RecordError> {
    let f = fs::File::create(path)?;
    write_records(io::BufWriter::new(f), records)
}

pub fn parse_records_bytes(bytes: &[u8]) -> Result<Vec<TrainingRecord>, RecordError> {
    let expected = read_u32_le(bytes).ok_or(RecordError::MissingHeader)?;
    let body = &bytes[HEADER_LEN..];
    let found = body.len() / RECORD_LEN;
    if found < expected as usize {
        return Err(RecordError::Truncated { expected, found });
    }
    let used = expected as usize * RECORD_LEN;
    if body.len() > used {
        return Err(RecordError::TrailingBytes(body.len() - used));
    }

    let mut records = Vec::with_capacity(expected as usize);
    for chunk in body.chunks_exact(RECORD_LEN) {
        let board = read_u64_le(chunk).ok_or(RecordError::Truncated { expected, found })?;
        let target = read_u32_le(&chunk[8..]).map(f32::from_bits).ok_or(RecordError::Truncated { expected, found })?;
        records.push(TrainingRecord { board, target });
    }
    Ok(records)
}

pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<TrainingRecord>, RecordError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_records_bytes(&data)
}

pub fn read_records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingRecord>, RecordError> {
    let data = fs::read(path)?;
    parse_records_bytes(&data)
}

/// Write postcard-encoded game summaries to a file.
pub fn write_summaries_to_path<P: AsRef<Path>>(path: P, summaries: &[GameSummary]) -> Result<(), RecordError> {
    let bytes = postcard::to_allocvec(summaries)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read postcard-encoded game summaries from a file.
pub fn read_summaries_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<GameSummary>, RecordError> {
    let bytes = fs::read(path)?;
    Ok(postcard::from_bytes(&bytes)?)
}
