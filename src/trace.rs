//! Binary run traces.
//!
//! A trace stores the engine config, the spawn seed and the move sequence of
//! one game. Because spawns are a pure function of the seed, that is enough
//! to rebuild every intermediate board with [`replay`].
//!
//! Layout (little-endian): magic, version, endianness, size, seed, win value,
//! four-probability bits, steps, start time, elapsed seconds, final score,
//! highest tile, one byte per move, then a CRC32C of all preceding bytes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engine::{GridEngine, Move, Tile};

const MAGIC: &[u8; 4] = b"MGT1"; // ASCII magic
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0; // 0 = little-endian
// 4 magic + 1 version + 1 endian + 1 size + 8 seed + 8 win + 8 prob + 4 steps
// + 8 start + 4 elapsed + 8 final score + 8 highest tile
const HEADER_LEN: usize = 4 + 1 + 1 + 1 + 8 + 8 + 8 + 4 + 8 + 4 + 8 + 8;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub config: EngineConfig,
    pub seed: u64,
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub final_score: u64,
    pub highest_tile: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub meta: Meta,
    pub moves: Vec<Move>, // length = steps
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error("invalid move code {0}")]
    MoveCode(u8),
    #[error("invalid engine config: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("run of {0} moves does not fit in a trace")]
    TooLong(usize),
    #[error("replay ended with score {found}, trace recorded {expected}")]
    Divergence { expected: u64, found: u64 },
}

/// Collects the moves of a seeded game while it is played.
#[derive(Debug)]
pub struct Recorder {
    config: EngineConfig,
    seed: u64,
    start_unix_s: u64,
    started: Instant,
    moves: Vec<Move>,
}

impl Recorder {
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        Recorder {
            config: config.clone(),
            seed,
            start_unix_s: now_unix_seconds(),
            started: Instant::now(),
            moves: Vec::with_capacity(1024),
        }
    }

    /// Record a move that was applied to the engine. No-op moves may be
    /// recorded too; they replay as no-ops.
    pub fn record(&mut self, direction: Move) {
        self.moves.push(direction);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Close the run against the engine it was recorded from.
    pub fn finish<R>(self, engine: &GridEngine<R>) -> Result<Run, TraceError> {
        let meta = Meta {
            config: self.config,
            seed: self.seed,
            steps: step_count(self.moves.len())?,
            start_unix_s: self.start_unix_s,
            elapsed_s: self.started.elapsed().as_secs_f32(),
            final_score: engine.score(),
            highest_tile: engine.highest_tile() as u64,
        };
        Ok(Run { meta, moves: self.moves })
    }
}

/// The header stores the move count as a `u32`.
fn step_count(moves: usize) -> Result<u32, TraceError> {
    u32::try_from(moves).map_err(|_| TraceError::TooLong(moves))
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(raw))
}

pub fn encode_run(run: &Run) -> Vec<u8> {
    let meta = &run.meta;
    // Validate lengths consistent
    assert_eq!(run.moves.len(), meta.steps as usize);

    let mut buf = Vec::with_capacity(HEADER_LEN + run.moves.len() + CHECKSUM_LEN);

    // Header
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.push(meta.config.size as u8);
    buf.extend_from_slice(&meta.seed.to_le_bytes());
    buf.extend_from_slice(&(meta.config.win_value as u64).to_le_bytes());
    buf.extend_from_slice(&meta.config.four_probability.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.final_score.to_le_bytes());
    buf.extend_from_slice(&meta.highest_tile.to_le_bytes());

    // Payload: one code per move
    buf.extend(run.moves.iter().map(|m| m.code()));

    // Trailer: CRC32C of all preceding bytes
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

pub fn write_run_to_path<P: AsRef<Path>>(path: P, run: &Run) -> Result<(), TraceError> {
    let data = encode_run(run);
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }

    // Validate checksum first to avoid panics while reading fields
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = read_u32_le(trailer).ok_or(TraceError::Malformed)?;
    if file_crc != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }

    // Fixed header
    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    if content[5] != ENDIAN_LE {
        return Err(TraceError::Endianness);
    }

    let size = content[6] as usize;
    let mut off = 7;
    let next_u64 = |off: &mut usize| -> Result<u64, TraceError> {
        let v = read_u64_le(&content[*off..]).ok_or(TraceError::Malformed)?;
        *off += 8;
        Ok(v)
    };
    let seed = next_u64(&mut off)?;
    let win_value = next_u64(&mut off)? as Tile;
    let four_probability = f64::from_bits(next_u64(&mut off)?);
    let steps = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let start_unix_s = next_u64(&mut off)?;
    let elapsed_s = f32::from_bits(read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?);
    off += 4;
    let final_score = next_u64(&mut off)?;
    let highest_tile = next_u64(&mut off)?;

    if content.len() != off + steps as usize {
        return Err(TraceError::Malformed);
    }
    let moves = content[off..]
        .iter()
        .map(|&b| Move::try_from(b).map_err(|_| TraceError::MoveCode(b)))
        .collect::<Result<Vec<_>, _>>()?;

    let config = EngineConfig { size, win_value, four_probability };
    let meta = Meta { config, seed, steps, start_unix_s, elapsed_s, final_score, highest_tile };
    Ok(Run { meta, moves })
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

/// Rebuild the final engine of a run and check it against the recorded score.
pub fn replay(run: &Run) -> Result<GridEngine, TraceError> {
    run.meta.config.validate()?;
    let mut engine = GridEngine::with_seed(&run.meta.config, run.meta.seed);
    for &m in &run.moves {
        engine.make_move(m);
    }
    if engine.score() != run.meta.final_score {
        return Err(TraceError::Divergence {
            expected: run.meta.final_score,
            found: engine.score(),
        });
    }
    Ok(engine)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
