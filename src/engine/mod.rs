//! The grid engine: board representation, sliding/merging, spawning and
//! terminal detection.
//!
//! ```
//! use grid_2048::config::EngineConfig;
//! use grid_2048::engine::{GridEngine, Move};
//!
//! let mut engine = GridEngine::with_seed(&EngineConfig::default(), 7);
//! let result = engine.make_move(Move::Left);
//! assert!(engine.score() >= result.score_gained);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod board;
pub mod game;
pub mod state;
pub mod traversal;

pub use board::{Board, Position, Tile, MAX_TILE, OBSTACLE};
pub use game::{GridEngine, MoveResult};
pub use state::{GameState, StateError, MAX_SCORE};
pub use traversal::Traversal;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Stable one-byte code used by run traces (0=Up, 1=Down, 2=Left, 3=Right).
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseMoveError {
    #[error("unknown direction {0:?}")]
    Unknown(String),
    #[error("invalid direction code {0}")]
    Code(u8),
}

impl TryFrom<u8> for Move {
    type Error = ParseMoveError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Move::Up),
            1 => Ok(Move::Down),
            2 => Ok(Move::Left),
            3 => Ok(Move::Right),
            other => Err(ParseMoveError::Code(other)),
        }
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    /// Accepts direction names, WASD keys and browser arrow-key names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" | "arrowup" => Ok(Move::Up),
            "down" | "s" | "arrowdown" => Ok(Move::Down),
            "left" | "a" | "arrowleft" => Ok(Move::Left),
            "right" | "d" | "arrowright" => Ok(Move::Right),
            _ => Err(ParseMoveError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_keys_and_arrows() {
        assert_eq!("up".parse::<Move>(), Ok(Move::Up));
        assert_eq!("S".parse::<Move>(), Ok(Move::Down));
        assert_eq!("ArrowLeft".parse::<Move>(), Ok(Move::Left));
        assert_eq!(" right\n".parse::<Move>(), Ok(Move::Right));
    }

    #[test]
    fn rejects_unknown_direction() {
        assert_eq!(
            "diagonal".parse::<Move>(),
            Err(ParseMoveError::Unknown("diagonal".to_string()))
        );
        assert_eq!(Move::try_from(4), Err(ParseMoveError::Code(4)));
    }

    #[test]
    fn codes_are_stable() {
        for m in Move::ALL {
            assert_eq!(Move::try_from(m.code()), Ok(m));
        }
        assert_eq!(Move::Left.code(), 2);
    }
}
