//! Serializable snapshot of an engine and its validation rules.
//!
//! The JSON shape is `{ "size": 4, "grid": [[...]], "score": 0, "won": false }`
//! and must stay stable: saves written by earlier front ends are restored as-is.

use serde::{Deserialize, Serialize};

use super::board::{is_legal_value, Board, Tile};

/// Largest score a restore accepts. Play past it saturates instead of wrapping.
pub const MAX_SCORE: u64 = 1 << 62;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub size: usize,
    pub grid: Vec<Vec<Tile>>,
    #[serde(default)]
    pub score: u64,
    #[serde(default)]
    pub won: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("board size {found} does not match engine size {expected}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("grid has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("illegal cell value {value} at ({row}, {col})")]
    IllegalValue { row: usize, col: usize, value: Tile },
    #[error("score {0} is out of range")]
    ScoreOutOfRange(u64),
    #[error("malformed state: {0}")]
    Json(String),
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        StateError::Json(e.to_string())
    }
}

impl GameState {
    pub(crate) fn capture(board: &Board, score: u64, won: bool) -> Self {
        GameState { size: board.size(), grid: board.to_rows(), score, won }
    }

    /// Check shape, cell values and score against an engine of `expected_size`.
    pub fn validate(&self, expected_size: usize) -> Result<(), StateError> {
        if self.score > MAX_SCORE {
            return Err(StateError::ScoreOutOfRange(self.score));
        }
        if self.size != expected_size {
            return Err(StateError::SizeMismatch { expected: expected_size, found: self.size });
        }
        if self.grid.len() != expected_size {
            return Err(StateError::RowCount { expected: expected_size, found: self.grid.len() });
        }
        for (row, cells) in self.grid.iter().enumerate() {
            if cells.len() != expected_size {
                return Err(StateError::RaggedRow {
                    row,
                    expected: expected_size,
                    found: cells.len(),
                });
            }
            let illegal = cells.iter().enumerate().find(|(_, &v)| !is_legal_value(v));
            if let Some((col, &value)) = illegal {
                return Err(StateError::IllegalValue { row, col, value });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MAX_TILE, OBSTACLE};

    fn state(grid: Vec<Vec<Tile>>) -> GameState {
        GameState { size: grid.len(), grid, score: 12, won: false }
    }

    #[test]
    fn accepts_tiles_obstacles_and_empties() {
        let s = state(vec![vec![0, 2], vec![OBSTACLE, 4096]]);
        assert_eq!(s.validate(2), Ok(()));
    }

    #[test]
    fn rejects_wrong_size() {
        let s = state(vec![vec![0, 2], vec![2, 4]]);
        assert_eq!(s.validate(4), Err(StateError::SizeMismatch { expected: 4, found: 2 }));
    }

    #[test]
    fn rejects_size_field_disagreeing_with_grid() {
        let mut s = state(vec![vec![0, 2], vec![2, 4]]);
        s.size = 3;
        assert_eq!(s.validate(3), Err(StateError::RowCount { expected: 3, found: 2 }));
    }

    #[test]
    fn rejects_ragged_rows() {
        let s = state(vec![vec![0, 2], vec![2]]);
        assert_eq!(s.validate(2), Err(StateError::RaggedRow { row: 1, expected: 2, found: 1 }));
    }

    #[test]
    fn rejects_non_power_of_two() {
        let s = state(vec![vec![0, 2], vec![6, 4]]);
        assert_eq!(s.validate(2), Err(StateError::IllegalValue { row: 1, col: 0, value: 6 }));
        let s = state(vec![vec![1, 2], vec![2, 4]]);
        assert!(matches!(s.validate(2), Err(StateError::IllegalValue { value: 1, .. })));
    }

    #[test]
    fn rejects_values_that_would_overflow() {
        let s = state(vec![vec![MAX_TILE * 2, MAX_TILE * 2], vec![0, 0]]);
        assert_eq!(
            s.validate(2),
            Err(StateError::IllegalValue { row: 0, col: 0, value: MAX_TILE * 2 })
        );
        assert_eq!(state(vec![vec![MAX_TILE, MAX_TILE], vec![0, 0]]).validate(2), Ok(()));

        let mut s = state(vec![vec![2, 2], vec![0, 0]]);
        s.score = u64::MAX;
        assert_eq!(s.validate(2), Err(StateError::ScoreOutOfRange(u64::MAX)));
        s.score = MAX_SCORE;
        assert_eq!(s.validate(2), Ok(()));
    }

    #[test]
    fn json_shape_is_stable() {
        let s = state(vec![vec![0, 2], vec![4, 8]]);
        let json = s.to_json().unwrap();
        assert_eq!(json, r#"{"size":2,"grid":[[0,2],[4,8]],"score":12,"won":false}"#);
        assert_eq!(GameState::from_json(&json).unwrap(), s);
    }

    #[test]
    fn missing_score_and_won_default() {
        let s = GameState::from_json(r#"{"size":2,"grid":[[0,2],[4,8]]}"#).unwrap();
        assert_eq!(s.score, 0);
        assert!(!s.won);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(GameState::from_json("{\"size\":2}"), Err(StateError::Json(_))));
        assert!(matches!(GameState::from_json("not json"), Err(StateError::Json(_))));
    }
}
