use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::board::{Board, Position, Tile, OBSTACLE};
use super::state::{GameState, StateError};
use super::Move;
use crate::config::EngineConfig;

/// What a single [`GridEngine::make_move`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    /// Whether any cell changed. False means nothing else happened either.
    pub moved: bool,
    pub merges: usize,
    /// Destination cell of each merge.
    pub merged_positions: Vec<Position>,
    pub spawned_at: Option<Position>,
    /// True only on the move that first reached the win value.
    pub won: bool,
    pub score_gained: u64,
}

/// The board state machine. Synchronous and single-owner: callers serialize access.
///
/// `R` is the spawn RNG; [`GridEngine::with_seed`] gives reproducible games.
#[derive(Debug, Clone)]
pub struct GridEngine<R = StdRng> {
    board: Board,
    score: u64,
    won: bool,
    win_value: Tile,
    four_probability: f64,
    rng: R,
}

impl GridEngine<StdRng> {
    /// Fresh game seeded from OS entropy.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Fresh game whose spawns are fully determined by `seed`.
    pub fn with_seed(config: &EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GridEngine<R> {
    /// Fresh game (two tiles already spawned) drawing from `rng`.
    ///
    /// `config` is expected to have passed [`EngineConfig::validate`]; an
    /// out-of-range size is clamped.
    pub fn with_rng(config: &EngineConfig, rng: R) -> Self {
        let mut engine = GridEngine {
            board: Board::empty(config.size),
            score: 0,
            won: false,
            win_value: config.win_value,
            four_probability: config.four_probability,
            rng,
        };
        engine.reset();
        engine
    }

    /// Clear the board, zero the score and win flag, then spawn two tiles.
    ///
    /// Returns the second spawn position.
    pub fn reset(&mut self) -> Option<Position> {
        self.board = Board::empty(self.board.size());
        self.score = 0;
        self.won = false;
        self.board.spawn_random_tile(&mut self.rng, self.four_probability);
        let second = self.board.spawn_random_tile(&mut self.rng, self.four_probability);
        let n = self.board.size();
        debug!("reset {n}x{n} board, second spawn at {second:?}");
        second
    }

    /// Slide/merge toward `direction`, then spawn one tile if anything changed.
    ///
    /// A move that changes nothing returns `MoveResult::default()` and leaves
    /// board, score, win flag and RNG untouched.
    pub fn make_move(&mut self, direction: Move) -> MoveResult {
        let shift = self.board.shift(direction);
        if !shift.moved {
            debug!("move {} changed nothing", direction);
            return MoveResult::default();
        }

        self.board = shift.board;
        self.score = self.score.saturating_add(shift.score_gained);

        let won = !self.won
            && shift
                .merged_positions
                .iter()
                .any(|&pos| self.board.get(pos) == self.win_value);
        if won {
            self.won = true;
            info!("reached {} with score {}", self.win_value, self.score);
        }

        let spawned_at = self.board.spawn_random_tile(&mut self.rng, self.four_probability);
        debug!(
            "move {}: {} merges, +{} points, spawn at {:?}",
            direction,
            shift.merged_positions.len(),
            shift.score_gained,
            spawned_at
        );

        MoveResult {
            moved: true,
            merges: shift.merged_positions.len(),
            merged_positions: shift.merged_positions,
            spawned_at,
            won,
            score_gained: shift.score_gained,
        }
    }

    /// Place an obstacle in a random empty cell. `None` when the board is full.
    pub fn inject_obstacle(&mut self) -> Option<Position> {
        let pos = self.board.random_empty(&mut self.rng)?;
        self.board.set(pos, OBSTACLE);
        debug!("obstacle injected at {:?}", pos);
        Some(pos)
    }

    /// Replace the current game with `state` after validating it.
    ///
    /// On error the engine is left exactly as it was.
    pub fn set_state(&mut self, state: &GameState) -> Result<(), StateError> {
        if let Err(e) = state.validate(self.board.size()) {
            warn!("rejected restore: {e}");
            return Err(e);
        }
        self.board = Board::from_rows_unchecked(&state.grid);
        self.score = state.score;
        self.won = state.won;
        debug!("restored state with score {}", self.score);
        Ok(())
    }
}

impl<R> GridEngine<R> {
    /// Independent snapshot of the current game.
    pub fn state(&self) -> GameState {
        GameState::capture(&self.board, self.score, self.won)
    }

    /// No empty cell and no adjacent equal tiles.
    pub fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    /// Directions that would change the board. Does not spawn or touch the RNG.
    pub fn legal_moves(&self) -> Vec<Move> {
        Move::ALL.into_iter().filter(|&m| self.board.shift(m).moved).collect()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn win_value(&self) -> Tile {
        self.win_value
    }

    pub fn highest_tile(&self) -> Tile {
        self.board.highest_tile()
    }
}
