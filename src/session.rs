//! Host-side game loop glue.
//!
//! A [`Session`] owns one engine plus the collaborators the engine must not
//! know about: a [`SaveStore`] and a [`PlatformCapabilities`] implementation.
//! The host feeds it one [`Move`] per discrete input and reacts to the
//! returned [`Turn`].

use log::{info, warn};
use rand::rngs::StdRng;
use rand::Rng;

use crate::engine::{GridEngine, Move, MoveResult, Position};
use crate::platform::PlatformCapabilities;
use crate::store::SaveStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Playing,
    /// This move reached the win value. Play may continue.
    Won,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub result: MoveResult,
    pub outcome: Outcome,
}

pub struct Session<P, S, R = StdRng> {
    engine: GridEngine<R>,
    platform: P,
    store: S,
    best: u64,
    /// Score already submitted for the current finished game.
    over_reported: bool,
}

impl<P: PlatformCapabilities, S: SaveStore, R: Rng> Session<P, S, R> {
    pub fn new(engine: GridEngine<R>, platform: P, mut store: S) -> Self {
        let best = store.best_score().unwrap_or_else(|e| {
            warn!("could not read best score: {e}");
            0
        });
        Session { engine, platform, store, best, over_reported: false }
    }

    /// Initialize the platform, signal readiness, then resume or start a game.
    ///
    /// Returns true if a saved game was restored.
    pub fn start(&mut self) -> bool {
        if let Err(e) = self.platform.init() {
            warn!("{} init failed: {e}", self.platform.name());
        }
        self.platform.signal_ready();
        info!("session started on {}", self.platform.name());
        self.resume()
    }

    /// Restore the saved game, falling back to a fresh one when there is no
    /// usable save. Returns true if the save was restored.
    pub fn resume(&mut self) -> bool {
        match self.store.load_state() {
            Ok(Some(state)) => match self.engine.set_state(&state) {
                Ok(()) => {
                    self.over_reported = false;
                    info!("resumed saved game with score {}", state.score);
                    return true;
                }
                Err(e) => warn!("discarding saved game: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("could not load saved game: {e}"),
        }
        self.new_game();
        false
    }

    pub fn new_game(&mut self) -> Option<Position> {
        let spawned = self.engine.reset();
        self.over_reported = false;
        self.persist();
        spawned
    }

    pub fn handle_move(&mut self, direction: Move) -> Turn {
        let result = self.engine.make_move(direction);
        if result.moved {
            self.update_best();
            self.persist();
        }

        // Obstacles can wall tiles in while empty cells remain, so "over"
        // means no direction changes the board, not `is_terminal`.
        let over = self.is_over();
        let outcome = if result.won {
            Outcome::Won
        } else if over {
            Outcome::GameOver
        } else {
            Outcome::Playing
        };
        if result.won || (over && !self.over_reported) {
            self.platform.submit_score(self.engine.score());
        }
        if over && !self.over_reported {
            info!("game over with score {}", self.engine.score());
            self.over_reported = true;
        }
        Turn { result, outcome }
    }

    /// True when no direction would change the board.
    pub fn is_over(&self) -> bool {
        self.engine.legal_moves().is_empty()
    }

    /// Obstacle-mode hook; persists the board when an obstacle was placed.
    pub fn inject_obstacle(&mut self) -> Option<Position> {
        let placed = self.engine.inject_obstacle();
        if placed.is_some() {
            self.persist();
        }
        placed
    }

    pub fn engine(&self) -> &GridEngine<R> {
        &self.engine
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn best_score(&self) -> u64 {
        self.best
    }

    fn update_best(&mut self) {
        let score = self.engine.score();
        if score <= self.best {
            return;
        }
        self.best = score;
        if let Err(e) = self.store.save_best_score(score) {
            warn!("could not save best score: {e}");
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save_state(&self.engine.state()) {
            warn!("could not save game: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::{GameState, OBSTACLE};
    use crate::platform::HeadlessPlatform;
    use crate::store::MemoryStore;

    fn session(store: MemoryStore) -> Session<HeadlessPlatform, MemoryStore> {
        sized_session(4, store)
    }

    fn sized_session(size: usize, store: MemoryStore) -> Session<HeadlessPlatform, MemoryStore> {
        let engine = GridEngine::with_seed(&EngineConfig::default().with_size(size), 11);
        Session::new(engine, HeadlessPlatform::default(), store)
    }

    fn saved(grid: Vec<Vec<i64>>, score: u64) -> MemoryStore {
        MemoryStore {
            state: Some(GameState { size: grid.len(), grid, score, won: false }),
            best: 50,
        }
    }

    #[test]
    fn start_without_save_begins_new_game() {
        let mut s = session(MemoryStore::default());
        assert!(!s.start());
        assert!(s.platform().ready);
        assert_eq!(s.store().state, Some(s.engine().state()));
    }

    #[test]
    fn start_restores_valid_save() {
        let grid = vec![vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        let mut s = session(saved(grid.clone(), 40));
        assert!(s.start());
        assert_eq!(s.engine().state().grid, grid);
        assert_eq!(s.engine().score(), 40);
        assert_eq!(s.best_score(), 50);
    }

    #[test]
    fn invalid_save_falls_back_to_reset() {
        let mut s = session(saved(vec![vec![2, 3], vec![0, 0]], 40));
        assert!(!s.resume());
        assert_eq!(s.engine().score(), 0);
        assert_eq!(s.engine().size(), 4);
    }

    #[test]
    fn moves_persist_and_raise_best() {
        let grid = vec![vec![32, 32, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        let mut s = session(saved(grid, 40));
        s.resume();
        let turn = s.handle_move(Move::Left);
        assert!(turn.result.moved);
        assert_eq!(turn.outcome, Outcome::Playing);
        assert_eq!(s.best_score(), 104);
        assert_eq!(s.store().best, 104);
        assert_eq!(s.store().state.as_ref().map(|st| st.score), Some(104));
        assert!(s.platform().submitted.is_empty());
    }

    #[test]
    fn win_submits_score() {
        let grid = vec![vec![1024, 1024, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        let mut s = session(saved(grid, 0));
        s.resume();
        let turn = s.handle_move(Move::Left);
        assert_eq!(turn.outcome, Outcome::Won);
        assert_eq!(s.platform().submitted, vec![2048]);
    }

    #[test]
    fn game_over_is_reported_once() {
        // Moving left frees (3, 3); whichever tile spawns there has no equal neighbour.
        let grid = vec![
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 8],
            vec![0, 8, 16, 32],
        ];
        let mut s = session(saved(grid, 0));
        s.resume();
        let turn = s.handle_move(Move::Left);
        assert!(turn.result.moved);
        assert_eq!(turn.result.spawned_at, Some(Position::new(3, 3)));
        assert_eq!(turn.outcome, Outcome::GameOver);
        assert_eq!(s.platform().submitted.len(), 1);

        let again = s.handle_move(Move::Right);
        assert!(!again.result.moved);
        assert_eq!(again.outcome, Outcome::GameOver);
        assert_eq!(s.platform().submitted.len(), 1);
    }

    #[test]
    fn obstacle_is_persisted() {
        let mut s = session(MemoryStore::default());
        s.start();
        let pos = s.inject_obstacle().unwrap();
        let stored = s.store().state.clone().unwrap();
        assert_eq!(stored.grid[pos.row][pos.col], OBSTACLE);
    }

    #[test]
    fn walled_in_board_is_game_over() {
        let mut s = sized_session(2, saved(vec![vec![2, OBSTACLE], vec![OBSTACLE, 0]], 8));
        assert!(s.resume());
        assert!(!s.engine().is_terminal());
        assert!(s.is_over());

        let turn = s.handle_move(Move::Left);
        assert!(!turn.result.moved);
        assert_eq!(turn.outcome, Outcome::GameOver);
        assert_eq!(s.platform().submitted, vec![8]);

        let again = s.handle_move(Move::Down);
        assert_eq!(again.outcome, Outcome::GameOver);
        assert_eq!(s.platform().submitted, vec![8]);

        s.new_game();
        assert!(!s.is_over());
    }
}
