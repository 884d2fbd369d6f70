//! Property tests for the move/merge/spawn kernel.
//!
//! Invariants covered:
//! - every cell stays empty, an obstacle, or a power of two >= 2
//! - score never decreases and equals the sum of per-move gains
//! - a move that reports `moved == false` leaves the state bit-for-bit identical
//! - merge count equals the number of distinct merge destinations
//! - `set_state(state())` succeeds and changes nothing
//! - once won, the flag stays set
//! - without obstacles, `is_terminal` agrees with "no direction changes the board"
use std::collections::HashSet;

use grid_2048::config::EngineConfig;
use grid_2048::engine::{GameState, GridEngine, Move, OBSTACLE};
use proptest::prelude::*;

fn assert_cells_legal(state: &GameState) {
    assert_eq!(state.grid.len(), state.size);
    for row in &state.grid {
        assert_eq!(row.len(), state.size);
        for &v in row {
            assert!(
                v == 0 || v == OBSTACLE || (v >= 2 && (v as u64).is_power_of_two()),
                "illegal cell {v}"
            );
        }
    }
}

fn move_strategy() -> impl Strategy<Value = Move> {
    (0u8..4).prop_map(|c| Move::try_from(c).unwrap())
}

proptest! {
    #[test]
    fn rollout_respects_core_invariants(
        seed in any::<u64>(),
        size in 2usize..=6,
        moves in prop::collection::vec(move_strategy(), 1..200),
        obstacle_every in prop::option::of(5usize..30),
    ) {
        let config = EngineConfig::default().with_size(size);
        let mut engine = GridEngine::with_seed(&config, seed);
        let mut gained = 0u64;
        let mut was_won = false;

        for (i, m) in moves.into_iter().enumerate() {
            if obstacle_every.is_some_and(|k| i % k == k - 1) {
                let before = engine.board().count_empty();
                match engine.inject_obstacle() {
                    Some(pos) => {
                        prop_assert_eq!(engine.board().get(pos), OBSTACLE);
                        prop_assert_eq!(engine.board().count_empty(), before - 1);
                    }
                    None => {
                        prop_assert_eq!(before, 0);
                    }
                }
            }

            let before = engine.state();
            let res = engine.make_move(m);
            let after = engine.state();

            assert_cells_legal(&after);
            prop_assert!(after.score >= before.score);
            prop_assert_eq!(after.size, size);

            if res.moved {
                prop_assert_eq!(after.score - before.score, res.score_gained);
            } else {
                prop_assert_eq!(&after, &before);
                prop_assert_eq!(res.merges, 0);
                prop_assert!(res.spawned_at.is_none());
            }

            let distinct: HashSet<_> = res.merged_positions.iter().copied().collect();
            prop_assert_eq!(distinct.len(), res.merges);
            prop_assert_eq!(res.merged_positions.len(), res.merges);

            if let Some(pos) = res.spawned_at {
                prop_assert!(matches!(after.grid[pos.row][pos.col], 2 | 4));
            }

            gained += res.score_gained;
            was_won |= res.won;
            prop_assert_eq!(engine.won(), was_won);

            let snapshot = engine.state();
            prop_assert!(engine.set_state(&snapshot).is_ok());
            prop_assert_eq!(engine.state(), snapshot);
        }
        prop_assert_eq!(engine.score(), gained);
    }

    #[test]
    fn terminal_iff_no_legal_move_without_obstacles(
        seed in any::<u64>(),
        size in 2usize..=4,
        moves in prop::collection::vec(move_strategy(), 0..300),
    ) {
        let config = EngineConfig::default().with_size(size);
        let mut engine = GridEngine::with_seed(&config, seed);
        for m in moves {
            prop_assert_eq!(engine.is_terminal(), engine.legal_moves().is_empty());
            engine.make_move(m);
        }
        prop_assert_eq!(engine.is_terminal(), engine.legal_moves().is_empty());
    }

    #[test]
    fn same_seed_same_rollout(
        seed in any::<u64>(),
        moves in prop::collection::vec(move_strategy(), 0..60),
    ) {
        let config = EngineConfig::default();
        let mut a = GridEngine::with_seed(&config, seed);
        let mut b = GridEngine::with_seed(&config, seed);
        for m in moves {
            prop_assert_eq!(a.make_move(m), b.make_move(m));
        }
        prop_assert_eq!(a.state(), b.state());
    }
}
