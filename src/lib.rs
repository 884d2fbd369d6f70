//! grid-2048: a deterministic 2048 grid engine and the host glue around it
//!
//! This crate provides:
//! - A `GridEngine` state machine (`engine` module): moves, merges, spawns,
//!   terminal detection, state export/restore and obstacle injection
//! - An `EngineConfig` loaded from TOML (`config` module)
//! - A host `Session` that wires an engine to a save store and platform hooks
//!   (`session`, `store`, `platform` modules)
//! - A binary trace format for seeded runs, with replay (`trace` module)
//!
//! Quick start:
//! ```
//! use grid_2048::config::EngineConfig;
//! use grid_2048::engine::{GridEngine, Move};
//!
//! // Deterministic game with a seeded RNG
//! let mut engine = GridEngine::with_seed(&EngineConfig::default(), 42);
//! let result = engine.make_move(Move::Left);
//! if result.moved {
//!     assert!(result.spawned_at.is_some());
//! }
//! assert_eq!(engine.state().size, 4);
//! ```
//!
//! Host loop with persistence:
//! ```
//! use grid_2048::config::EngineConfig;
//! use grid_2048::engine::{GridEngine, Move};
//! use grid_2048::platform::HeadlessPlatform;
//! use grid_2048::session::{Outcome, Session};
//! use grid_2048::store::MemoryStore;
//!
//! let engine = GridEngine::with_seed(&EngineConfig::default(), 7);
//! let mut session = Session::new(engine, HeadlessPlatform::default(), MemoryStore::default());
//! session.start();
//! let mut turns = 0;
//! while turns < 8 {
//!     let turn = session.handle_move(Move::ALL[turns % 4]);
//!     if turn.outcome == Outcome::GameOver {
//!         break;
//!     }
//!     turns += 1;
//! }
//! assert_eq!(session.store().state, Some(session.engine().state()));
//! ```
//!
pub mod config;
pub mod engine;
pub mod platform;
pub mod session;
pub mod store;
pub mod trace;
