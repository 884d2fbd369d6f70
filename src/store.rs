//! Save slots for a host session: the current game and the best score.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::GameState;

const STATE_FILE: &str = "state.json";
const BEST_FILE: &str = "best.json";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable storage consulted by [`Session`](crate::session::Session).
///
/// The store does not validate what it loads; callers hand the state to
/// `GridEngine::set_state` and treat a rejection as "no save".
pub trait SaveStore {
    fn load_state(&mut self) -> Result<Option<GameState>, StoreError>;
    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError>;
    fn best_score(&mut self) -> Result<u64, StoreError>;
    fn save_best_score(&mut self, score: u64) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct BestRecord {
    best: u64,
}

/// JSON files in one directory: `state.json` and `best.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir` for saves, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(JsonFileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_optional(&self, name: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.dir.join(name)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // Write-then-rename so a crash never leaves a truncated save behind.
    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, self.dir.join(name))?;
        Ok(())
    }
}

impl SaveStore for JsonFileStore {
    fn load_state(&mut self) -> Result<Option<GameState>, StoreError> {
        match self.read_optional(STATE_FILE)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError> {
        let json = serde_json::to_vec(state)?;
        self.write_atomic(STATE_FILE, &json)
    }

    fn best_score(&mut self) -> Result<u64, StoreError> {
        match self.read_optional(BEST_FILE)? {
            Some(text) => Ok(serde_json::from_str::<BestRecord>(&text)?.best),
            None => Ok(0),
        }
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StoreError> {
        let json = serde_json::to_vec(&BestRecord { best: score })?;
        self.write_atomic(BEST_FILE, &json)
    }
}

/// In-process store for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub state: Option<GameState>,
    pub best: u64,
}

impl SaveStore for MemoryStore {
    fn load_state(&mut self) -> Result<Option<GameState>, StoreError> {
        Ok(self.state.clone())
    }

    fn save_state(&mut self, state: &GameState) -> Result<(), StoreError> {
        self.state = Some(state.clone());
        Ok(())
    }

    fn best_score(&mut self) -> Result<u64, StoreError> {
        Ok(self.best)
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StoreError> {
        self.best = score;
        Ok(())
    }
}
