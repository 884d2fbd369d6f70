use std::io::Read;
use std::path::Path;

use crate::engine::board::{MAX_SIZE, MAX_TILE, MIN_SIZE};
use crate::engine::Tile;

/// Engine tunables. Every field is optional in TOML and falls back to the classic game.
///
/// ```toml
/// size = 5
/// win_value = 4096
/// four_probability = 0.1
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EngineConfig {
    /// Board edge length.
    #[serde(default = "defaults::size")]
    pub size: usize,

    /// Tile value that wins the game.
    #[serde(default = "defaults::win_value")]
    pub win_value: Tile,

    /// Chance a spawned tile is a 4 rather than a 2.
    #[serde(default = "defaults::four_probability")]
    pub four_probability: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("board size {0} outside 2..=8")]
    Size(usize),
    #[error("win value {0} is not a power of two in 4..=2^61")]
    WinValue(Tile),
    #[error("four_probability {0} outside [0, 1]")]
    Probability(f64),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            size: defaults::size(),
            win_value: defaults::win_value(),
            four_probability: defaults::four_probability(),
        }
    }
}

impl EngineConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_win_value(mut self, win_value: Tile) -> Self {
        self.win_value = win_value;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) {
            return Err(ConfigError::Size(self.size));
        }
        if !(4..=MAX_TILE).contains(&self.win_value) || !(self.win_value as u64).is_power_of_two() {
            return Err(ConfigError::WinValue(self.win_value));
        }
        if !(0.0..=1.0).contains(&self.four_probability) {
            return Err(ConfigError::Probability(self.four_probability));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }
}

mod defaults {
    use crate::engine::Tile;

    pub fn size() -> usize {
        4
    }

    pub fn win_value() -> Tile {
        2048
    }

    pub fn four_probability() -> f64 {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_toml_is_classic_game() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = EngineConfig::from_toml_str("size = 5\nwin_value = 4096\n").unwrap();
        assert_eq!(cfg.size, 5);
        assert_eq!(cfg.win_value, 4096);
        assert_eq!(cfg.four_probability, 0.1);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(EngineConfig::from_toml_str("size = 1"), Err(ConfigError::Size(1))));
        assert!(matches!(EngineConfig::from_toml_str("size = 9"), Err(ConfigError::Size(9))));
        assert!(matches!(
            EngineConfig::from_toml_str("win_value = 1000"),
            Err(ConfigError::WinValue(1000))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("win_value = 4611686018427387904"),
            Err(ConfigError::WinValue(v)) if v == 1 << 62
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("four_probability = 1.5"),
            Err(ConfigError::Probability(_))
        ));
        assert!(matches!(EngineConfig::from_toml_str("size = \"big\""), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "size = 3").unwrap();
        let cfg = EngineConfig::from_toml(tmp.path()).unwrap();
        assert_eq!(cfg.size, 3);
    }
}
