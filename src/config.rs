//! Game setup, loaded from JSON and/or the environment.
//!
//! ```json
//! { "player_names": ["Taro", "Jiro", "Saburo"], "seed": 42 }
//! ```
//!
//! Environment overrides: `COUP_CONFIG` (path to a JSON file), `COUP_PLAYERS`
//! (comma separated names) and `COUP_SEED`.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 7;
pub const STARTING_COINS: u8 = 2;

pub const CONFIG_PATH_VAR: &str = "COUP_CONFIG";
pub const PLAYERS_VAR: &str = "COUP_PLAYERS";
pub const SEED_VAR: &str = "COUP_SEED";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("a game needs 2 to 7 players, got {0}")]
    PlayerCount(usize),

    #[error("player {0} has an empty name")]
    EmptyName(usize),

    #[error("{name} must be between 0 and 1, got {value}")]
    Chance { name: &'static str, value: f64 },

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

/// How the random decision provider behaves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub block_chance: f64,
    pub challenge_chance: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            block_chance: 0.2,
            challenge_chance: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_names: Vec<String>,
    pub starting_coins: u8,
    pub seed: Option<u64>,
    pub bot: BotConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::with_players(3)
    }
}

impl GameConfig {
    pub fn with_players(num_players: usize) -> Self {
        Self {
            player_names: (1..=num_players).map(|n| format!("Player {n}")).collect(),
            starting_coins: STARTING_COINS,
            seed: None,
            bot: BotConfig::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the file named by `COUP_CONFIG`, then the single-value overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(None, |var| std::env::var(var).ok())
    }

    /// Like [`GameConfig::from_env`] with `path` in place of `COUP_CONFIG`. The
    /// `COUP_PLAYERS` and `COUP_SEED` overrides still apply on top of the file.
    pub fn from_file_and_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_vars(Some(path.as_ref()), |var| std::env::var(var).ok())
    }

    fn from_vars(path: Option<&Path>, var: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(|| var(CONFIG_PATH_VAR).map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::read(&path)?,
            None => Self::default(),
        };

        if let Some(players) = var(PLAYERS_VAR) {
            config.player_names = players
                .split(',')
                .map(|name| name.trim().to_string())
                .collect();
        }

        if let Some(seed) = var(SEED_VAR) {
            let parsed = seed.trim().parse().map_err(|_| ConfigError::Env {
                var: SEED_VAR,
                value: seed.clone(),
            })?;
            config.seed = Some(parsed);
        }

        config.validate()?;
        Ok(config)
    }

    // unvalidated, overrides may still fix it up
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let num_players = self.player_names.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(ConfigError::PlayerCount(num_players));
        }

        if let Some(idx) = self.player_names.iter().position(|name| name.trim().is_empty()) {
            return Err(ConfigError::EmptyName(idx));
        }

        for (name, value) in [("block_chance", self.bot.block_chance), ("challenge_chance", self.bot.challenge_chance)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Chance { name, value });
            }
        }

        Ok(())
    }
}
