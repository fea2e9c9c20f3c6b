//! Configuration file loading for engine matches.
//!
//! This module provides types and functions for loading engine and match
//! settings from TOML files.

use crate::options::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Requested engine was not found in the configuration.
    #[error("Engine not found: {0}")]
    EngineNotFound(String),
}

/// Construction-time settings for one protocol client.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Search depth passed to every `go`. Defaults to 10.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Per-move time budget in milliseconds. Defaults to 100.
    #[serde(default = "default_move_time")]
    pub move_time: u64,
    /// Leave pondering enabled. When false, `Ponder` is set to false on init.
    #[serde(default)]
    pub ponder: bool,
    /// Draw both contempt options from `rand_min..=rand_max` during init.
    #[serde(default)]
    pub randomize: bool,
    #[serde(default = "default_rand_min")]
    pub rand_min: i64,
    #[serde(default = "default_rand_max")]
    pub rand_max: i64,
    /// Prepended verbatim to `executable`, e.g. `"/usr/games/"`.
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Extra command-line arguments for the engine.
    #[serde(default)]
    pub args: Vec<String>,
    /// Option overrides, applied on top of the baseline set.
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

fn default_depth() -> u32 {
    10
}

fn default_move_time() -> u64 {
    100
}

fn default_rand_min() -> i64 {
    -10
}

fn default_rand_max() -> i64 {
    10
}

fn default_executable() -> String {
    "stockfish".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            move_time: default_move_time(),
            ponder: false,
            randomize: false,
            rand_min: default_rand_min(),
            rand_max: default_rand_max(),
            prefix: String::new(),
            executable: default_executable(),
            args: Vec::new(),
            options: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Full path of the engine binary: prefix followed by executable name.
    pub fn executable_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.prefix, self.executable))
    }
}

/// Main arena configuration structure.
///
/// Uses `arena.toml` in the current directory by default.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ArenaConfig {
    /// A match is declared drawn once more than this many moves were played.
    #[serde(default = "default_max_moves")]
    pub max_moves: usize,
    /// Upper bound on any single read from an engine.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Seed for first-mover choice and randomized contempt. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Map of engine names to their configurations.
    #[serde(default)]
    pub engines: HashMap<String, EngineConfig>,
}

fn default_max_moves() -> usize {
    crate::match_runner::MAX_MOVES
}

fn default_read_timeout_ms() -> u64 {
    300_000
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_moves: default_max_moves(),
            read_timeout_ms: default_read_timeout_ms(),
            seed: None,
            engines: HashMap::new(),
        }
    }
}

impl ArenaConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// If the file does not exist, returns a default empty configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Loads the configuration from an explicit path, falling back to
    /// defaults when the file is absent.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default configuration file path: `arena.toml` in the
    /// current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("arena.toml")
    }

    /// Retrieves an engine configuration by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EngineNotFound`] if no engine with the given name exists.
    pub fn get_engine(&self, name: &str) -> Result<&EngineConfig, ConfigError> {
        self.engines
            .get(name)
            .ok_or_else(|| ConfigError::EngineNotFound(name.to_string()))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
