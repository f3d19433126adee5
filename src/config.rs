//! Configuration for make-voteable

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::VoteError;

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("make-voteable")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file holding votings and vote counters
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Milliseconds SQLite waits on a locked database before reporting busy
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// How many times a conflicting transition is re-run before giving up
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Type tags eligible to be voted on
    #[serde(default)]
    pub voteable_types: Vec<String>,

    /// Voter type tags that carry their own up/down counters
    #[serde(default)]
    pub counted_voter_types: Vec<String>,
}

fn default_database_path() -> PathBuf {
    default_data_dir().join("votes.db")
}

fn default_pool_size() -> u32 {
    8
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_busy_timeout() -> u64 {
    5_000
}

fn default_max_conflict_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: default_pool_size(),
            connection_timeout_secs: default_connection_timeout(),
            busy_timeout_ms: default_busy_timeout(),
            max_conflict_retries: default_max_conflict_retries(),
            voteable_types: Vec::new(),
            counted_voter_types: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VoteError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| VoteError::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VoteError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VoteError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config file location
    pub fn default_config_path() -> PathBuf {
        default_data_dir().join("config.toml")
    }
}
