//! # Configuration Management Module
//!
//! This module owns every tunable of the simulation core: the timing settings
//! the round scheduler is driven by, world-event thresholds, storage paths and
//! logging. Values are loaded from TOML, validated at a single boundary and
//! then shared read-mostly through [`SharedConfig`].
//!
//! ## Configuration Structure
//!
//! - [`TimingConfig`] - turn duration, round length, autosave cadence
//! - [`WorldConfig`] - loot goblin thresholds, round logging, banned names
//! - [`StorageConfig`] - where autosave snapshots are written
//! - [`LoggingConfig`] - log level and optional log files
//! - [`AdminConfig`] - operator defaults (shutdown countdown)
//!
//! ## Configuration File Format
//!
//! ```toml
//! locked = ["TurnMilliseconds"]
//!
//! [timing]
//! turn_milliseconds = 100
//! round_seconds = 4
//! rounds_per_autosave = 900
//!
//! [world]
//! loot_goblin_round_count = 10
//! banned_names = ["*admin*", "gm*"]
//! ```
//!
//! ## Validation
//!
//! Timing values below their minimums are rejected (a fatal error at startup,
//! a rejected reload at runtime). World thresholds below their minimums are
//! clamped back to defaults. Derived tick constants ([`TimeBase`]) are
//! recomputed on every successful validation and never touched otherwise.

pub mod keys;
pub mod names;
pub mod timebase;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

pub use keys::ConfigKey;
pub use timebase::TimeBase;

use timebase::{
    DEFAULT_ROUNDS_PER_AUTOSAVE, DEFAULT_ROUND_SECONDS, DEFAULT_TURN_MILLISECONDS,
    MIN_ROUND_SECONDS, MIN_TURN_MILLISECONDS,
};

/// Errors raised while loading, validating or mutating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{key} must be at least {min} (got {value})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
    },

    #[error("no such config key: {0}")]
    UnknownKey(String),

    #[error("config key is locked: {0}")]
    LockedKey(String),

    #[error("{key} expects {expected}, got '{value}'")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("configuration has no backing file")]
    NoBackingFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Length of one turn (ms). Must be >= 10.
    #[serde(default = "default_turn_milliseconds")]
    pub turn_milliseconds: u64,
    /// Length of one round (s). Must be >= 1.
    #[serde(default = "default_round_seconds")]
    pub round_seconds: u64,
    #[serde(default = "default_rounds_per_autosave")]
    pub rounds_per_autosave: u64,
}

fn default_turn_milliseconds() -> u64 {
    DEFAULT_TURN_MILLISECONDS
}

fn default_round_seconds() -> u64 {
    DEFAULT_ROUND_SECONDS
}

fn default_rounds_per_autosave() -> u64 {
    DEFAULT_ROUNDS_PER_AUTOSAVE
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            turn_milliseconds: DEFAULT_TURN_MILLISECONDS,
            round_seconds: DEFAULT_ROUND_SECONDS,
            rounds_per_autosave: DEFAULT_ROUNDS_PER_AUTOSAVE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// How often (in rounds) to evaluate loot goblin eligibility. Minimum 10.
    #[serde(default = "default_loot_goblin_round_count")]
    pub loot_goblin_round_count: u64,
    /// Items lying in a room that attract the goblin.
    #[serde(default = "default_loot_goblin_minimum_items")]
    pub loot_goblin_minimum_items: usize,
    /// Gold lying in a room that attracts the goblin.
    #[serde(default = "default_loot_goblin_minimum_gold")]
    pub loot_goblin_minimum_gold: u64,
    #[serde(default = "default_loot_goblin_room_id")]
    pub loot_goblin_room_id: u32,
    #[serde(default = "default_loot_goblin_mob_id")]
    pub loot_goblin_mob_id: u32,
    /// Log the round number every N rounds (0 disables).
    #[serde(default)]
    pub log_interval_round_count: u64,
    /// Wildcard patterns, see [`names`].
    #[serde(default)]
    pub banned_names: Vec<String>,
}

fn default_loot_goblin_round_count() -> u64 {
    10
}

fn default_loot_goblin_minimum_items() -> usize {
    2
}

fn default_loot_goblin_minimum_gold() -> u64 {
    100
}

fn default_loot_goblin_room_id() -> u32 {
    139
}

fn default_loot_goblin_mob_id() -> u32 {
    52
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            loot_goblin_round_count: default_loot_goblin_round_count(),
            loot_goblin_minimum_items: default_loot_goblin_minimum_items(),
            loot_goblin_minimum_gold: default_loot_goblin_minimum_gold(),
            loot_goblin_room_id: default_loot_goblin_room_id(),
            loot_goblin_mob_id: default_loot_goblin_mob_id(),
            log_interval_round_count: 0,
            banned_names: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    #[serde(default = "default_autosave_file")]
    pub autosave_file: String,
}

fn default_autosave_file() -> String {
    "world.json".to_string()
}

impl StorageConfig {
    pub fn autosave_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.autosave_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            autosave_file: default_autosave_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default)]
    pub security_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("mudcore.log".to_string()),
            security_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_shutdown_seconds")]
    pub shutdown_default_seconds: u64,
}

fn default_shutdown_seconds() -> u64 {
    15
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            shutdown_default_seconds: default_shutdown_seconds(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Keys that cannot be changed at runtime without forcing.
    #[serde(default)]
    pub locked: Vec<String>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(skip)]
    timebase: TimeBase,
}

impl Config {
    /// Load and validate configuration from a file
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<(), ConfigError> {
        Config::default().save(path).await
    }

    pub async fn save(&self, path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })
    }

    /// Check ranges, clamp soft limits and recompute the derived [`TimeBase`].
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.timing.turn_milliseconds < MIN_TURN_MILLISECONDS {
            return Err(ConfigError::OutOfRange {
                key: "turn_milliseconds",
                value: self.timing.turn_milliseconds,
                min: MIN_TURN_MILLISECONDS,
            });
        }
        if self.timing.round_seconds < MIN_ROUND_SECONDS {
            return Err(ConfigError::OutOfRange {
                key: "round_seconds",
                value: self.timing.round_seconds,
                min: MIN_ROUND_SECONDS,
            });
        }
        if self.timing.rounds_per_autosave < 1 {
            return Err(ConfigError::OutOfRange {
                key: "rounds_per_autosave",
                value: self.timing.rounds_per_autosave,
                min: 1,
            });
        }

        if self.world.loot_goblin_round_count < 10 {
            self.world.loot_goblin_round_count = 10;
        }
        if self.world.loot_goblin_minimum_items < 1 {
            self.world.loot_goblin_minimum_items = default_loot_goblin_minimum_items();
        }
        if self.world.loot_goblin_minimum_gold < 1 {
            self.world.loot_goblin_minimum_gold = default_loot_goblin_minimum_gold();
        }

        for name in &self.locked {
            if name.parse::<ConfigKey>().is_err() {
                warn!("locked list names unknown config key '{}'", name);
            }
        }

        self.timebase = TimeBase::new(
            self.timing.turn_milliseconds,
            self.timing.round_seconds,
            self.timing.rounds_per_autosave,
        );
        Ok(())
    }

    pub fn timebase(&self) -> TimeBase {
        self.timebase
    }

    pub fn locked_keys(&self) -> BTreeSet<ConfigKey> {
        self.locked
            .iter()
            .filter_map(|name| name.parse::<ConfigKey>().ok())
            .collect()
    }

    pub fn is_banned_name(&self, name: &str) -> bool {
        names::is_banned_name(&self.world.banned_names, name)
    }
}

/// Read-mostly configuration shared between the scheduler, producers and the
/// admin channel. Readers never block each other; writers validate a copy and
/// swap it in whole, so derived constants change atomically.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
    path: Option<PathBuf>,
    /// Bumped on every accepted change.
    version: Arc<AtomicU64>,
}

impl SharedConfig {
    /// Wrap an already validated config with no backing file.
    pub fn new(mut config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
            path: None,
            version: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Load from `path`. Failures here are meant to be fatal to the caller.
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::load(path).await?;
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
            path: Some(PathBuf::from(path)),
            version: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn snapshot(&self) -> Config {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn timebase(&self) -> TimeBase {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .timebase()
    }

    /// Changes when `set`, `replace` or `reload` swap in a new config.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_locked(&self, key: ConfigKey) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .locked_keys()
            .contains(&key)
    }

    /// Change one setting. Locked keys are refused unless `force` is set.
    /// The previous configuration stays in effect if the new value fails
    /// validation.
    pub fn set(&self, key: &str, value: &str, force: bool) -> Result<Config, ConfigError> {
        let key: ConfigKey = key.parse()?;
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !force && guard.locked_keys().contains(&key) {
            return Err(ConfigError::LockedKey(key.name().to_string()));
        }
        let mut candidate = guard.clone();
        key.apply(&mut candidate, value)?;
        candidate.validate()?;
        *guard = candidate.clone();
        self.version.fetch_add(1, Ordering::AcqRel);
        info!("config {} set to {}", key, key.read(&candidate));
        Ok(candidate)
    }

    /// Replace the whole configuration with a validated one.
    pub fn replace(&self, mut config: Config) -> Result<TimeBase, ConfigError> {
        config.validate()?;
        let timebase = config.timebase();
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(timebase)
    }

    /// Re-read the backing file. On failure the running config is kept.
    pub async fn reload(&self) -> Result<TimeBase, ConfigError> {
        let path = self.path.as_ref().ok_or(ConfigError::NoBackingFile)?;
        let path = path.to_string_lossy().to_string();
        match Config::load(&path).await {
            Ok(config) => {
                let timebase = self.replace(config)?;
                info!(
                    "config reloaded from {}: {}ms turns, {} turns/round",
                    path,
                    timebase.turn_milliseconds,
                    timebase.turns_per_round()
                );
                Ok(timebase)
            }
            Err(e) => {
                warn!("config reload rejected, keeping previous settings: {}", e);
                Err(e)
            }
        }
    }

    /// Persist the current configuration to its backing file.
    pub async fn save(&self) -> Result<(), ConfigError> {
        let path = self.path.as_ref().ok_or(ConfigError::NoBackingFile)?;
        let snapshot = self.snapshot();
        snapshot.save(&path.to_string_lossy()).await
    }

    /// Every runtime key with its current value, marking locked ones.
    pub fn describe(&self) -> Vec<(String, String)> {
        let config = self.snapshot();
        let locked = config.locked_keys();
        ConfigKey::all()
            .iter()
            .map(|key| {
                let label = if locked.contains(key) {
                    format!("{} (locked)", key)
                } else {
                    key.to_string()
                };
                (label, key.read(&config))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.timing.turn_milliseconds, 100);
        assert_eq!(cfg.timing.round_seconds, 4);
        assert_eq!(cfg.timing.rounds_per_autosave, 900);
        assert_eq!(cfg.timebase().turns_per_round(), 40);
        assert_eq!(cfg.admin.shutdown_default_seconds, 15);
    }

    #[test]
    fn timing_below_minimum_is_rejected() {
        let err = Config::from_toml_str("[timing]\nturn_milliseconds = 5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                key: "turn_milliseconds",
                ..
            }
        ));
        let err = Config::from_toml_str("[timing]\nround_seconds = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { key: "round_seconds", .. }));
    }

    #[test]
    fn world_thresholds_clamp() {
        let cfg = Config::from_toml_str(
            "[world]\nloot_goblin_round_count = 3\nloot_goblin_minimum_items = 0\nloot_goblin_minimum_gold = 0\n",
        )
        .unwrap();
        assert_eq!(cfg.world.loot_goblin_round_count, 10);
        assert_eq!(cfg.world.loot_goblin_minimum_items, 2);
        assert_eq!(cfg.world.loot_goblin_minimum_gold, 100);
    }

    #[test]
    fn set_recomputes_derived_values() {
        let shared = SharedConfig::new(Config::default()).unwrap();
        shared.set("roundseconds", "2", false).unwrap();
        assert_eq!(shared.timebase().turns_per_round(), 20);
    }

    #[test]
    fn invalid_set_keeps_previous_config() {
        let shared = SharedConfig::new(Config::default()).unwrap();
        assert!(shared.set("TurnMilliseconds", "3", false).is_err());
        assert_eq!(shared.timebase().turn_milliseconds, 100);
    }

    #[test]
    fn locked_keys_need_force() {
        let mut cfg = Config::default();
        cfg.locked = vec!["turnmilliseconds".to_string()];
        let shared = SharedConfig::new(cfg).unwrap();
        assert!(matches!(
            shared.set("TurnMilliseconds", "50", false),
            Err(ConfigError::LockedKey(_))
        ));
        shared.set("TurnMilliseconds", "50", true).unwrap();
        assert_eq!(shared.timebase().turns_per_round(), 80);
        assert!(matches!(
            shared.set("Locked", "", true),
            Err(ConfigError::LockedKey(_))
        ));
    }

    #[test]
    fn describe_marks_locked_entries() {
        let mut cfg = Config::default();
        cfg.locked = vec!["RoundSeconds".to_string()];
        let shared = SharedConfig::new(cfg).unwrap();
        let described = shared.describe();
        assert!(described
            .iter()
            .any(|(k, v)| k == "RoundSeconds (locked)" && v == "4"));
        assert!(described.iter().any(|(k, _)| k == "TurnMilliseconds"));
    }

    #[test]
    fn version_moves_only_on_accepted_changes() {
        let shared = SharedConfig::new(Config::default()).unwrap();
        let start = shared.version();
        assert!(shared.set("RoundSeconds", "0", false).is_err());
        assert!(shared.set("RoundSeconds", "soon", false).is_err());
        assert_eq!(shared.version(), start);
        shared.set("RoundSeconds", "2", false).unwrap();
        assert_eq!(shared.version(), start + 1);
        shared.replace(Config::default()).unwrap();
        assert_eq!(shared.clone().version(), start + 2);
    }
}
