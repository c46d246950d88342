//! Closed set of runtime-settable configuration keys.
//!
//! Every field an operator may change while the world is running has exactly
//! one [`ConfigKey`]. Values arrive as text (from an admin channel) and are
//! parsed to the field's type here, so the rest of the crate only ever sees
//! typed, validated configuration.

use std::fmt;
use std::str::FromStr;

use super::{Config, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    TurnMilliseconds,
    RoundSeconds,
    RoundsPerAutoSave,
    LootGoblinRoundCount,
    LootGoblinMinimumItems,
    LootGoblinMinimumGold,
    LootGoblinRoomId,
    LootGoblinMobId,
    LogIntervalRoundCount,
    BannedNames,
    ShutdownDefaultSeconds,
}

impl ConfigKey {
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TurnMilliseconds,
            ConfigKey::RoundSeconds,
            ConfigKey::RoundsPerAutoSave,
            ConfigKey::LootGoblinRoundCount,
            ConfigKey::LootGoblinMinimumItems,
            ConfigKey::LootGoblinMinimumGold,
            ConfigKey::LootGoblinRoomId,
            ConfigKey::LootGoblinMobId,
            ConfigKey::LogIntervalRoundCount,
            ConfigKey::BannedNames,
            ConfigKey::ShutdownDefaultSeconds,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::TurnMilliseconds => "TurnMilliseconds",
            ConfigKey::RoundSeconds => "RoundSeconds",
            ConfigKey::RoundsPerAutoSave => "RoundsPerAutoSave",
            ConfigKey::LootGoblinRoundCount => "LootGoblinRoundCount",
            ConfigKey::LootGoblinMinimumItems => "LootGoblinMinimumItems",
            ConfigKey::LootGoblinMinimumGold => "LootGoblinMinimumGold",
            ConfigKey::LootGoblinRoomId => "LootGoblinRoomId",
            ConfigKey::LootGoblinMobId => "LootGoblinMobId",
            ConfigKey::LogIntervalRoundCount => "LogIntervalRoundCount",
            ConfigKey::BannedNames => "BannedNames",
            ConfigKey::ShutdownDefaultSeconds => "ShutdownDefaultSeconds",
        }
    }

    /// Apply a textual value to `config`. Does not validate cross-field rules;
    /// the caller re-validates the whole config afterwards.
    pub fn apply(&self, config: &mut Config, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::TurnMilliseconds => config.timing.turn_milliseconds = parse_int(*self, value)?,
            ConfigKey::RoundSeconds => config.timing.round_seconds = parse_int(*self, value)?,
            ConfigKey::RoundsPerAutoSave => {
                config.timing.rounds_per_autosave = parse_int(*self, value)?
            }
            ConfigKey::LootGoblinRoundCount => {
                config.world.loot_goblin_round_count = parse_int(*self, value)?
            }
            ConfigKey::LootGoblinMinimumItems => {
                config.world.loot_goblin_minimum_items = parse_int(*self, value)? as usize
            }
            ConfigKey::LootGoblinMinimumGold => {
                config.world.loot_goblin_minimum_gold = parse_int(*self, value)?
            }
            ConfigKey::LootGoblinRoomId => {
                config.world.loot_goblin_room_id = parse_int(*self, value)? as u32
            }
            ConfigKey::LootGoblinMobId => {
                config.world.loot_goblin_mob_id = parse_int(*self, value)? as u32
            }
            ConfigKey::LogIntervalRoundCount => {
                config.world.log_interval_round_count = parse_int(*self, value)?
            }
            // `a;b;c`
            ConfigKey::BannedNames => {
                config.world.banned_names = value
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            ConfigKey::ShutdownDefaultSeconds => {
                config.admin.shutdown_default_seconds = parse_int(*self, value)?
            }
        }
        Ok(())
    }

    /// Current value rendered as text.
    pub fn read(&self, config: &Config) -> String {
        match self {
            ConfigKey::TurnMilliseconds => config.timing.turn_milliseconds.to_string(),
            ConfigKey::RoundSeconds => config.timing.round_seconds.to_string(),
            ConfigKey::RoundsPerAutoSave => config.timing.rounds_per_autosave.to_string(),
            ConfigKey::LootGoblinRoundCount => config.world.loot_goblin_round_count.to_string(),
            ConfigKey::LootGoblinMinimumItems => config.world.loot_goblin_minimum_items.to_string(),
            ConfigKey::LootGoblinMinimumGold => config.world.loot_goblin_minimum_gold.to_string(),
            ConfigKey::LootGoblinRoomId => config.world.loot_goblin_room_id.to_string(),
            ConfigKey::LootGoblinMobId => config.world.loot_goblin_mob_id.to_string(),
            ConfigKey::LogIntervalRoundCount => config.world.log_interval_round_count.to_string(),
            ConfigKey::BannedNames => config.world.banned_names.join(";"),
            ConfigKey::ShutdownDefaultSeconds => config.admin.shutdown_default_seconds.to_string(),
        }
    }
}

fn parse_int(key: ConfigKey, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key: key.name(),
        value: value.to_string(),
        expected: "a non-negative integer",
    })
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("locked") {
            return Err(ConfigError::LockedKey("Locked".to_string()));
        }
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownKey(wanted.to_string()))
    }
}
