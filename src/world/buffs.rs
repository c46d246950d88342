use serde::{Deserialize, Serialize};

use super::types::BuffId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuffFlag {
    /// Concealed from others; cancelled by most visible actions.
    Hidden,
    NoCombat,
    Poison,
    Blessed,
}

/// Catalog entry describing a buff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuffSpec {
    pub buff_id: BuffId,
    pub name: String,
    #[serde(default)]
    pub flags: Vec<BuffFlag>,
    /// Lifetime in rounds. 0 lasts until cancelled.
    #[serde(default)]
    pub duration_rounds: u32,
    #[serde(default)]
    pub start_message: Option<String>,
    #[serde(default)]
    pub end_message: Option<String>,
}

impl BuffSpec {
    pub fn new(buff_id: BuffId, name: &str, duration_rounds: u32) -> Self {
        Self {
            buff_id,
            name: name.to_string(),
            flags: Vec::new(),
            duration_rounds,
            start_message: None,
            end_message: None,
        }
    }

    pub fn with_flag(mut self, flag: BuffFlag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_messages(mut self, start: &str, end: &str) -> Self {
        self.start_message = Some(start.to_string());
        self.end_message = Some(end.to_string());
        self
    }
}

/// A buff currently affecting a character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveBuff {
    pub buff_id: BuffId,
    pub name: String,
    pub flags: Vec<BuffFlag>,
    /// `None` for buffs without a fixed duration.
    pub rounds_left: Option<u32>,
    #[serde(default)]
    pub end_message: Option<String>,
}

impl ActiveBuff {
    pub fn from_spec(spec: &BuffSpec) -> Self {
        Self {
            buff_id: spec.buff_id,
            name: spec.name.clone(),
            flags: spec.flags.clone(),
            rounds_left: (spec.duration_rounds > 0).then_some(spec.duration_rounds),
            end_message: spec.end_message.clone(),
        }
    }

    pub fn has_flag(&self, flag: BuffFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Count one round down. Returns true once the buff has run its course.
    pub fn elapse_round(&mut self) -> bool {
        match self.rounds_left.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            None => false,
        }
    }
}
