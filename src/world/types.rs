use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = u32;
pub type MobInstanceId = u32;
pub type MobTemplateId = u32;
pub type RoomId = u32;
pub type ItemId = u32;
pub type BuffId = u32;

/// Anything that can issue or receive a queued action.
///
/// Serialized as a short string (`system`, `user:3`, `mob:12`) so it can key
/// JSON maps in world snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Actor {
    /// Timers and world events.
    System,
    User(UserId),
    Mob(MobInstanceId),
}

impl Actor {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn mob_id(&self) -> Option<MobInstanceId> {
        match self {
            Actor::Mob(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    /// Address usable in command text: `@3` for users, `#12` for mobs.
    pub fn target_token(&self) -> String {
        match self {
            Actor::System => "system".to_string(),
            Actor::User(id) => format!("@{}", id),
            Actor::Mob(id) => format!("#{}", id),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::System => f.write_str("system"),
            Actor::User(id) => write!(f, "user:{}", id),
            Actor::Mob(id) => write!(f, "mob:{}", id),
        }
    }
}

impl FromStr for Actor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "system" {
            return Ok(Actor::System);
        }
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed actor '{}'", s))?;
        let id: u32 = id
            .parse()
            .map_err(|_| format!("malformed actor id in '{}'", s))?;
        match kind {
            "user" => Ok(Actor::User(id)),
            "mob" => Ok(Actor::Mob(id)),
            _ => Err(format!("unknown actor kind '{}'", kind)),
        }
    }
}

impl From<Actor> for String {
    fn from(actor: Actor) -> Self {
        actor.to_string()
    }
}

impl TryFrom<String> for Actor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn actors_key_json_maps() {
        let mut given: HashMap<Actor, u64> = HashMap::new();
        given.insert(Actor::User(3), 10);
        given.insert(Actor::Mob(7), 2);
        let json = serde_json::to_string(&given).unwrap();
        assert!(json.contains("\"user:3\""));
        let back: HashMap<Actor, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, given);
    }

    #[test]
    fn malformed_actor_strings_fail() {
        assert!("user".parse::<Actor>().is_err());
        assert!("npc:1".parse::<Actor>().is_err());
        assert!("user:x".parse::<Actor>().is_err());
        assert_eq!("system".parse::<Actor>().unwrap(), Actor::System);
    }

    #[test]
    fn target_tokens() {
        assert_eq!(Actor::User(4).target_token(), "@4");
        assert_eq!(Actor::Mob(9).target_token(), "#9");
    }
}
