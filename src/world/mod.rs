//! In-memory world state the simulation mutates.
//!
//! The world is owned by the scheduler and touched only from inside command
//! handlers, one at a time. Nothing here locks. Lookups return [`SimError`]
//! on misses so handlers can use `?` and let the scheduler log and drop the
//! command.

pub mod buffs;
pub mod characters;
pub mod items;
pub mod rooms;
pub mod saver;
pub mod seed;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sim::errors::SimError;
use buffs::{ActiveBuff, BuffSpec};
use characters::{Character, Mob, MobTemplate, User};
use items::ItemCatalog;
use rooms::Room;
use types::{Actor, BuffId, MobInstanceId, MobTemplateId, RoomId, UserId};

pub type QuestId = u32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestSpec {
    pub quest_id: QuestId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl QuestSpec {
    pub fn new(quest_id: QuestId, name: &str) -> Self {
        Self {
            quest_id,
            name: name.to_string(),
            description: String::new(),
        }
    }
}

/// Quest id encoded in a progress token such as `4-start`.
pub fn quest_id_of(token: &str) -> Option<QuestId> {
    token.split('-').next()?.parse().ok()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub rooms: BTreeMap<RoomId, Room>,
    pub users: BTreeMap<UserId, User>,
    pub mobs: BTreeMap<MobInstanceId, Mob>,
    pub items: ItemCatalog,
    pub mob_templates: BTreeMap<MobTemplateId, MobTemplate>,
    pub buffs: BTreeMap<BuffId, BuffSpec>,
    pub quests: BTreeMap<QuestId, QuestSpec>,
    #[serde(default)]
    pub next_mob_instance: MobInstanceId,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.insert(room.room_id, room);
    }

    /// Register a user and place them in their character's room.
    pub fn add_user(&mut self, user: User) -> Result<(), SimError> {
        let room_id = user.character.room_id;
        self.room_mut(room_id)?.users.insert(user.user_id);
        self.users.insert(user.user_id, user);
        Ok(())
    }

    pub fn user(&self, user_id: UserId) -> Result<&User, SimError> {
        self.users.get(&user_id).ok_or(SimError::UserNotFound(user_id))
    }

    pub fn user_mut(&mut self, user_id: UserId) -> Result<&mut User, SimError> {
        self.users
            .get_mut(&user_id)
            .ok_or(SimError::UserNotFound(user_id))
    }

    pub fn mob(&self, instance_id: MobInstanceId) -> Result<&Mob, SimError> {
        self.mobs
            .get(&instance_id)
            .ok_or(SimError::MobNotFound(instance_id))
    }

    pub fn mob_mut(&mut self, instance_id: MobInstanceId) -> Result<&mut Mob, SimError> {
        self.mobs
            .get_mut(&instance_id)
            .ok_or(SimError::MobNotFound(instance_id))
    }

    pub fn room(&self, room_id: RoomId) -> Result<&Room, SimError> {
        self.rooms.get(&room_id).ok_or(SimError::RoomNotFound(room_id))
    }

    pub fn room_mut(&mut self, room_id: RoomId) -> Result<&mut Room, SimError> {
        self.rooms
            .get_mut(&room_id)
            .ok_or(SimError::RoomNotFound(room_id))
    }

    pub fn character(&self, actor: Actor) -> Result<&Character, SimError> {
        match actor {
            Actor::User(id) => Ok(&self.user(id)?.character),
            Actor::Mob(id) => Ok(&self.mob(id)?.character),
            Actor::System => Err(SimError::ActorNotFound(actor)),
        }
    }

    pub fn character_mut(&mut self, actor: Actor) -> Result<&mut Character, SimError> {
        match actor {
            Actor::User(id) => Ok(&mut self.user_mut(id)?.character),
            Actor::Mob(id) => Ok(&mut self.mob_mut(id)?.character),
            Actor::System => Err(SimError::ActorNotFound(actor)),
        }
    }

    /// Display name, or a placeholder for actors that no longer exist.
    pub fn actor_name(&self, actor: Actor) -> String {
        match actor {
            Actor::System => "The world".to_string(),
            _ => self
                .character(actor)
                .map(|c| c.name.clone())
                .unwrap_or_else(|_| "someone".to_string()),
        }
    }

    pub fn buff_spec(&self, buff_id: BuffId) -> Result<&BuffSpec, SimError> {
        self.buffs.get(&buff_id).ok_or(SimError::BuffNotFound(buff_id))
    }

    /// Create a mob instance from a template. Trade offers are copied so each
    /// instance tracks its own negotiation progress.
    pub fn spawn_mob(
        &mut self,
        template_id: MobTemplateId,
        room_id: RoomId,
    ) -> Result<MobInstanceId, SimError> {
        let template = self
            .mob_templates
            .get(&template_id)
            .ok_or_else(|| SimError::Internal(format!("unknown mob template {}", template_id)))?;
        if !self.rooms.contains_key(&room_id) {
            return Err(SimError::RoomNotFound(room_id));
        }

        let mut character = Character::new(&template.name, room_id);
        character.gold = template.gold;
        character.backpack = template
            .items
            .iter()
            .filter_map(|id| self.items.new_item(*id))
            .collect();
        let trades = template.trades.clone();

        self.next_mob_instance += 1;
        let instance_id = self.next_mob_instance;
        self.mobs.insert(
            instance_id,
            Mob {
                instance_id,
                template_id,
                character,
                trades,
            },
        );
        self.room_mut(room_id)?.mobs.insert(instance_id);
        Ok(instance_id)
    }

    /// Move an actor between rooms, returning the room they left.
    pub fn move_actor(&mut self, actor: Actor, to: RoomId) -> Result<RoomId, SimError> {
        if !self.rooms.contains_key(&to) {
            return Err(SimError::RoomNotFound(to));
        }
        let from = self.character(actor)?.room_id;
        if let Some(room) = self.rooms.get_mut(&from) {
            match actor {
                Actor::User(id) => {
                    room.users.remove(&id);
                }
                Actor::Mob(id) => {
                    room.mobs.remove(&id);
                }
                Actor::System => {}
            }
        }
        let room = self.room_mut(to)?;
        match actor {
            Actor::User(id) => {
                room.users.insert(id);
            }
            Actor::Mob(id) => {
                room.mobs.insert(id);
            }
            Actor::System => {}
        }
        self.character_mut(actor)?.room_id = to;
        Ok(from)
    }

    /// Resolve `@<id>` (user) or `#<id>` (mob) anywhere in the world.
    pub fn find_anywhere(&self, name: &str) -> Option<Actor> {
        let name = name.trim();
        if let Some(id) = name.strip_prefix('@') {
            let id: UserId = id.parse().ok()?;
            return self.users.contains_key(&id).then_some(Actor::User(id));
        }
        if let Some(id) = name.strip_prefix('#') {
            let id: MobInstanceId = id.parse().ok()?;
            return self.mobs.contains_key(&id).then_some(Actor::Mob(id));
        }
        None
    }

    /// Resolve a target name as seen from `room_id`.
    ///
    /// `@<id>` and `#<id>` only match actors present in the room. Plain names
    /// match users first, then mobs, by case-insensitive prefix. Offline users
    /// never match.
    pub fn find_in_room(&self, room_id: RoomId, name: &str) -> Option<Actor> {
        let room = self.rooms.get(&room_id)?;
        if let Some(actor) = self.find_anywhere(name) {
            let present = match actor {
                Actor::User(id) => {
                    room.users.contains(&id) && self.users.get(&id).is_some_and(|u| u.online)
                }
                Actor::Mob(id) => room.mobs.contains(&id),
                Actor::System => false,
            };
            return present.then_some(actor);
        }

        let needle = name.trim().to_lowercase();
        if needle.is_empty() || needle.starts_with('@') || needle.starts_with('#') {
            return None;
        }
        let user = room.users.iter().find(|id| {
            self.users.get(id).is_some_and(|u| {
                u.online
                    && (u.character.name.to_lowercase().starts_with(&needle)
                        || u.username.to_lowercase() == needle)
            })
        });
        if let Some(id) = user {
            return Some(Actor::User(*id));
        }
        room.mobs
            .iter()
            .find(|id| {
                self.mobs.get(id).is_some_and(|m| {
                    let mob_name = m.character.name.to_lowercase();
                    mob_name.starts_with(&needle)
                        || mob_name.split_whitespace().any(|w| w.starts_with(&needle))
                })
            })
            .map(|id| Actor::Mob(*id))
    }

    pub fn online_users(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| u.online)
    }

    pub fn users_in_room(&self, room_id: RoomId) -> Vec<UserId> {
        self.rooms
            .get(&room_id)
            .map(|room| {
                room.users
                    .iter()
                    .copied()
                    .filter(|id| self.users.get(id).is_some_and(|u| u.online))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn mobs_with_template(&self, template_id: MobTemplateId) -> Vec<MobInstanceId> {
        self.mobs
            .values()
            .filter(|m| m.template_id == template_id)
            .map(|m| m.instance_id)
            .collect()
    }

    /// Count every timed buff down by one round and drop the ones that ran out.
    pub fn expire_buffs(&mut self) -> Vec<(Actor, ActiveBuff)> {
        let mut expired = Vec::new();
        let users = self
            .users
            .values_mut()
            .map(|u| (Actor::User(u.user_id), &mut u.character));
        let mobs = self
            .mobs
            .values_mut()
            .map(|m| (Actor::Mob(m.instance_id), &mut m.character));
        for (actor, character) in users.chain(mobs) {
            let mut kept = Vec::with_capacity(character.buffs.len());
            for mut buff in character.buffs.drain(..) {
                if buff.elapse_round() {
                    expired.push((actor, buff));
                } else {
                    kept.push(buff);
                }
            }
            character.buffs = kept;
        }
        expired
    }
}
