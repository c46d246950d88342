use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::items::Item;
use super::types::{MobInstanceId, RoomId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub room_id: RoomId,
    pub title: String,
    #[serde(default)]
    pub zone: String,
    /// Items lying on the floor.
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub users: BTreeSet<UserId>,
    #[serde(default)]
    pub mobs: BTreeSet<MobInstanceId>,
}

impl Room {
    pub fn new(room_id: RoomId, title: &str, zone: &str) -> Self {
        Self {
            room_id,
            title: title.to_string(),
            zone: zone.to_string(),
            items: Vec::new(),
            gold: 0,
            users: BTreeSet::new(),
            mobs: BTreeSet::new(),
        }
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, item: &Item) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether the floor holds enough loot to interest a loot goblin.
    pub fn attracts_loot_goblin(&self, minimum_items: usize, minimum_gold: u64) -> bool {
        self.items.len() >= minimum_items || self.gold >= minimum_gold
    }
}
