use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::buffs::{ActiveBuff, BuffFlag};
use super::items::{find_match, EquipSlot, Item, ItemCatalog};
use super::types::{ItemId, MobInstanceId, MobTemplateId, RoomId, UserId};
use crate::roles::LEVEL_USER;
use crate::sim::trade::TradeOffer;

/// State shared by players and NPCs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub name: String,
    pub room_id: RoomId,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub backpack: Vec<Item>,
    #[serde(default)]
    pub equipment: BTreeMap<EquipSlot, Item>,
    #[serde(default)]
    pub buffs: Vec<ActiveBuff>,
    /// Quest progress tokens, e.g. `4-start`.
    #[serde(default)]
    pub quest_tokens: BTreeSet<String>,
}

impl Character {
    pub fn new(name: &str, room_id: RoomId) -> Self {
        Self {
            name: name.to_string(),
            room_id,
            gold: 0,
            backpack: Vec::new(),
            equipment: BTreeMap::new(),
            buffs: Vec::new(),
            quest_tokens: BTreeSet::new(),
        }
    }

    pub fn store_item(&mut self, item: Item) {
        self.backpack.push(item);
    }

    /// Remove the first backpack item equal to `item`.
    pub fn remove_item(&mut self, item: &Item) -> bool {
        match self.backpack.iter().position(|i| i == item) {
            Some(pos) => {
                self.backpack.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn find_in_backpack(&self, catalog: &ItemCatalog, name: &str) -> Option<Item> {
        find_match(catalog, name, &self.backpack).map(|idx| self.backpack[idx].clone())
    }

    pub fn has_item_id(&self, item_id: ItemId) -> bool {
        self.backpack.iter().any(|i| i.item_id == item_id)
    }

    pub fn has_buff_flag(&self, flag: BuffFlag) -> bool {
        self.buffs.iter().any(|b| b.has_flag(flag))
    }

    /// Remove every buff carrying `flag`, returning what was removed.
    pub fn cancel_buffs_with_flag(&mut self, flag: BuffFlag) -> Vec<ActiveBuff> {
        let (cancelled, kept): (Vec<_>, Vec<_>) =
            self.buffs.drain(..).partition(|b| b.has_flag(flag));
        self.buffs = kept;
        cancelled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    /// Privilege level, see [`crate::roles`].
    #[serde(default = "default_role")]
    pub role: u8,
    #[serde(default)]
    pub online: bool,
    pub character: Character,
}

fn default_role() -> u8 {
    LEVEL_USER
}

impl User {
    pub fn new(user_id: UserId, username: &str, character: Character) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            role: LEVEL_USER,
            online: true,
            character,
        }
    }

    pub fn with_role(mut self, role: u8) -> Self {
        self.role = role;
        self
    }
}

/// Static data a mob instance is created from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MobTemplate {
    pub template_id: MobTemplateId,
    pub name: String,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub items: Vec<ItemId>,
    /// Offers copied into every spawned instance, in declaration order.
    #[serde(default)]
    pub trades: Vec<TradeOffer>,
}

impl MobTemplate {
    pub fn new(template_id: MobTemplateId, name: &str) -> Self {
        Self {
            template_id,
            name: name.to_string(),
            gold: 0,
            items: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn with_trade(mut self, offer: TradeOffer) -> Self {
        self.trades.push(offer);
        self
    }
}

/// A live NPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mob {
    pub instance_id: MobInstanceId,
    pub template_id: MobTemplateId,
    pub character: Character,
    #[serde(default)]
    pub trades: Vec<TradeOffer>,
}
