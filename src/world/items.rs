//! Item templates and item instances.
//!
//! Templates ([`ItemSpec`]) are shared and read-only once loaded into the
//! [`ItemCatalog`]. Instances ([`Item`]) are small values that either inherit
//! everything from their template ([`SpecSource::Base`]) or carry a private,
//! fully resolved copy ([`SpecSource::Overridden`]) after an enchant or rename.
//! Resolution never mutates the catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::ItemId;
use crate::sim::errors::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    Weapon,
    Offhand,
    Head,
    Body,
    Feet,
    Neck,
    Ring,
    Gloves,
}

/// Shared item template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemSpec {
    pub item_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub name_simple: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub damage_bonus: i32,
    #[serde(default)]
    pub damage_reduction: i32,
    #[serde(default)]
    pub stat_mods: BTreeMap<String, i32>,
    /// Uses a fresh instance starts with (0 = unlimited / not consumable).
    #[serde(default)]
    pub uses: u32,
    #[serde(default)]
    pub cursed: bool,
    #[serde(default)]
    pub slot: Option<EquipSlot>,
    /// Quest progress granted to a player who receives this item.
    #[serde(default)]
    pub quest_token: Option<String>,
}

impl ItemSpec {
    pub fn new(item_id: ItemId, name: &str) -> Self {
        Self {
            item_id,
            name: name.to_string(),
            name_simple: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }

    pub fn with_slot(mut self, slot: EquipSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses = uses;
        self
    }

    pub fn with_quest_token(mut self, token: &str) -> Self {
        self.quest_token = Some(token.to_string());
        self
    }

    pub fn with_damage_bonus(mut self, bonus: i32) -> Self {
        self.damage_bonus = bonus;
        self
    }

    pub fn cursed(mut self) -> Self {
        self.cursed = true;
        self
    }

    fn recalculate_value(&mut self, base_value: u64) {
        let stat_total: i32 = self.stat_mods.values().sum();
        let bonus = (self.damage_bonus + self.damage_reduction + stat_total).max(0) as u64;
        self.value = base_value.saturating_add(bonus.saturating_mul(10));
    }
}

/// Where an instance gets its derived values from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecSource {
    /// Inherit from the catalog entry for the instance's `item_id`.
    #[default]
    Base,
    /// Private copy forked from the template.
    Overridden(Box<ItemSpec>),
}

/// A concrete item somewhere in the world. Compared by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    #[serde(default)]
    pub blob: Option<String>,
    #[serde(default)]
    pub uses: u32,
    #[serde(default)]
    pub spec: SpecSource,
    #[serde(default)]
    pub enchantments: u8,
    #[serde(default)]
    pub uncursed: bool,
}

impl Item {
    /// Bare instance that inherits from its template.
    pub fn base(item_id: ItemId) -> Self {
        Self {
            item_id,
            blob: None,
            uses: 0,
            spec: SpecSource::Base,
            enchantments: 0,
            uncursed: false,
        }
    }

    pub fn is_overridden(&self) -> bool {
        matches!(self.spec, SpecSource::Overridden(_))
    }

    pub fn is_enchanted(&self) -> bool {
        self.enchantments > 0
    }

    /// Resolved display name, falling back to the id if the template is gone.
    pub fn name(&self, catalog: &ItemCatalog) -> String {
        catalog
            .resolve(self)
            .map(|spec| spec.name.clone())
            .unwrap_or_else(|| format!("item #{}", self.item_id))
    }

    pub fn is_cursed(&self, catalog: &ItemCatalog) -> bool {
        catalog.resolve(self).is_some_and(|s| s.cursed) && !self.uncursed
    }

    pub fn uncurse(&mut self) {
        self.uncursed = true;
    }

    /// Higher resolved value wins; anything beats an empty slot.
    pub fn is_better_than(&self, other: Option<&Item>, catalog: &ItemCatalog) -> bool {
        let mine = catalog.resolve(self).map(|s| s.value).unwrap_or(0);
        match other {
            None => true,
            Some(other) => mine > catalog.resolve(other).map(|s| s.value).unwrap_or(0),
        }
    }

    /// Fork the template (or the existing override) and apply bonuses to the copy.
    pub fn enchant(
        &mut self,
        catalog: &ItemCatalog,
        damage_bonus: i32,
        defense_bonus: i32,
        stat_bonus: &BTreeMap<String, i32>,
        cursed: bool,
    ) -> Result<(), SimError> {
        let base_value = catalog
            .get(self.item_id)
            .map(|s| s.value)
            .ok_or(SimError::ItemNotFound(self.item_id))?;
        let mut spec = self.fork_spec(catalog)?;
        spec.damage_bonus += damage_bonus;
        spec.damage_reduction += defense_bonus;
        for (stat, amount) in stat_bonus {
            *spec.stat_mods.entry(stat.clone()).or_insert(0) += amount;
        }
        spec.cursed = cursed;
        spec.recalculate_value(base_value);
        self.enchantments = self.enchantments.saturating_add(1);
        self.spec = SpecSource::Overridden(Box::new(spec));
        Ok(())
    }

    /// Drop any enchantment override and go back to the template.
    pub fn unenchant(&mut self) {
        if self.is_enchanted() {
            self.spec = SpecSource::Base;
            self.enchantments = 0;
        }
    }

    pub fn rename(&mut self, catalog: &ItemCatalog, new_name: &str) -> Result<(), SimError> {
        let mut spec = self.fork_spec(catalog)?;
        spec.name = new_name.to_string();
        spec.name_simple = new_name.to_string();
        self.spec = SpecSource::Overridden(Box::new(spec));
        Ok(())
    }

    fn fork_spec(&self, catalog: &ItemCatalog) -> Result<ItemSpec, SimError> {
        match &self.spec {
            SpecSource::Overridden(spec) => Ok((**spec).clone()),
            SpecSource::Base => catalog
                .get(self.item_id)
                .cloned()
                .ok_or(SimError::ItemNotFound(self.item_id)),
        }
    }

    /// (partial, full) name match against `input`.
    pub fn name_match(&self, catalog: &ItemCatalog, input: &str, allow_contains: bool) -> (bool, bool) {
        let input = input.to_lowercase();
        let name = self.name(catalog).to_lowercase();
        if allow_contains && name.contains(&input) {
            return (true, name == input);
        }
        if name.starts_with(&input) {
            return (true, name == input);
        }
        (false, false)
    }
}

/// Template lookup table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    specs: BTreeMap<ItemId, ItemSpec>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: ItemSpec) {
        self.specs.insert(spec.item_id, spec);
    }

    pub fn get(&self, item_id: ItemId) -> Option<&ItemSpec> {
        self.specs.get(&item_id)
    }

    /// Resolve the effective spec of an instance. Pure: overrides win,
    /// otherwise the shared template.
    pub fn resolve<'a>(&'a self, item: &'a Item) -> Option<&'a ItemSpec> {
        match &item.spec {
            SpecSource::Overridden(spec) => Some(spec.as_ref()),
            SpecSource::Base => self.specs.get(&item.item_id),
        }
    }

    /// Fresh instance of a template, or `None` for unknown ids.
    pub fn new_item(&self, item_id: ItemId) -> Option<Item> {
        let spec = self.specs.get(&item_id)?;
        let mut item = Item::base(item_id);
        item.uses = spec.uses;
        Some(item)
    }

    pub fn find_id_by_name(&self, name: &str) -> Option<ItemId> {
        let name = name.to_lowercase();
        self.specs
            .values()
            .find(|s| s.name.to_lowercase() == name || s.name_simple.to_lowercase() == name)
            .or_else(|| {
                self.specs
                    .values()
                    .find(|s| s.name.to_lowercase().starts_with(&name))
            })
            .map(|s| s.item_id)
    }
}

/// Split `name#3` into (`name`, 3). Defaults to the first match.
fn split_match_number(input: &str) -> (&str, usize) {
    if let Some((name, n)) = input.rsplit_once('#') {
        if let Ok(n) = n.parse::<usize>() {
            if n > 0 {
                return (name, n);
            }
        }
    }
    (input, 1)
}

/// Find the index of the item in `items` that best matches `input`.
///
/// `!<id>` selects by template id. Otherwise exact and prefix matches are
/// preferred, then substring matches. `sword#2` picks the second match.
pub fn find_match(catalog: &ItemCatalog, input: &str, items: &[Item]) -> Option<usize> {
    if let Some(id) = input.strip_prefix('!') {
        let id: ItemId = id.parse().ok()?;
        return items.iter().position(|i| i.item_id == id);
    }

    let (name, nth) = split_match_number(input);
    if name.is_empty() {
        return None;
    }

    let mut partial_seen = 0;
    let mut full_seen = 0;
    let mut partial = None;
    for (idx, item) in items.iter().enumerate() {
        let (part, full) = item.name_match(catalog, name, false);
        if part {
            partial_seen += 1;
            if partial_seen == nth && partial.is_none() {
                partial = Some(idx);
            }
        }
        if full {
            full_seen += 1;
            if full_seen == nth {
                return Some(idx);
            }
        }
    }
    if partial.is_some() {
        return partial;
    }

    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.name_match(catalog, name, true).0)
        .nth(nth - 1)
        .map(|(idx, _)| idx)
}
