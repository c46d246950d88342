//! NPC barter contracts.
//!
//! An NPC holds a list of [`TradeOffer`]s copied from its template. Each
//! offer tracks, per contributing actor, what that actor has handed over so
//! far. Deliveries arrive one at a time from independent `give` commands; the
//! prize fires when one actor's contribution matches the offer exactly, and
//! that actor's progress on that offer is then reset so it cannot fire twice.
//!
//! Satisfaction uses multiset equality on item ids: an offer accepting
//! `[500, 500]` needs two separate deliveries of item 500 from the same actor.
//! Gold may overshoot; the excess is kept by the NPC.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::world::types::{Actor, BuffId, ItemId, RoomId};

/// What an offer pays out once satisfied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradePrize {
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub buff_ids: Vec<BuffId>,
    #[serde(default)]
    pub gold: u64,
    /// Relocate the trader here after payout.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// Quest progress tokens, e.g. `1-start`.
    #[serde(default)]
    pub quest_ids: Vec<String>,
    /// Free-text commands run as the NPC, in order.
    #[serde(default)]
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub accepted_items: Vec<ItemId>,
    #[serde(default)]
    pub accepted_gold: u64,
    #[serde(default)]
    pub given_items: BTreeMap<Actor, Vec<ItemId>>,
    #[serde(default)]
    pub given_gold: BTreeMap<Actor, u64>,
    pub prize: TradePrize,
}

/// A single hand-over from an actor to the NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Item(ItemId),
    Gold(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationOutcome {
    /// No offer wanted this delivery.
    Unmatched,
    /// Credited to an offer that still needs more.
    Progress { offer_index: usize },
    /// Credited and completed; the actor's progress on that offer is cleared.
    Satisfied {
        offer_index: usize,
        prize: TradePrize,
    },
}

/// Partial progress of one actor against one offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferProgress {
    pub offer_index: usize,
    pub items_given: Vec<ItemId>,
    pub items_accepted: Vec<ItemId>,
    pub gold_given: u64,
    pub gold_accepted: u64,
}

fn count_of(ids: &[ItemId], item_id: ItemId) -> usize {
    ids.iter().filter(|id| **id == item_id).count()
}

impl TradeOffer {
    pub fn new(accepted_items: Vec<ItemId>, accepted_gold: u64, prize: TradePrize) -> Self {
        Self {
            accepted_items,
            accepted_gold,
            given_items: BTreeMap::new(),
            given_gold: BTreeMap::new(),
            prize,
        }
    }

    fn given_items_of(&self, actor: Actor) -> &[ItemId] {
        self.given_items
            .get(&actor)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn given_gold_of(&self, actor: Actor) -> u64 {
        self.given_gold.get(&actor).copied().unwrap_or(0)
    }

    /// Whether `actor` has delivered fewer copies of `item_id` than accepted.
    pub fn needs_item(&self, actor: Actor, item_id: ItemId) -> bool {
        count_of(self.given_items_of(actor), item_id) < count_of(&self.accepted_items, item_id)
    }

    pub fn accepts_gold(&self) -> bool {
        self.accepted_gold > 0
    }

    pub fn gold_satisfied(&self, actor: Actor) -> bool {
        self.given_gold_of(actor) >= self.accepted_gold
    }

    pub fn is_satisfied_by(&self, actor: Actor) -> bool {
        if !self.gold_satisfied(actor) {
            return false;
        }
        let mut given = self.given_items_of(actor).to_vec();
        let mut accepted = self.accepted_items.clone();
        given.sort_unstable();
        accepted.sort_unstable();
        given == accepted
    }

    fn record(&mut self, actor: Actor, delivery: Delivery) {
        match delivery {
            Delivery::Item(item_id) => self.given_items.entry(actor).or_default().push(item_id),
            Delivery::Gold(amount) => {
                let total = self.given_gold.entry(actor).or_insert(0);
                *total = total.saturating_add(amount);
            }
        }
    }

    fn clear(&mut self, actor: Actor) {
        self.given_items.remove(&actor);
        self.given_gold.remove(&actor);
    }
}

fn select_offer(offers: &[TradeOffer], actor: Actor, delivery: Delivery) -> Option<usize> {
    match delivery {
        Delivery::Item(item_id) => offers.iter().position(|o| o.needs_item(actor, item_id)),
        Delivery::Gold(0) => None,
        Delivery::Gold(_) => offers
            .iter()
            .position(|o| o.accepts_gold() && !o.gold_satisfied(actor))
            .or_else(|| offers.iter().position(|o| o.accepts_gold())),
    }
}

/// Credit one delivery from `actor` against the first offer that wants it.
///
/// Offers are scanned in declaration order and at most one offer is credited
/// per delivery. Only the credited offer is checked for satisfaction.
pub fn negotiate(offers: &mut [TradeOffer], actor: Actor, delivery: Delivery) -> NegotiationOutcome {
    let Some(offer_index) = select_offer(offers, actor, delivery) else {
        return NegotiationOutcome::Unmatched;
    };
    let offer = &mut offers[offer_index];
    offer.record(actor, delivery);
    if offer.is_satisfied_by(actor) {
        offer.clear(actor);
        NegotiationOutcome::Satisfied {
            offer_index,
            prize: offer.prize.clone(),
        }
    } else {
        NegotiationOutcome::Progress { offer_index }
    }
}

/// What `actor` has delivered so far, for every offer they have started.
pub fn progress(offers: &[TradeOffer], actor: Actor) -> Vec<OfferProgress> {
    offers
        .iter()
        .enumerate()
        .filter(|(_, o)| o.given_items.contains_key(&actor) || o.given_gold.contains_key(&actor))
        .map(|(offer_index, o)| OfferProgress {
            offer_index,
            items_given: o.given_items_of(actor).to_vec(),
            items_accepted: o.accepted_items.clone(),
            gold_given: o.given_gold_of(actor),
            gold_accepted: o.accepted_gold,
        })
        .collect()
}
