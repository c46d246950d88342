//! `give <item> to <target>` and `give <n> gold to <target>`.
//!
//! Giving to an NPC runs the barter negotiation inline. Whatever the outcome,
//! the item or gold always changes hands first; a completed trade pays out by
//! enqueuing follow-up commands as the NPC.

use log::{debug, warn};

use super::{CommandContext, HandlerResult};
use crate::sim::errors::SimError;
use crate::sim::trade::{self, Delivery, NegotiationOutcome, TradePrize};
use crate::world::buffs::BuffFlag;
use crate::world::types::{Actor, MobInstanceId};

enum Gift {
    Gold(i64),
    Item(String),
}

fn parse_gift(what: &str) -> Gift {
    let words: Vec<&str> = what.split_whitespace().collect();
    if let [amount, unit] = words.as_slice() {
        if unit.eq_ignore_ascii_case("gold") {
            if let Ok(amount) = amount.parse::<i64>() {
                return Gift::Gold(amount);
            }
        }
    }
    Gift::Item(what.trim().to_string())
}

pub fn handle(ctx: &mut CommandContext<'_>, args: &str) -> HandlerResult {
    let giver = ctx.actor;
    let Some((what, whom)) = args.rsplit_once(" to ") else {
        ctx.reply("Give what to whom?");
        return Ok(());
    };
    let (what, whom) = (what.trim(), whom.trim());
    if what.is_empty() || whom.is_empty() {
        ctx.reply("Give what to whom?");
        return Ok(());
    }

    let room_id = ctx.world.character(giver)?.room_id;
    // Players give within their room. NPC and system follow-ups (prize
    // payouts) may address a recipient by id wherever it is now.
    let target = match ctx.source {
        Actor::User(_) => ctx.world.find_in_room(room_id, whom),
        Actor::Mob(_) | Actor::System => ctx
            .world
            .find_in_room(room_id, whom)
            .or_else(|| ctx.world.find_anywhere(whom)),
    };
    let Some(target) = target else {
        ctx.reply(&format!("You don't see {} here.", whom));
        return Ok(());
    };

    let gift = parse_gift(what);
    if target == giver {
        let text = match gift {
            Gift::Gold(_) => "You count your gold and put it back.",
            Gift::Item(_) => "You can't give things to yourself.",
        };
        ctx.reply(text);
        return Ok(());
    }

    for buff in ctx.world.character_mut(giver)?.cancel_buffs_with_flag(BuffFlag::Hidden) {
        if let Some(text) = buff.end_message {
            ctx.messages.to_actor(giver, &text, true);
        }
    }

    match gift {
        Gift::Gold(amount) => give_gold(ctx, giver, target, amount),
        Gift::Item(name) => give_item(ctx, giver, target, &name),
    }
}

fn give_gold(ctx: &mut CommandContext<'_>, giver: Actor, target: Actor, amount: i64) -> HandlerResult {
    if amount < 0 {
        ctx.reply("You can't give a negative amount of gold.");
        return Ok(());
    }
    if amount == 0 {
        ctx.reply("Give how much gold?");
        return Ok(());
    }
    let amount = amount as u64;
    if ctx.world.character(giver)?.gold < amount {
        ctx.reply("You don't have that much gold.");
        return Ok(());
    }
    // Resolve the receiver before touching the giver so a miss leaves both unchanged.
    ctx.world.character(target)?;
    ctx.world.character_mut(giver)?.gold -= amount;
    let receiver = ctx.world.character_mut(target)?;
    receiver.gold = receiver.gold.saturating_add(amount);

    let giver_name = ctx.world.actor_name(giver);
    let target_name = ctx.world.actor_name(target);
    let room_id = ctx.world.character(giver)?.room_id;
    ctx.messages
        .to_actor(giver, &format!("You give {} gold to {}.", amount, target_name), true);
    ctx.messages
        .to_actor(target, &format!("{} gives you {} gold.", giver_name, amount), true);
    ctx.messages.to_room(
        room_id,
        &format!("{} gives some gold to {}.", giver_name, target_name),
        true,
        &[giver, target],
    );

    if let Actor::Mob(mob_id) = target {
        negotiate(ctx, mob_id, giver, Delivery::Gold(amount))?;
    }
    Ok(())
}

fn give_item(ctx: &mut CommandContext<'_>, giver: Actor, target: Actor, name: &str) -> HandlerResult {
    let Some(item) = ctx.world.character(giver)?.find_in_backpack(&ctx.world.items, name) else {
        ctx.reply(&format!("You don't have {}.", name));
        return Ok(());
    };
    ctx.world.character(target)?;
    if !ctx.world.character_mut(giver)?.remove_item(&item) {
        return Err(SimError::ItemNotFound(item.item_id));
    }
    let item_id = item.item_id;
    let item_name = item.name(&ctx.world.items);
    let quest_token = ctx
        .world
        .items
        .resolve(&item)
        .and_then(|spec| spec.quest_token.clone());
    ctx.world.character_mut(target)?.store_item(item);

    let giver_name = ctx.world.actor_name(giver);
    let target_name = ctx.world.actor_name(target);
    let room_id = ctx.world.character(giver)?.room_id;
    ctx.messages
        .to_actor(giver, &format!("You give the {} to {}.", item_name, target_name), true);
    ctx.messages
        .to_actor(target, &format!("{} gives you the {}.", giver_name, item_name), true);
    ctx.messages.to_room(
        room_id,
        &format!("{} gives the {} to {}.", giver_name, item_name, target_name),
        true,
        &[giver, target],
    );

    match target {
        Actor::User(_) => {
            if let Some(token) = quest_token {
                ctx.queue.queue_quest(giver, target, &token, 0);
            }
        }
        Actor::Mob(mob_id) => {
            let outcome = negotiate(ctx, mob_id, giver, Delivery::Item(item_id))?;
            if outcome == NegotiationOutcome::Unmatched {
                ctx.queue.queue_emote(
                    giver,
                    target,
                    &format!("considers the {} for a moment.", item_name),
                    0,
                );
                ctx.queue
                    .queue_command(giver, target, &format!("gearup !{}", item_id), 0);
            }
        }
        Actor::System => {}
    }
    Ok(())
}

fn negotiate(
    ctx: &mut CommandContext<'_>,
    mob_id: MobInstanceId,
    trader: Actor,
    delivery: Delivery,
) -> Result<NegotiationOutcome, SimError> {
    let mob = ctx.world.mob_mut(mob_id)?;
    let outcome = trade::negotiate(&mut mob.trades, trader, delivery);
    match &outcome {
        NegotiationOutcome::Satisfied { offer_index, prize } => {
            debug!("mob {} trade {} satisfied by {}", mob_id, offer_index, trader);
            pay_prize(ctx, mob_id, trader, prize)?;
        }
        NegotiationOutcome::Progress { offer_index } => {
            debug!("mob {} trade {} progressed by {}", mob_id, offer_index, trader);
        }
        NegotiationOutcome::Unmatched => {}
    }
    Ok(outcome)
}

/// Hand out a trade prize. Transfers are queued as the NPC; only the
/// relocation happens immediately.
fn pay_prize(
    ctx: &mut CommandContext<'_>,
    mob_id: MobInstanceId,
    trader: Actor,
    prize: &TradePrize,
) -> HandlerResult {
    let mob = Actor::Mob(mob_id);
    let recipient = trader.target_token();

    for item_id in &prize.item_ids {
        match ctx.world.items.new_item(*item_id) {
            Some(item) => {
                ctx.world.character_mut(mob)?.store_item(item);
                ctx.queue
                    .queue_command(mob, mob, &format!("give !{} to {}", item_id, recipient), 0);
            }
            None => warn!("trade prize references unknown item {}", item_id),
        }
    }
    for buff_id in &prize.buff_ids {
        ctx.queue.queue_buff(mob, trader, *buff_id, 0);
    }
    for token in &prize.quest_ids {
        ctx.queue.queue_quest(mob, trader, token, 0);
    }
    if prize.gold > 0 {
        let npc = ctx.world.character_mut(mob)?;
        npc.gold = npc.gold.saturating_add(prize.gold);
        ctx.queue
            .queue_command(mob, mob, &format!("give {} gold to {}", prize.gold, recipient), 0);
    }
    for command in &prize.commands {
        ctx.queue.queue_command(mob, mob, command, 0);
    }

    if let Some(room_id) = prize.room_id {
        let Ok(room) = ctx.world.room(room_id) else {
            warn!("trade prize of mob {} references unknown room {}", mob_id, room_id);
            return Ok(());
        };
        let title = room.title.clone();
        let name = ctx.world.actor_name(trader);
        let from = ctx.world.move_actor(trader, room_id)?;
        ctx.messages.to_actor(
            trader,
            &format!("The world blurs around you. You arrive at {}.", title),
            true,
        );
        ctx.messages
            .to_room(from, &format!("{} vanishes.", name), true, &[trader]);
        ctx.messages
            .to_room(room_id, &format!("{} appears.", name), true, &[trader]);
    }
    Ok(())
}

/// `trades <npc>`: what the caller has handed an NPC so far.
pub fn handle_trades(ctx: &mut CommandContext<'_>, args: &str) -> HandlerResult {
    let actor = ctx.actor;
    let room_id = ctx.world.character(actor)?.room_id;
    let Some(Actor::Mob(mob_id)) = ctx.world.find_in_room(room_id, args.trim()) else {
        ctx.reply("Check trades with whom?");
        return Ok(());
    };
    let mob = ctx.world.mob(mob_id)?;
    let progress = trade::progress(&mob.trades, actor);
    if progress.is_empty() {
        let text = format!("You have no trades under way with {}.", mob.character.name);
        ctx.reply(&text);
        return Ok(());
    }
    let mut lines = Vec::with_capacity(progress.len());
    for p in progress {
        let names: Vec<String> = p
            .items_given
            .iter()
            .map(|id| {
                ctx.world
                    .items
                    .get(*id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| format!("item #{}", id))
            })
            .collect();
        lines.push(format!(
            "Trade {}: {}/{} items ({}), {}/{} gold",
            p.offer_index + 1,
            p.items_given.len(),
            p.items_accepted.len(),
            if names.is_empty() { "none".to_string() } else { names.join(", ") },
            p.gold_given,
            p.gold_accepted
        ));
    }
    ctx.reply(&lines.join("\n"));
    Ok(())
}
