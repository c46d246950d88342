//! `spawn` (admin and system only) and the loot goblin's `loot`.
//!
//! * `spawn item <id|name> [count]` into the caller's backpack
//! * `spawn gold <amount>` into the caller's purse
//! * `spawn mob <template id> [room id]`
//! * `spawn loot goblin`, issued by the round scheduler

use log::{info, warn};
use rand::seq::SliceRandom;

use super::{CommandContext, HandlerResult};
use crate::roles::is_admin;
use crate::world::types::{Actor, RoomId};

const USAGE: &str = "Usage: spawn item <id|name> [count] | spawn gold <amount> | spawn mob <template> [room] | spawn loot goblin";

fn authorized(ctx: &CommandContext<'_>) -> bool {
    match ctx.source {
        Actor::System | Actor::Mob(_) => true,
        Actor::User(id) => ctx.world.user(id).is_ok_and(|u| is_admin(u.role)),
    }
}

pub fn handle(ctx: &mut CommandContext<'_>, args: &str) -> HandlerResult {
    if !authorized(ctx) {
        warn!(target: "security", "spawn refused for {}: {}", ctx.source, args);
        ctx.reply("You don't have permission to do that.");
        return Ok(());
    }
    let words: Vec<&str> = args.split_whitespace().collect();
    match words.as_slice() {
        ["loot", "goblin"] => spawn_loot_goblin(ctx),
        ["gold", amount] => match amount.parse::<u64>() {
            Ok(amount) if amount > 0 => {
                let character = ctx.world.character_mut(ctx.actor)?;
                character.gold = character.gold.saturating_add(amount);
                ctx.reply(&format!("{} gold appears in your purse.", amount));
                Ok(())
            }
            _ => {
                ctx.reply(USAGE);
                Ok(())
            }
        },
        ["item", rest @ ..] if !rest.is_empty() => {
            let (name, count) = match rest.split_last() {
                Some((last, head)) if !head.is_empty() => match last.parse::<usize>() {
                    Ok(n) => (head.join(" "), n.clamp(1, 50)),
                    Err(_) => (rest.join(" "), 1),
                },
                _ => (rest.join(" "), 1),
            };
            spawn_item(ctx, &name, count)
        }
        ["mob", template] | ["mob", template, _] => {
            let Ok(template_id) = template.parse::<u32>() else {
                ctx.reply(USAGE);
                return Ok(());
            };
            let room_id = match words.get(2).map(|r| r.parse::<RoomId>()) {
                Some(Ok(room)) => room,
                Some(Err(_)) => {
                    ctx.reply(USAGE);
                    return Ok(());
                }
                None => ctx.world.character(ctx.actor)?.room_id,
            };
            if !ctx.world.mob_templates.contains_key(&template_id) {
                ctx.reply(&format!("No mob template {}.", template_id));
                return Ok(());
            }
            let instance = ctx.world.spawn_mob(template_id, room_id)?;
            let name = ctx.world.actor_name(Actor::Mob(instance));
            ctx.messages
                .to_room(room_id, &format!("{} appears.", name), true, &[]);
            ctx.reply(&format!("Spawned {} as #{}.", name, instance));
            Ok(())
        }
        _ => {
            ctx.reply(USAGE);
            Ok(())
        }
    }
}

fn spawn_item(ctx: &mut CommandContext<'_>, name: &str, count: usize) -> HandlerResult {
    let item_id = match name.parse::<u32>() {
        Ok(id) => Some(id),
        Err(_) => ctx.world.items.find_id_by_name(name),
    };
    let Some(item) = item_id.and_then(|id| ctx.world.items.new_item(id)) else {
        ctx.reply(&format!("No item called {}.", name));
        return Ok(());
    };
    let item_name = item.name(&ctx.world.items);
    let character = ctx.world.character_mut(ctx.actor)?;
    for _ in 0..count {
        character.store_item(item.clone());
    }
    ctx.reply(&format!("{} x {} appear in your backpack.", count, item_name));
    Ok(())
}

/// Spawn the goblin in its warren and send it to a random room with loot on
/// the floor. Does nothing if one is already about.
fn spawn_loot_goblin(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let world_cfg = ctx.config.world.clone();
    if !ctx
        .world
        .mobs_with_template(world_cfg.loot_goblin_mob_id)
        .is_empty()
    {
        return Ok(());
    }
    let candidates: Vec<RoomId> = ctx
        .world
        .rooms
        .values()
        .filter(|r| {
            r.attracts_loot_goblin(
                world_cfg.loot_goblin_minimum_items,
                world_cfg.loot_goblin_minimum_gold,
            )
        })
        .map(|r| r.room_id)
        .collect();
    let Some(destination) = candidates.choose(&mut rand::thread_rng()).copied() else {
        return Ok(());
    };

    let warren = world_cfg.loot_goblin_room_id;
    let instance = ctx.world.spawn_mob(world_cfg.loot_goblin_mob_id, warren)?;
    let goblin = Actor::Mob(instance);
    let name = ctx.world.actor_name(goblin);
    ctx.world.move_actor(goblin, destination)?;
    info!("loot goblin #{} spawned, heading for room {}", instance, destination);

    ctx.messages.to_room(
        destination,
        &format!("{} scurries in, eyes fixed on the floor.", name),
        true,
        &[],
    );
    // Give players a round to react before it grabs everything.
    ctx.queue
        .queue_command(Actor::System, goblin, "loot", ctx.timebase.turns_per_round());
    Ok(())
}

/// `loot`: scoop up every item and all gold lying in the room.
pub fn handle_loot(ctx: &mut CommandContext<'_>, _args: &str) -> HandlerResult {
    let actor = ctx.actor;
    let room_id = ctx.world.character(actor)?.room_id;
    let room = ctx.world.room_mut(room_id)?;
    let items = std::mem::take(&mut room.items);
    let gold = std::mem::take(&mut room.gold);
    if items.is_empty() && gold == 0 {
        return Ok(());
    }
    let character = ctx.world.character_mut(actor)?;
    character.gold = character.gold.saturating_add(gold);
    character.backpack.extend(items);
    let line = format!(
        "{} scoops up everything on the floor.",
        ctx.world.actor_name(actor)
    );
    ctx.messages.to_room(room_id, &line, true, &[]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use crate::sim::queue::CommandPayload;
    use crate::world::seed::*;
    use crate::world::types::Actor;

    const ADA: Actor = Actor::User(PLAYER_USER);
    const WARDEN: Actor = Actor::User(ADMIN_USER);

    #[test]
    fn players_cannot_spawn() {
        let mut h = Harness::new(starter_world());
        h.run(ADA, "spawn gold 100").unwrap();
        assert_eq!(h.world.character(ADA).unwrap().gold, 40);
        assert_eq!(h.messages.len(), 1);
    }

    #[test]
    fn admins_spawn_items_gold_and_mobs() {
        let mut h = Harness::new(starter_world());
        h.run(WARDEN, "spawn item wolf pelt 3").unwrap();
        h.run(WARDEN, &format!("spawn item {}", RUSTY_SWORD)).unwrap();
        h.run(WARDEN, "spawn gold 25").unwrap();
        h.run(WARDEN, &format!("spawn mob {} {}", TANNER, GOBLIN_WARREN))
            .unwrap();

        let warden = h.world.character(WARDEN).unwrap();
        assert_eq!(
            warden
                .backpack
                .iter()
                .filter(|i| i.item_id == WOLF_PELT)
                .count(),
            3
        );
        assert!(warden.has_item_id(RUSTY_SWORD));
        assert_eq!(warden.gold, 525);
        assert_eq!(h.world.mobs_with_template(TANNER).len(), 2);
    }

    #[test]
    fn loot_goblin_targets_rooms_with_loot() {
        let mut h = Harness::new(starter_world());
        h.run_payload(
            Actor::System,
            Actor::System,
            CommandPayload::Command("spawn loot goblin".into()),
        )
        .unwrap();
        assert!(h.world.mobs_with_template(LOOT_GOBLIN).is_empty());

        for id in [RUSTY_SWORD, LEATHER_CAP] {
            let item = h.world.items.new_item(id).unwrap();
            h.world.room_mut(TOWN_SQUARE).unwrap().add_item(item);
        }
        for _ in 0..2 {
            h.run_payload(
                Actor::System,
                Actor::System,
                CommandPayload::Command("spawn loot goblin".into()),
            )
            .unwrap();
        }
        let goblins = h.world.mobs_with_template(LOOT_GOBLIN);
        assert_eq!(goblins.len(), 1);
        let goblin = Actor::Mob(goblins[0]);
        assert_eq!(h.world.character(goblin).unwrap().room_id, TOWN_SQUARE);

        let queued = h.queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].0, goblin);
        h.run(goblin, "loot").unwrap();
        assert!(h.world.rooms[&TOWN_SQUARE].items.is_empty());
        assert_eq!(h.world.character(goblin).unwrap().backpack.len(), 2);
    }
}
