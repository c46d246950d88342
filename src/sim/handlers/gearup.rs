//! `gearup <item>`: put an item on if it beats what is worn in its slot.
//!
//! NPCs receive this as a follow-up when handed an item outside any trade,
//! so feedback goes to the actor itself rather than the source.

use super::{CommandContext, HandlerResult};

pub fn handle(ctx: &mut CommandContext<'_>, args: &str) -> HandlerResult {
    let actor = ctx.actor;
    let name = args.trim();
    let character = ctx.world.character(actor)?;
    let Some(item) = character.find_in_backpack(&ctx.world.items, name) else {
        ctx.messages
            .to_actor(actor, &format!("You don't have {}.", name), true);
        return Ok(());
    };
    let Some(slot) = ctx.world.items.resolve(&item).and_then(|spec| spec.slot) else {
        ctx.messages.to_actor(actor, "You can't equip that.", true);
        return Ok(());
    };

    let current = character.equipment.get(&slot);
    if current.is_some_and(|worn| worn.is_cursed(&ctx.world.items)) {
        ctx.messages
            .to_actor(actor, "Something you are wearing refuses to come off.", true);
        return Ok(());
    }
    if !item.is_better_than(current, &ctx.world.items) {
        return Ok(());
    }

    let item_name = item.name(&ctx.world.items);
    let room_id = character.room_id;
    let character = ctx.world.character_mut(actor)?;
    character.remove_item(&item);
    if let Some(old) = character.equipment.insert(slot, item) {
        character.store_item(old);
    }
    let line = format!("{} equips the {}.", ctx.world.actor_name(actor), item_name);
    ctx.messages.to_room(room_id, &line, true, &[]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use crate::world::items::EquipSlot;
    use crate::world::seed::*;
    use crate::world::types::Actor;

    #[test]
    fn npc_equips_better_gear_only() {
        let mut h = Harness::new(starter_world());
        let tanner = Actor::Mob(1);
        let sword = h.world.items.new_item(RUSTY_SWORD).unwrap();
        h.world.character_mut(tanner).unwrap().store_item(sword);

        h.run(tanner, &format!("gearup !{}", RUSTY_SWORD)).unwrap();
        let character = h.world.character(tanner).unwrap();
        assert_eq!(character.equipment[&EquipSlot::Weapon].item_id, RUSTY_SWORD);
        assert!(!character.has_item_id(RUSTY_SWORD));

        // Same value does not replace what is worn.
        let spare = h.world.items.new_item(RUSTY_SWORD).unwrap();
        h.world.character_mut(tanner).unwrap().store_item(spare);
        h.run(tanner, &format!("gearup !{}", RUSTY_SWORD)).unwrap();
        assert!(h.world.character(tanner).unwrap().has_item_id(RUSTY_SWORD));
    }

    #[test]
    fn unslotted_items_stay_in_backpack() {
        let mut h = Harness::new(starter_world());
        let ada = Actor::User(PLAYER_USER);
        h.run(ada, "gearup pelt").unwrap();
        assert!(h.world.character(ada).unwrap().equipment.is_empty());
        h.run(ada, "gearup cap").unwrap();
        assert!(h
            .world
            .character(ada)
            .unwrap()
            .equipment
            .contains_key(&EquipSlot::Head));
    }
}
