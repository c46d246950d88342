//! NPC barter trades driven end to end through the scheduler.

mod common;

use common::{drain, starter_simulation, texts_for};
use mudcore::world::seed::*;
use mudcore::world::types::Actor;

const ADA: Actor = Actor::User(PLAYER_USER);

fn count(items: &[mudcore::world::items::Item], item_id: u32) -> usize {
    items.iter().filter(|i| i.item_id == item_id).count()
}

#[test]
fn partial_delivery_holds_the_prize() {
    let (mut sim, mut rx) = starter_simulation();
    sim.world_mut().move_actor(ADA, TANNERY).unwrap();
    sim.queue().queue_command(ADA, ADA, "give pelt to tanner", 0);
    sim.tick();
    sim.tick();

    let tanner = sim.world().mob(1).unwrap();
    assert_eq!(tanner.trades[0].given_items.get(&ADA), Some(&vec![WOLF_PELT]));
    assert!(sim.queue().is_empty());
    let ada = &sim.world().user(PLAYER_USER).unwrap().character;
    assert!(!ada.has_item_id(TANNED_CLOAK));

    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert_eq!(msgs.len(), 1);
    assert!(msgs[0].contains("wolf pelt"));
}

#[test]
fn completed_trade_pays_out_once() {
    let (mut sim, mut rx) = starter_simulation();
    sim.world_mut().move_actor(ADA, TANNERY).unwrap();
    let queue = sim.queue();
    queue.queue_command(ADA, ADA, "give pelt to tanner", 0);
    queue.queue_command(ADA, ADA, "give pelt to tanner", 0);
    queue.queue_command(ADA, ADA, "give 10 gold to tanner", 0);

    // Turn 1 negotiates; the prize is paid by the follow-ups on turn 2.
    sim.tick();
    assert!(!sim.queue().is_empty());
    sim.tick();
    assert!(sim.queue().is_empty());

    let ada = &sim.world().user(PLAYER_USER).unwrap().character;
    assert!(ada.has_item_id(TANNED_CLOAK));
    assert_eq!(count(&ada.backpack, WOLF_PELT), 0);
    assert_eq!(ada.gold, 30);
    assert!(ada.buffs.iter().any(|b| b.buff_id == BUFF_TANNERS_BLESSING));
    assert!(ada.quest_tokens.contains("1-start"));

    let tanner = sim.world().mob(1).unwrap();
    assert!(tanner.trades[0].given_items.is_empty());
    assert!(tanner.trades[0].given_gold.is_empty());
    assert_eq!(count(&tanner.character.backpack, WOLF_PELT), 2);
    // Its own stock cloak stays; the prize cloak was minted for the trade.
    assert_eq!(count(&tanner.character.backpack, TANNED_CLOAK), 1);
    assert_eq!(tanner.character.gold, 35);

    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert!(msgs.iter().any(|m| m.contains("tanned cloak")));
    assert!(msgs.iter().any(|m| m == "A warm feeling settles over you.\n"));
    assert!(msgs.iter().any(|m| m == "Quest updated: The Lost Map\n"));
    assert!(msgs.iter().any(|m| m.contains("nods approvingly.")));

    // Nothing left over to fire a second time.
    for _ in 0..5 {
        sim.tick();
    }
    let ada = &sim.world().user(PLAYER_USER).unwrap().character;
    assert_eq!(count(&ada.backpack, TANNED_CLOAK), 1);
}

#[test]
fn relocation_prize_moves_the_trader_immediately() {
    let (mut sim, mut rx) = starter_simulation();
    sim.world_mut().move_actor(ADA, TANNERY).unwrap();
    sim.queue().queue_command(ADA, ADA, "give map to tanner", 0);
    sim.tick();

    let ada = &sim.world().user(PLAYER_USER).unwrap().character;
    assert_eq!(ada.room_id, HIDDEN_GROVE);
    assert!(sim.world().rooms[&HIDDEN_GROVE].users.contains(&PLAYER_USER));
    assert!(!sim.world().rooms[&TANNERY].users.contains(&PLAYER_USER));
    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert!(msgs.iter().any(|m| m.contains("Hidden Grove")));
}

#[test]
fn unwanted_items_make_the_npc_try_them_on() {
    let (mut sim, _rx) = starter_simulation();
    sim.world_mut().move_actor(ADA, TANNERY).unwrap();
    sim.queue().queue_command(ADA, ADA, "give cap to tanner", 0);
    sim.tick();
    sim.tick();

    let tanner = sim.world().mob(1).unwrap();
    assert!(tanner
        .character
        .equipment
        .values()
        .any(|i| i.item_id == LEATHER_CAP));
    assert!(tanner.trades.iter().all(|t| t.given_items.is_empty()));
}

#[test]
fn deliveries_from_different_players_are_tracked_apart() {
    let (mut sim, _rx) = starter_simulation();
    let warden = Actor::User(ADMIN_USER);
    {
        let world = sim.world_mut();
        let pelt = world.items.new_item(WOLF_PELT).unwrap();
        world.user_mut(ADMIN_USER).unwrap().character.store_item(pelt);
        world.move_actor(ADA, TANNERY).unwrap();
        world.move_actor(warden, TANNERY).unwrap();
    }
    let queue = sim.queue();
    queue.queue_command(ADA, ADA, "give pelt to tanner", 0);
    queue.queue_command(warden, warden, "give pelt to tanner", 0);
    queue.queue_command(warden, warden, "give 10 gold to tanner", 0);
    sim.tick();
    sim.tick();

    let tanner = sim.world().mob(1).unwrap();
    assert_eq!(tanner.trades[0].given_items.get(&ADA), Some(&vec![WOLF_PELT]));
    assert_eq!(tanner.trades[0].given_items.get(&warden), Some(&vec![WOLF_PELT]));
    assert_eq!(tanner.trades[0].given_gold.get(&warden), Some(&10));
    assert!(!sim
        .world()
        .user(ADMIN_USER)
        .unwrap()
        .character
        .has_item_id(TANNED_CLOAK));
}

#[test]
fn traders_must_stand_with_the_npc() {
    let (mut sim, mut rx) = starter_simulation();
    let queue = sim.queue();
    queue.queue_command(ADA, ADA, "give pelt to #1", 0);
    queue.queue_command(ADA, ADA, "give pelt to #1", 0);
    queue.queue_command(ADA, ADA, "give 10 gold to #1", 0);
    sim.tick();
    sim.tick();

    let ada = &sim.world().user(PLAYER_USER).unwrap().character;
    assert_eq!(ada.room_id, TOWN_SQUARE);
    assert!(!ada.has_item_id(TANNED_CLOAK));
    assert_eq!(count(&ada.backpack, WOLF_PELT), 2);
    assert_eq!(count(&sim.world().mob(1).unwrap().character.backpack, WOLF_PELT), 0);
    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert_eq!(msgs, vec!["You don't see #1 here.\n"; 3]);
}

#[test]
fn missing_prize_room_keeps_the_hand_over() {
    let (mut sim, mut rx) = starter_simulation();
    sim.world_mut().rooms.remove(&HIDDEN_GROVE);
    sim.world_mut().move_actor(ADA, TANNERY).unwrap();
    sim.queue().queue_command(ADA, ADA, "give map to tanner", 0);
    sim.tick();

    assert_eq!(sim.stats().failed_total, 0);
    assert_eq!(sim.stats().dispatched_total, 1);
    let ada = &sim.world().user(PLAYER_USER).unwrap().character;
    assert_eq!(ada.room_id, TANNERY);
    assert!(!ada.has_item_id(MAP_FRAGMENT));
    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert!(msgs.iter().any(|m| m.contains("map fragment")));
}
