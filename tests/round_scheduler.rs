//! Turn/round cadence, round hooks and per-command isolation.

mod common;

use common::{drain, simulation_with, starter_simulation, test_config, texts_for};
use mudcore::config::{Config, SharedConfig};
use mudcore::sim::handlers::{CommandContext, HandlerResult, HandlerTable};
use mudcore::sim::{SimError, Simulation};
use mudcore::world::saver::{load_snapshot, JsonFileSaver};
use mudcore::world::seed::*;
use mudcore::world::types::Actor;

const ADA: Actor = Actor::User(PLAYER_USER);

/// One turn per round so round hooks are cheap to reach.
fn one_turn_rounds() -> Config {
    let mut cfg = test_config();
    cfg.timing.turn_milliseconds = 1000;
    cfg.timing.round_seconds = 1;
    cfg
}

fn explode(_ctx: &mut CommandContext<'_>, _args: &str) -> HandlerResult {
    panic!("boiler burst");
}

fn fizzle(ctx: &mut CommandContext<'_>, _args: &str) -> HandlerResult {
    ctx.reply("this never arrives");
    Err(SimError::Internal("fizzled".into()))
}

fn with_faulty_verbs(sim: Simulation) -> Simulation {
    let mut table = HandlerTable::standard();
    table.register("explode", explode);
    table.register("fizzle", fizzle);
    sim.with_handlers(table)
}

#[test]
fn rounds_complete_every_turns_per_round() {
    let (mut sim, _rx) = starter_simulation();
    assert_eq!(sim.timebase().turns_per_round(), 40);
    for _ in 0..39 {
        sim.tick();
    }
    assert_eq!(sim.stats().round, 0);
    sim.tick();
    assert_eq!(sim.stats().turn, 40);
    assert_eq!(sim.stats().round, 1);
}

#[test]
fn a_panicking_handler_does_not_stop_the_batch() {
    let (sim, mut rx) = starter_simulation();
    let mut sim = with_faulty_verbs(sim);
    let queue = sim.queue();
    queue.queue_command(ADA, ADA, "explode", 0);
    queue.queue_command(ADA, ADA, "emote survives.", 0);
    sim.tick();
    sim.tick();

    let stats = sim.stats();
    assert_eq!(stats.panicked_total, 1);
    assert_eq!(stats.dispatched_total, 1);
    assert_eq!(
        texts_for(&drain(&mut rx), PLAYER_USER),
        vec!["Ada survives.\n"]
    );
}

#[test]
fn failed_handlers_flush_nothing() {
    let (sim, mut rx) = starter_simulation();
    let mut sim = with_faulty_verbs(sim);
    let queue = sim.queue();
    queue.queue_command(ADA, ADA, "fizzle", 0);
    queue.queue_command(ADA, ADA, "emote shrugs.", 0);
    sim.tick();

    assert_eq!(sim.stats().failed_total, 1);
    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert_eq!(msgs, vec!["Ada shrugs.\n"]);
}

#[test]
fn unknown_verbs_get_a_reply() {
    let (mut sim, mut rx) = starter_simulation();
    sim.queue().queue_command(ADA, ADA, "dance wildly", 0);
    sim.tick();
    assert_eq!(
        texts_for(&drain(&mut rx), PLAYER_USER),
        vec!["Unknown command: dance\n"]
    );
}

#[test]
fn loot_goblin_comes_for_dropped_items() {
    let (mut sim, mut rx) = simulation_with(starter_world(), one_turn_rounds());
    {
        let world = sim.world_mut();
        for id in [RUSTY_SWORD, LEATHER_CAP] {
            let item = world.items.new_item(id).unwrap();
            world.room_mut(TOWN_SQUARE).unwrap().add_item(item);
        }
    }
    // Checked on round 10; spawned on turn 11; loots a round later.
    for _ in 0..10 {
        sim.tick();
    }
    assert!(sim.world().mobs_with_template(LOOT_GOBLIN).is_empty());
    sim.tick();
    let goblins = sim.world().mobs_with_template(LOOT_GOBLIN);
    assert_eq!(goblins.len(), 1);
    let goblin = Actor::Mob(goblins[0]);
    assert_eq!(sim.world().character(goblin).unwrap().room_id, TOWN_SQUARE);
    sim.tick();

    assert!(sim.world().rooms[&TOWN_SQUARE].items.is_empty());
    assert_eq!(sim.world().character(goblin).unwrap().backpack.len(), 2);
    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert!(msgs.iter().any(|m| m.contains("scurries in")));
    assert!(msgs.iter().any(|m| m.contains("scoops up everything")));

    // Only one goblin at a time.
    for _ in 0..10 {
        sim.tick();
    }
    assert_eq!(sim.world().mobs_with_template(LOOT_GOBLIN).len(), 1);
}

#[test]
fn quiet_rooms_do_not_attract_the_goblin() {
    let (mut sim, _rx) = simulation_with(starter_world(), one_turn_rounds());
    for _ in 0..25 {
        sim.tick();
    }
    assert!(sim.world().mobs_with_template(LOOT_GOBLIN).is_empty());
}

#[test]
fn buffs_expire_on_round_boundaries() {
    let (mut sim, mut rx) = simulation_with(starter_world(), one_turn_rounds());
    sim.queue()
        .queue_buff(Actor::System, ADA, BUFF_TANNERS_BLESSING, 0);
    sim.tick();
    assert!(sim
        .world()
        .user(PLAYER_USER)
        .unwrap()
        .character
        .buffs
        .iter()
        .any(|b| b.buff_id == BUFF_TANNERS_BLESSING));
    for _ in 0..15 {
        sim.tick();
    }
    assert!(sim.world().user(PLAYER_USER).unwrap().character.buffs.is_empty());
    let msgs = texts_for(&drain(&mut rx), PLAYER_USER);
    assert_eq!(
        msgs,
        vec![
            "A warm feeling settles over you.\n",
            "The tanner's blessing fades.\n"
        ]
    );
}

#[test]
fn autosave_writes_snapshots_off_the_tick() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saves").join("world.json");
    let mut cfg = one_turn_rounds();
    cfg.timing.rounds_per_autosave = 3;
    let (sim, _rx) = simulation_with(starter_world(), cfg);
    let mut sim = sim.with_saver(Box::new(JsonFileSaver::new(&path).unwrap()));

    sim.queue().queue_command(ADA, ADA, "give 5 gold to warden", 0);
    for _ in 0..3 {
        sim.tick();
    }
    assert_eq!(sim.stats().autosaves, 1);

    let report = sim.finish();
    assert!(report.final_save_ok);
    assert_eq!(report.stats.autosaves, 2);
    let saved = load_snapshot(&path).unwrap();
    assert_eq!(saved.user(PLAYER_USER).unwrap().character.gold, 35);
    assert_eq!(saved.users.len(), 2);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn config_changes_apply_at_the_next_round() {
    let shared = SharedConfig::new(test_config()).unwrap();
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let mut sim = Simulation::new(starter_world(), shared.clone(), tx);

    shared.set("RoundSeconds", "2", false).unwrap();
    sim.tick();
    assert_eq!(sim.timebase().turns_per_round(), 40);
    for _ in 0..39 {
        sim.tick();
    }
    assert_eq!(sim.timebase().turns_per_round(), 20);
}
