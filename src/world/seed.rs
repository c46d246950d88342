//! A small canonical world used by the binary and the test suite.

use super::buffs::{BuffFlag, BuffSpec};
use super::characters::{Character, MobTemplate, User};
use super::items::{EquipSlot, ItemSpec};
use super::rooms::Room;
use super::types::{MobTemplateId, RoomId, UserId};
use super::{QuestSpec, World};
use crate::roles::LEVEL_ADMIN;
use crate::sim::trade::{TradeOffer, TradePrize};

pub const TOWN_SQUARE: RoomId = 1;
pub const TANNERY: RoomId = 2;
pub const HIDDEN_GROVE: RoomId = 3;
pub const GOBLIN_WARREN: RoomId = 139;

pub const RUSTY_SWORD: u32 = 1;
pub const LEATHER_CAP: u32 = 2;
pub const WOLF_PELT: u32 = 500;
pub const TANNED_CLOAK: u32 = 501;
pub const MAP_FRAGMENT: u32 = 502;

pub const BUFF_HIDDEN: u32 = 1;
pub const BUFF_TANNERS_BLESSING: u32 = 2;

pub const TANNER: MobTemplateId = 10;
pub const LOOT_GOBLIN: MobTemplateId = 52;

pub const ADMIN_USER: UserId = 1;
pub const PLAYER_USER: UserId = 2;

/// Build the starter world.
///
/// The tanner in the tannery takes two wolf pelts and 10 gold for a tanned
/// cloak, a blessing and the start of "The Lost Map".
pub fn starter_world() -> World {
    let mut world = World::new();

    world.add_room(Room::new(TOWN_SQUARE, "Town Square", "town"));
    world.add_room(Room::new(TANNERY, "The Tannery", "town"));
    world.add_room(Room::new(HIDDEN_GROVE, "Hidden Grove", "forest"));
    world.add_room(Room::new(GOBLIN_WARREN, "Goblin Warren", "caves"));

    world.items.insert(
        ItemSpec::new(RUSTY_SWORD, "rusty sword")
            .with_value(20)
            .with_damage_bonus(1)
            .with_slot(EquipSlot::Weapon),
    );
    world.items.insert(
        ItemSpec::new(LEATHER_CAP, "leather cap")
            .with_value(8)
            .with_slot(EquipSlot::Head),
    );
    world.items.insert(ItemSpec::new(WOLF_PELT, "wolf pelt").with_value(5));
    world.items.insert(
        ItemSpec::new(TANNED_CLOAK, "tanned cloak")
            .with_value(60)
            .with_slot(EquipSlot::Body),
    );
    world.items.insert(
        ItemSpec::new(MAP_FRAGMENT, "map fragment")
            .with_value(1)
            .with_quest_token("1-fragment"),
    );

    world.buffs.insert(
        BUFF_HIDDEN,
        BuffSpec::new(BUFF_HIDDEN, "hidden", 0)
            .with_flag(BuffFlag::Hidden)
            .with_messages("You slip into the shadows.", "You step out of the shadows."),
    );
    world.buffs.insert(
        BUFF_TANNERS_BLESSING,
        BuffSpec::new(BUFF_TANNERS_BLESSING, "tanner's blessing", 10)
            .with_flag(BuffFlag::Blessed)
            .with_messages(
                "A warm feeling settles over you.",
                "The tanner's blessing fades.",
            ),
    );

    world.quests.insert(1, QuestSpec::new(1, "The Lost Map"));

    let cloak_trade = TradeOffer::new(
        vec![WOLF_PELT, WOLF_PELT],
        10,
        TradePrize {
            item_ids: vec![TANNED_CLOAK],
            buff_ids: vec![BUFF_TANNERS_BLESSING],
            quest_ids: vec!["1-start".to_string()],
            commands: vec!["emote nods approvingly.".to_string()],
            ..Default::default()
        },
    );
    let grove_trade = TradeOffer::new(
        vec![MAP_FRAGMENT],
        0,
        TradePrize {
            room_id: Some(HIDDEN_GROVE),
            ..Default::default()
        },
    );
    let mut tanner = MobTemplate::new(TANNER, "the tanner")
        .with_trade(cloak_trade)
        .with_trade(grove_trade);
    tanner.gold = 25;
    tanner.items = vec![TANNED_CLOAK];
    world.mob_templates.insert(TANNER, tanner);

    let mut goblin = MobTemplate::new(LOOT_GOBLIN, "a loot goblin");
    goblin.gold = 5;
    world.mob_templates.insert(LOOT_GOBLIN, goblin);

    let mut warden = Character::new("Warden", TOWN_SQUARE);
    warden.gold = 500;
    let mut ada = Character::new("Ada", TOWN_SQUARE);
    ada.gold = 40;
    for id in [WOLF_PELT, WOLF_PELT, MAP_FRAGMENT, LEATHER_CAP] {
        if let Some(item) = world.items.new_item(id) {
            ada.store_item(item);
        }
    }

    let users = [
        User::new(ADMIN_USER, "admin", warden).with_role(LEVEL_ADMIN),
        User::new(PLAYER_USER, "ada", ada),
    ];
    for user in users {
        if let Err(e) = world.add_user(user) {
            log::warn!("starter world: {}", e);
        }
    }
    if let Err(e) = world.spawn_mob(TANNER, TANNERY) {
        log::warn!("starter world: {}", e);
    }

    world
}
