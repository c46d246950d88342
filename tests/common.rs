//! Shared fixtures for the integration tests.
#![allow(dead_code)] // each test binary uses a different subset

use mudcore::config::{Config, SharedConfig};
use mudcore::sim::{Outbound, Simulation};
use mudcore::world::seed::starter_world;
use mudcore::world::World;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Defaults with file logging off.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.logging.file = None;
    cfg
}

/// A simulation over `world` plus the receiving end of its outbound channel.
pub fn simulation_with(world: World, config: Config) -> (Simulation, UnboundedReceiver<Outbound>) {
    let shared = SharedConfig::new(config).expect("valid test config");
    let (tx, rx) = unbounded_channel();
    (Simulation::new(world, shared, tx), rx)
}

pub fn starter_simulation() -> (Simulation, UnboundedReceiver<Outbound>) {
    simulation_with(starter_world(), test_config())
}

/// Everything sent so far.
pub fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Texts sent to one user, in order.
pub fn texts_for(messages: &[Outbound], user_id: u32) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Outbound::ToUser { user_id: to, text } if *to == user_id => Some(text.clone()),
            _ => None,
        })
        .collect()
}

pub fn broadcasts(messages: &[Outbound]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Outbound::Broadcast { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}
