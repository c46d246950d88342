//! Command handlers run by the scheduler, one queue entry at a time.
//!
//! Text payloads are split into a verb and its arguments and looked up in a
//! [`HandlerTable`]. Structured payloads (quest, buff, emote) go straight to
//! their handler. Handlers mutate the world through [`CommandContext`], write
//! output into its [`MessageQueue`], and request follow-up work by enqueuing
//! instead of calling each other directly.

pub mod buff;
pub mod emote;
pub mod gearup;
pub mod give;
pub mod quest;
pub mod spawn;

use std::collections::BTreeMap;

use super::errors::SimError;
use super::messages::MessageQueue;
use super::queue::{CommandPayload, CommandQueue};
use crate::config::{Config, TimeBase};
use crate::world::types::Actor;
use crate::world::World;

pub type HandlerResult = Result<(), SimError>;

/// Signature shared by every text command handler. `args` excludes the verb.
pub type CommandHandler = fn(&mut CommandContext<'_>, &str) -> HandlerResult;

/// Everything a handler may touch while it runs.
pub struct CommandContext<'a> {
    pub world: &'a mut World,
    pub queue: &'a CommandQueue,
    pub messages: &'a mut MessageQueue,
    pub config: &'a Config,
    pub timebase: TimeBase,
    /// Actor that caused the entry.
    pub source: Actor,
    /// Actor the command runs as.
    pub actor: Actor,
}

impl CommandContext<'_> {
    /// Reply to whoever should hear about problems with this command.
    pub fn reply(&mut self, text: &str) {
        let to = if self.source.is_system() {
            self.actor
        } else {
            self.source
        };
        self.messages.to_actor(to, text, true);
    }
}

/// Split `give sword to ada` into (`give`, `sword to ada`).
pub fn split_verb(text: &str) -> (String, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb.to_lowercase(), rest.trim()),
        None => (text.to_lowercase(), ""),
    }
}

#[derive(Clone)]
pub struct HandlerTable {
    handlers: BTreeMap<&'static str, CommandHandler>,
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Table with every built-in verb registered.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register("give", give::handle);
        table.register("trades", give::handle_trades);
        table.register("emote", emote::handle);
        table.register("gearup", gearup::handle);
        table.register("spawn", spawn::handle);
        table.register("loot", spawn::handle_loot);
        table
    }

    pub fn register(&mut self, verb: &'static str, handler: CommandHandler) {
        self.handlers.insert(verb, handler);
    }

    pub fn verbs(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    pub fn get(&self, verb: &str) -> Option<CommandHandler> {
        self.handlers.get(verb).copied()
    }

    pub fn dispatch(&self, ctx: &mut CommandContext<'_>, payload: &CommandPayload) -> HandlerResult {
        match payload {
            CommandPayload::Command(text) => {
                let (verb, args) = split_verb(text);
                if verb.is_empty() {
                    return Ok(());
                }
                match self.get(&verb) {
                    Some(handler) => handler(ctx, args),
                    None => {
                        ctx.reply(&format!("Unknown command: {}", verb));
                        Ok(())
                    }
                }
            }
            CommandPayload::Quest(token) => quest::trigger(ctx, token),
            CommandPayload::Buff(buff_id) => buff::apply(ctx, *buff_id),
            CommandPayload::Emote(text) => emote::narrate(ctx, text),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::sim::clock::TurnClock;

    /// Owns what a [`CommandContext`] borrows so handler tests stay short.
    pub struct Harness {
        pub world: World,
        pub queue: CommandQueue,
        pub messages: MessageQueue,
        pub config: Config,
    }

    impl Harness {
        pub fn new(world: World) -> Self {
            Self {
                world,
                queue: CommandQueue::new(TurnClock::new()),
                messages: MessageQueue::new(),
                config: Config::default(),
            }
        }

        pub fn run(&mut self, actor: Actor, text: &str) -> HandlerResult {
            self.run_payload(actor, actor, CommandPayload::Command(text.to_string()))
        }

        pub fn run_payload(
            &mut self,
            source: Actor,
            actor: Actor,
            payload: CommandPayload,
        ) -> HandlerResult {
            let timebase = self.config.timebase();
            let mut ctx = CommandContext {
                world: &mut self.world,
                queue: &self.queue,
                messages: &mut self.messages,
                config: &self.config,
                timebase,
                source,
                actor,
            };
            HandlerTable::standard().dispatch(&mut ctx, &payload)
        }

        /// Drain everything handlers queued, as (target, payload) pairs.
        pub fn queued(&self) -> Vec<(Actor, CommandPayload)> {
            self.queue
                .drain_due(u64::MAX)
                .into_iter()
                .map(|e| (e.target, e.payload))
                .collect()
        }
    }
}
