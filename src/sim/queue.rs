//! The command queue: the only path by which world mutations are requested.
//!
//! Producers (console/network sessions, timers, command handlers) append
//! entries through cheap [`CommandQueue`] clones. The scheduler drains the
//! entries that are due at the current turn and dispatches them one by one.
//!
//! * Enqueue never fails and never blocks for long (one short mutex section).
//! * `due_turn = now + delay`. A delay of 0 lands in the next drain, not the
//!   one in progress, because a drain takes its whole batch under the lock
//!   before any handler runs.
//! * Drain order is enqueue order among due entries. A later entry with an
//!   earlier due turn never jumps an earlier entry that is also due.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

use super::clock::TurnClock;
use crate::world::types::{Actor, BuffId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandPayload {
    /// Free text, parsed by the handler table at dispatch.
    Command(String),
    /// Quest progress token to record on the target.
    Quest(String),
    /// Buff to apply to the target.
    Buff(BuffId),
    /// Narration shown to the target's room as-is.
    Emote(String),
}

impl CommandPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            CommandPayload::Command(_) => "command",
            CommandPayload::Quest(_) => "quest",
            CommandPayload::Buff(_) => "buff",
            CommandPayload::Emote(_) => "emote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    pub seq: u64,
    /// Who caused the entry.
    pub source: Actor,
    /// Who the payload executes as or applies to.
    pub target: Actor,
    pub payload: CommandPayload,
    pub issued_turn: u64,
    pub due_turn: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub enqueued_total: u64,
    pub drained_total: u64,
}

#[derive(Debug, Default)]
struct QueueInner {
    entries: Vec<CommandEntry>,
    next_seq: u64,
    enqueued_total: u64,
    drained_total: u64,
}

#[derive(Debug, Clone)]
pub struct CommandQueue {
    inner: Arc<Mutex<QueueInner>>,
    clock: TurnClock,
}

impl CommandQueue {
    pub fn new(clock: TurnClock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner::default())),
            clock,
        }
    }

    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    /// Append an entry due `delay_turns` after the current turn. Returns its sequence number.
    pub fn enqueue(
        &self,
        source: Actor,
        target: Actor,
        payload: CommandPayload,
        delay_turns: u64,
    ) -> u64 {
        let now = self.clock.turn();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.enqueued_total += 1;
        inner.entries.push(CommandEntry {
            seq,
            source,
            target,
            payload,
            issued_turn: now,
            due_turn: now.saturating_add(delay_turns),
        });
        seq
    }

    pub fn queue_command(&self, source: Actor, target: Actor, text: &str, delay_turns: u64) -> u64 {
        self.enqueue(
            source,
            target,
            CommandPayload::Command(text.to_string()),
            delay_turns,
        )
    }

    pub fn queue_quest(&self, source: Actor, target: Actor, token: &str, delay_turns: u64) -> u64 {
        self.enqueue(
            source,
            target,
            CommandPayload::Quest(token.to_string()),
            delay_turns,
        )
    }

    pub fn queue_buff(&self, source: Actor, target: Actor, buff_id: BuffId, delay_turns: u64) -> u64 {
        self.enqueue(source, target, CommandPayload::Buff(buff_id), delay_turns)
    }

    pub fn queue_emote(&self, source: Actor, target: Actor, text: &str, delay_turns: u64) -> u64 {
        self.enqueue(
            source,
            target,
            CommandPayload::Emote(text.to_string()),
            delay_turns,
        )
    }

    /// Remove and return every entry due at or before `current_turn`, in enqueue order.
    pub fn drain_due(&self, current_turn: u64) -> Vec<CommandEntry> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (due, pending): (Vec<_>, Vec<_>) = inner
            .entries
            .drain(..)
            .partition(|e| e.due_turn <= current_turn);
        inner.entries = pending;
        inner.drained_total += due.len() as u64;
        due
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        QueueStats {
            pending: inner.entries.len(),
            enqueued_total: inner.enqueued_total,
            drained_total: inner.drained_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(entries: &[CommandEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| match &e.payload {
                CommandPayload::Command(t) | CommandPayload::Emote(t) | CommandPayload::Quest(t) => {
                    t.clone()
                }
                CommandPayload::Buff(id) => id.to_string(),
            })
            .collect()
    }

    #[test]
    fn drain_keeps_enqueue_order_among_due() {
        let clock = TurnClock::new();
        let q = CommandQueue::new(clock.clone());
        q.queue_command(Actor::System, Actor::User(1), "late", 5);
        q.queue_command(Actor::System, Actor::User(1), "a", 2);
        q.queue_command(Actor::System, Actor::User(1), "b", 0);
        q.queue_command(Actor::System, Actor::User(1), "c", 2);

        assert_eq!(texts(&q.drain_due(0)), vec!["b"]);
        assert_eq!(q.len(), 3);
        assert_eq!(texts(&q.drain_due(4)), vec!["a", "c"]);
        assert_eq!(texts(&q.drain_due(4)), Vec::<String>::new());
        assert_eq!(texts(&q.drain_due(5)), vec!["late"]);
        assert!(q.is_empty());
    }

    #[test]
    fn entries_are_stamped_from_clock() {
        let clock = TurnClock::new();
        let q = CommandQueue::new(clock.clone());
        clock.advance_turn();
        clock.advance_turn();
        q.queue_buff(Actor::Mob(3), Actor::User(1), 7, 3);
        let e = q.drain_due(5).pop().unwrap();
        assert_eq!(e.issued_turn, 2);
        assert_eq!(e.due_turn, 5);
        assert_eq!(e.payload, CommandPayload::Buff(7));
        assert_eq!(e.source, Actor::Mob(3));
    }

    #[test]
    fn stats_track_totals() {
        let q = CommandQueue::new(TurnClock::new());
        q.queue_emote(Actor::System, Actor::Mob(1), "waves.", 0);
        q.queue_quest(Actor::System, Actor::User(1), "1-start", 10);
        q.drain_due(0);
        assert_eq!(
            q.stats(),
            QueueStats {
                pending: 1,
                enqueued_total: 2,
                drained_total: 1
            }
        );
    }

    #[test]
    fn clones_share_buffer() {
        let q = CommandQueue::new(TurnClock::new());
        let producer = q.clone();
        let seq_a = producer.queue_command(Actor::User(2), Actor::User(2), "look", 0);
        let seq_b = q.queue_command(Actor::User(3), Actor::User(3), "look", 0);
        assert!(seq_b > seq_a);
        assert_eq!(q.drain_due(0).len(), 2);
    }
}
