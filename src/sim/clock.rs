use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-lifetime turn and round counters.
///
/// Only the scheduler advances the clock; queue handles read it to stamp
/// entries with their issue turn.
#[derive(Debug, Clone, Default)]
pub struct TurnClock {
    turn: Arc<AtomicU64>,
    round: Arc<AtomicU64>,
}

impl TurnClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turn(&self) -> u64 {
        self.turn.load(Ordering::Acquire)
    }

    pub fn round(&self) -> u64 {
        self.round.load(Ordering::Acquire)
    }

    /// Step one turn forward and return the new turn number.
    pub fn advance_turn(&self) -> u64 {
        self.turn.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Close a round and return the new round number.
    pub fn complete_round(&self) -> u64 {
        self.round.fetch_add(1, Ordering::AcqRel) + 1
    }
}
