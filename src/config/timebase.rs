//! Derived tick constants.
//!
//! A [`TimeBase`] is computed from the raw timing settings exactly once per
//! validation pass and then only read. Everything that needs to convert wall
//! clock durations into turns or rounds goes through it.
//!
//! Divisions that produce turn counts use integer floor division:
//! `turns_per_round = round_seconds * 1000 / turn_milliseconds`. With a turn
//! duration that does not divide a second evenly the remainder is dropped, so a
//! "round" can be slightly shorter than `round_seconds` of wall time.
//! Conversions from minutes/seconds into turns or rounds round *up* so a
//! requested delay is never shortened.

use serde::{Deserialize, Serialize};

/// Smallest accepted turn duration.
pub const MIN_TURN_MILLISECONDS: u64 = 10;
/// Smallest accepted round length.
pub const MIN_ROUND_SECONDS: u64 = 1;

pub const DEFAULT_TURN_MILLISECONDS: u64 = 100;
pub const DEFAULT_ROUND_SECONDS: u64 = 4;
/// 15 minutes worth of 4 second rounds.
pub const DEFAULT_ROUNDS_PER_AUTOSAVE: u64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBase {
    pub turn_milliseconds: u64,
    pub round_seconds: u64,
    pub rounds_per_autosave: u64,
    turns_per_round: u64,
    turns_per_autosave: u64,
    turns_per_second: u64,
    rounds_per_minute: f64,
}

impl TimeBase {
    /// Compute the cached constants. Callers validate the inputs first; zero
    /// values are clamped to the minimums so the divisions stay defined.
    pub fn new(turn_milliseconds: u64, round_seconds: u64, rounds_per_autosave: u64) -> Self {
        let turn_milliseconds = turn_milliseconds.max(MIN_TURN_MILLISECONDS);
        let round_seconds = round_seconds.max(MIN_ROUND_SECONDS);
        let rounds_per_autosave = rounds_per_autosave.max(1);

        // A turn longer than a round still yields one turn per round.
        let turns_per_round = ((round_seconds * 1000) / turn_milliseconds).max(1);

        Self {
            turn_milliseconds,
            round_seconds,
            rounds_per_autosave,
            turns_per_round,
            turns_per_autosave: rounds_per_autosave * turns_per_round,
            turns_per_second: (1000 / turn_milliseconds).max(1),
            rounds_per_minute: 60.0 / round_seconds as f64,
        }
    }

    pub fn turns_per_round(&self) -> u64 {
        self.turns_per_round
    }

    pub fn turns_per_autosave(&self) -> u64 {
        self.turns_per_autosave
    }

    pub fn turns_per_second(&self) -> u64 {
        self.turns_per_second
    }

    pub fn rounds_per_minute(&self) -> f64 {
        self.rounds_per_minute
    }

    pub fn turn_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.turn_milliseconds)
    }

    pub fn minutes_to_rounds(&self, minutes: u64) -> u64 {
        (self.rounds_per_minute * minutes as f64).ceil() as u64
    }

    pub fn seconds_to_rounds(&self, seconds: u64) -> u64 {
        seconds.div_ceil(self.round_seconds)
    }

    pub fn minutes_to_turns(&self, minutes: u64) -> u64 {
        (minutes * 60 * 1000).div_ceil(self.turn_milliseconds)
    }

    pub fn seconds_to_turns(&self, seconds: u64) -> u64 {
        (seconds * 1000).div_ceil(self.turn_milliseconds)
    }

    pub fn rounds_to_turns(&self, rounds: u64) -> u64 {
        rounds * self.turns_per_round
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(
            DEFAULT_TURN_MILLISECONDS,
            DEFAULT_ROUND_SECONDS,
            DEFAULT_ROUNDS_PER_AUTOSAVE,
        )
    }
}
