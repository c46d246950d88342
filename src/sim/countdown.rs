//! Cooperative shutdown countdown owned by the scheduler.
//!
//! The countdown advances once per turn from inside `tick()`, after the
//! drain batch, so it can never interrupt a handler. Announcements thin out
//! as the deadline approaches from far away: every 30 s above a minute,
//! every 15 s above 15 s, every 5 s below, plus one at the start.

/// Whether `remaining` seconds (out of `total`) gets a broadcast.
pub fn should_announce(remaining: u64, total: u64) -> bool {
    if remaining == total {
        return true;
    }
    if remaining > 60 {
        remaining % 30 == 0
    } else if remaining > 15 {
        remaining % 15 == 0
    } else {
        remaining % 5 == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownStep {
    /// Nothing to say this turn.
    Quiet,
    Announce(u64),
    Expired,
}

#[derive(Debug, Clone)]
pub struct ShutdownCountdown {
    total: u64,
    remaining: u64,
    turns_per_second: u64,
    turns_into_second: u64,
    announced_start: bool,
}

impl ShutdownCountdown {
    pub fn new(seconds: u64, turns_per_second: u64) -> Self {
        Self {
            total: seconds,
            remaining: seconds,
            turns_per_second: turns_per_second.max(1),
            turns_into_second: 0,
            announced_start: false,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Advance one turn.
    pub fn step(&mut self) -> CountdownStep {
        if !self.announced_start {
            self.announced_start = true;
            if self.remaining == 0 {
                return CountdownStep::Expired;
            }
            return CountdownStep::Announce(self.remaining);
        }
        if self.remaining == 0 {
            return CountdownStep::Expired;
        }
        self.turns_into_second += 1;
        if self.turns_into_second < self.turns_per_second {
            return CountdownStep::Quiet;
        }
        self.turns_into_second = 0;
        self.remaining -= 1;
        if self.remaining == 0 {
            CountdownStep::Expired
        } else if should_announce(self.remaining, self.total) {
            CountdownStep::Announce(self.remaining)
        } else {
            CountdownStep::Quiet
        }
    }
}

pub fn announcement(remaining: u64) -> String {
    format!(
        "*** The world will shut down in {} second{}. ***",
        remaining,
        if remaining == 1 { "" } else { "s" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(seconds: u64, tps: u64) -> (Vec<u64>, u64) {
        let mut c = ShutdownCountdown::new(seconds, tps);
        let mut announced = Vec::new();
        let mut turns = 0;
        loop {
            turns += 1;
            match c.step() {
                CountdownStep::Quiet => {}
                CountdownStep::Announce(s) => announced.push(s),
                CountdownStep::Expired => break,
            }
            assert!(turns < 1_000_000);
        }
        (announced, turns)
    }

    #[test]
    fn twenty_seconds_announces_four_times() {
        let (announced, turns) = run(20, 10);
        assert_eq!(announced, vec![20, 15, 10, 5]);
        assert_eq!(turns, 201);
    }

    #[test]
    fn long_countdowns_thin_out() {
        let (announced, _) = run(125, 1);
        assert_eq!(announced, vec![125, 120, 90, 60, 45, 30, 15, 10, 5]);
    }

    #[test]
    fn rule_table() {
        assert!(should_announce(17, 17));
        assert!(!should_announce(19, 20));
        assert!(should_announce(45, 100));
        assert!(!should_announce(50, 100));
        assert!(should_announce(90, 100));
        assert!(!should_announce(75, 100));
        assert!(should_announce(5, 100));
        assert!(!should_announce(4, 100));
    }

    #[test]
    fn zero_expires_immediately() {
        let mut c = ShutdownCountdown::new(0, 10);
        assert_eq!(c.step(), CountdownStep::Expired);
    }
}
