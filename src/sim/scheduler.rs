//! Round scheduler and its async runner.
//!
//! [`Simulation::tick`] is the only place world state changes. Each tick:
//!
//! 1. advances the turn counter,
//! 2. drains due queue entries and dispatches them one at a time, each in
//!    isolation (errors and panics are logged, counted and skipped),
//! 3. on a round boundary runs the round hooks in fixed order: autosave,
//!    world events (loot goblin check, buff expiry), round logging,
//! 4. advances a pending shutdown countdown.
//!
//! [`start_simulation`] drives `tick` from a `tokio::time::interval` and
//! serves control requests (shutdown, `/where`, stats, reload) over a
//! channel between ticks, so control never races a handler.

use log::{debug, error, info, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::clock::TurnClock;
use super::countdown::{announcement, CountdownStep, ShutdownCountdown};
use super::handlers::{CommandContext, HandlerTable};
use super::messages::{MessageQueue, Outbound};
use super::queue::{CommandEntry, CommandPayload, CommandQueue};
use crate::admin::{where_entries, WhereEntry};
use crate::config::{Config, SharedConfig, TimeBase};
use crate::logutil::escape_log;
use crate::world::saver::{NullSaver, WorldSaver};
use crate::world::types::Actor;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Terminate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub turn: u64,
    pub round: u64,
    pub queued: usize,
    pub dispatched_total: u64,
    pub failed_total: u64,
    pub panicked_total: u64,
    pub autosaves: u64,
}

/// Returned by the runner once the simulation has stopped.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub stats: SimulationStats,
    pub final_save_ok: bool,
}

pub struct Simulation {
    world: World,
    queue: CommandQueue,
    clock: TurnClock,
    config: SharedConfig,
    settings: Config,
    settings_version: u64,
    timebase: TimeBase,
    handlers: HandlerTable,
    outbound: mpsc::UnboundedSender<Outbound>,
    saver: Box<dyn WorldSaver>,
    countdown: Option<ShutdownCountdown>,
    stats: SimulationStats,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn describe(entry: &CommandEntry) -> String {
    match &entry.payload {
        CommandPayload::Command(text) | CommandPayload::Emote(text) => {
            format!("{} '{}'", entry.payload.kind(), escape_log(text))
        }
        CommandPayload::Quest(token) => format!("quest '{}'", escape_log(token)),
        CommandPayload::Buff(id) => format!("buff {}", id),
    }
}

impl Simulation {
    pub fn new(world: World, config: SharedConfig, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        let clock = TurnClock::new();
        let settings_version = config.version();
        let settings = config.snapshot();
        let timebase = settings.timebase();
        Self {
            world,
            queue: CommandQueue::new(clock.clone()),
            clock,
            config,
            settings,
            settings_version,
            timebase,
            handlers: HandlerTable::standard(),
            outbound,
            saver: Box::new(NullSaver),
            countdown: None,
            stats: SimulationStats::default(),
        }
    }

    pub fn with_saver(mut self, saver: Box<dyn WorldSaver>) -> Self {
        self.saver = saver;
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    /// A producer handle onto the command queue.
    pub fn queue(&self) -> CommandQueue {
        self.queue.clone()
    }

    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn timebase(&self) -> TimeBase {
        self.timebase
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            turn: self.clock.turn(),
            round: self.clock.round(),
            queued: self.queue.len(),
            ..self.stats.clone()
        }
    }

    /// Pick up the current shared configuration.
    pub fn refresh_config(&mut self) -> TimeBase {
        // Read the version first so a change racing the snapshot is picked up next time.
        self.settings_version = self.config.version();
        self.settings = self.config.snapshot();
        let timebase = self.settings.timebase();
        if timebase != self.timebase {
            info!(
                "timebase changed: {}ms turns, {} turns/round",
                timebase.turn_milliseconds,
                timebase.turns_per_round()
            );
        }
        self.timebase = timebase;
        timebase
    }

    /// Start (or restart) the shutdown countdown. `None` uses the configured default.
    pub fn request_shutdown(&mut self, seconds: Option<u64>) -> u64 {
        let seconds = seconds.unwrap_or(self.settings.admin.shutdown_default_seconds);
        if self.countdown.is_some() {
            info!("shutdown countdown restarted at {}s", seconds);
        } else {
            info!("shutdown requested in {}s", seconds);
        }
        self.countdown = Some(ShutdownCountdown::new(
            seconds,
            self.timebase.turns_per_second(),
        ));
        seconds
    }

    pub fn cancel_shutdown(&mut self) -> bool {
        if self.countdown.take().is_some() {
            info!("shutdown cancelled");
            self.send(Outbound::Broadcast {
                text: "*** Shutdown cancelled. ***\n".to_string(),
            });
            true
        } else {
            false
        }
    }

    pub fn shutdown_remaining(&self) -> Option<u64> {
        self.countdown.as_ref().map(|c| c.remaining())
    }

    fn send(&self, out: Outbound) {
        if self.outbound.send(out).is_err() {
            debug!("outbound channel closed; dropping message");
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        let turn = self.clock.advance_turn();

        for entry in self.queue.drain_due(turn) {
            self.dispatch(entry);
        }

        if turn % self.timebase.turns_per_round() == 0 {
            let round = self.clock.complete_round();
            self.run_round_hooks(round);
        }

        self.advance_countdown()
    }

    fn dispatch(&mut self, entry: CommandEntry) {
        let mut messages = MessageQueue::new();
        let result = {
            let mut ctx = CommandContext {
                world: &mut self.world,
                queue: &self.queue,
                messages: &mut messages,
                config: &self.settings,
                timebase: self.timebase,
                source: entry.source,
                actor: entry.target,
            };
            let handlers = &self.handlers;
            panic::catch_unwind(AssertUnwindSafe(|| handlers.dispatch(&mut ctx, &entry.payload)))
        };
        match result {
            Ok(Ok(())) => {
                self.stats.dispatched_total += 1;
                messages.flush(&self.world, &self.outbound);
            }
            Ok(Err(e)) => {
                self.stats.failed_total += 1;
                warn!(
                    "dropping {} from {} as {} (seq {}): {}",
                    describe(&entry),
                    entry.source,
                    entry.target,
                    entry.seq,
                    e
                );
            }
            Err(payload) => {
                self.stats.panicked_total += 1;
                error!(
                    "handler panicked on {} from {} as {} (seq {}): {}",
                    describe(&entry),
                    entry.source,
                    entry.target,
                    entry.seq,
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    fn run_round_hooks(&mut self, round: u64) {
        // Settings changed through SharedConfig take effect at round boundaries.
        if self.config.version() != self.settings_version {
            self.refresh_config();
        }

        if round % self.timebase.rounds_per_autosave == 0 {
            self.autosave();
        }

        let goblin_every = self.settings.world.loot_goblin_round_count;
        if goblin_every > 0 && round % goblin_every == 0 {
            self.check_loot_goblin();
        }
        self.expire_buffs();

        let interval = self.settings.world.log_interval_round_count;
        if interval > 0 && round % interval == 0 {
            info!("round {}", round);
            let s = self.stats();
            debug!(
                "simulation stats: turn={} round={} queued={} dispatched_total={} failed_total={} panicked_total={} autosaves={}",
                s.turn, s.round, s.queued, s.dispatched_total, s.failed_total, s.panicked_total, s.autosaves
            );
        }
    }

    fn check_loot_goblin(&mut self) {
        let world_cfg = &self.settings.world;
        if !self
            .world
            .mobs_with_template(world_cfg.loot_goblin_mob_id)
            .is_empty()
        {
            return;
        }
        let eligible = self.world.rooms.values().any(|r| {
            r.attracts_loot_goblin(
                world_cfg.loot_goblin_minimum_items,
                world_cfg.loot_goblin_minimum_gold,
            )
        });
        if eligible {
            debug!("loot goblin eligible; queueing spawn");
            self.queue
                .queue_command(Actor::System, Actor::System, "spawn loot goblin", 0);
        }
    }

    fn expire_buffs(&mut self) {
        let expired = self.world.expire_buffs();
        if expired.is_empty() {
            return;
        }
        let mut messages = MessageQueue::new();
        for (actor, buff) in expired {
            debug!("buff {} expired on {}", buff.name, actor);
            if let Some(text) = &buff.end_message {
                messages.to_actor(actor, text, true);
            }
        }
        messages.flush(&self.world, &self.outbound);
    }

    /// Hand a snapshot to the saver. Failures are logged, never fatal.
    pub fn autosave(&mut self) -> bool {
        match self.saver.save(&self.world) {
            Ok(()) => {
                self.stats.autosaves += 1;
                info!("autosave queued at round {}", self.clock.round());
                true
            }
            Err(e) => {
                warn!("autosave failed: {:#}", e);
                false
            }
        }
    }

    fn advance_countdown(&mut self) -> TickOutcome {
        let Some(countdown) = self.countdown.as_mut() else {
            return TickOutcome::Continue;
        };
        match countdown.step() {
            CountdownStep::Quiet => TickOutcome::Continue,
            CountdownStep::Announce(remaining) => {
                info!("shutdown in {}s", remaining);
                self.send(Outbound::Broadcast {
                    text: format!("{}\n", announcement(remaining)),
                });
                TickOutcome::Continue
            }
            CountdownStep::Expired => {
                info!("shutdown countdown expired at turn {}", self.clock.turn());
                self.countdown = None;
                TickOutcome::Terminate
            }
        }
    }

    /// Final autosave and writer flush.
    pub fn finish(&mut self) -> ShutdownReport {
        let final_save_ok = self.autosave();
        self.saver.finish();
        let stats = self.stats();
        info!(
            "simulation stopped at turn {} (round {}), {} commands dispatched",
            stats.turn, stats.round, stats.dispatched_total
        );
        ShutdownReport {
            stats,
            final_save_ok,
        }
    }
}

pub enum SimulationControl {
    /// Start or restart the countdown; `None` uses the configured default.
    Shutdown(Option<u64>, oneshot::Sender<u64>),
    CancelShutdown(oneshot::Sender<bool>),
    Where(oneshot::Sender<Vec<WhereEntry>>),
    Snapshot(oneshot::Sender<SimulationStats>),
    /// Adopt the shared config now instead of at the next round.
    Refresh(oneshot::Sender<TimeBase>),
}

#[derive(Clone, Debug)]
pub struct SimulationHandle {
    tx: mpsc::UnboundedSender<SimulationControl>,
    queue: CommandQueue,
    config: SharedConfig,
}

impl SimulationHandle {
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> SimulationControl) -> Option<T> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(make(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    /// Returns the countdown length actually used.
    pub async fn shutdown(&self, seconds: Option<u64>) -> Option<u64> {
        self.request(|tx| SimulationControl::Shutdown(seconds, tx)).await
    }

    pub async fn cancel_shutdown(&self) -> Option<bool> {
        self.request(SimulationControl::CancelShutdown).await
    }

    pub async fn where_online(&self) -> Option<Vec<WhereEntry>> {
        self.request(SimulationControl::Where).await
    }

    pub async fn snapshot(&self) -> Option<SimulationStats> {
        self.request(SimulationControl::Snapshot).await
    }

    /// Re-read the config file here, off the simulation task, then have the
    /// runner adopt it. A rejected file leaves the running settings alone.
    pub async fn reload(&self) -> Option<Result<TimeBase, String>> {
        if let Err(e) = self.config.reload().await {
            return Some(Err(e.to_string()));
        }
        self.request(SimulationControl::Refresh).await.map(Ok)
    }
}

fn new_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Run `sim` on the tokio runtime until its shutdown countdown expires.
pub fn start_simulation(sim: Simulation) -> (SimulationHandle, JoinHandle<ShutdownReport>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<SimulationControl>();
    let handle = SimulationHandle {
        tx,
        queue: sim.queue(),
        config: sim.config.clone(),
    };

    let join = tokio::spawn(async move {
        let mut sim = sim;
        let mut period = sim.timebase().turn_duration();
        let mut ticker = new_ticker(period);
        info!(
            "simulation started: {}ms turns, {} turns/round",
            period.as_millis(),
            sim.timebase().turns_per_round()
        );
        loop {
            tokio::select! {
                Some(cmd) = rx.recv() => {
                    match cmd {
                        SimulationControl::Shutdown(seconds, resp) => {
                            let used = sim.request_shutdown(seconds);
                            let _ = resp.send(used);
                        }
                        SimulationControl::CancelShutdown(resp) => {
                            let _ = resp.send(sim.cancel_shutdown());
                        }
                        SimulationControl::Where(resp) => {
                            let _ = resp.send(where_entries(sim.world()));
                        }
                        SimulationControl::Snapshot(resp) => {
                            let _ = resp.send(sim.stats());
                        }
                        SimulationControl::Refresh(resp) => {
                            let _ = resp.send(sim.refresh_config());
                        }
                    }
                }
                _ = ticker.tick() => {
                    if sim.tick() == TickOutcome::Terminate {
                        break;
                    }
                }
            }
            let wanted = sim.timebase().turn_duration();
            if wanted != period {
                period = wanted;
                ticker = new_ticker(period);
            }
        }
        sim.finish()
    });

    (handle, join)
}
