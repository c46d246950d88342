//! # mudcore - simulation core for a multi-user text world
//!
//! mudcore turns asynchronous player and NPC input into ordered mutations of a
//! shared world, and drives autonomous world behaviour (NPC trades, loot
//! goblin spawns, buff expiry, autosave) on a fixed cadence that does not
//! depend on any single connection.
//!
//! ## Features
//!
//! - **Command Queue**: the single, FIFO path through which every world
//!   mutation is requested, with per-entry delays in turns.
//! - **Round Scheduler**: a turn/round tick loop that dispatches due commands
//!   one at a time, isolating failures and panics per command.
//! - **NPC Trades**: multi-step barter contracts that track partial
//!   deliveries per player and pay out exactly once.
//! - **Response Aggregation**: handler output is collected and flushed only
//!   after the handler succeeds.
//! - **Cooperative Shutdown**: an announced countdown owned by the scheduler.
//! - **Runtime Configuration**: typed settings with locked keys and safe reload.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mudcore::config::SharedConfig;
//! use mudcore::sim::{start_simulation, Simulation};
//! use mudcore::world::seed::starter_world;
//! use mudcore::world::types::Actor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SharedConfig::load("config.toml").await?;
//!     let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
//!     let sim = Simulation::new(starter_world(), config, tx);
//!     let (handle, done) = start_simulation(sim);
//!
//!     handle.queue().queue_command(Actor::User(2), Actor::User(2), "emote waves.", 0);
//!     handle.shutdown(Some(5)).await;
//!     done.await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - settings, derived timebase, typed runtime keys
//! - [`sim`] - queue, scheduler, handlers, trades, message aggregation
//! - [`world`] - rooms, characters, items, buffs and the autosave sink
//! - [`admin`] - privileged `/` commands
//! - [`roles`] - privilege levels
//! - [`logutil`] - log sanitizing
//!
//! ## Architecture
//!
//! ```text
//! sessions / timers ──enqueue──► CommandQueue
//!                                     │ drain_due(turn)
//!                                     ▼
//!                              Round Scheduler ──► handler ──► World
//!                                     │               │
//!                                     │          MessageQueue
//!                                     ▼               │ flush on Ok
//!                              round hooks        Outbound channel
//! ```

pub mod admin;
pub mod config;
pub mod logutil;
pub mod roles;
pub mod sim;
pub mod world;
