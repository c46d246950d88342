//! The simulation core: turn clock, command queue, handlers, negotiation,
//! output aggregation and the round scheduler that drives them.

pub mod clock;
pub mod countdown;
pub mod errors;
pub mod handlers;
pub mod messages;
pub mod queue;
pub mod scheduler;
pub mod trade;

pub use clock::TurnClock;
pub use errors::SimError;
pub use messages::{MessageQueue, Outbound};
pub use queue::{CommandEntry, CommandPayload, CommandQueue};
pub use scheduler::{
    start_simulation, ShutdownReport, Simulation, SimulationHandle, SimulationStats, TickOutcome,
};
