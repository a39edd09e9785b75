#![warn(missing_docs)]
#![doc = include_str!("../readme.md")]

pub mod clock;
pub mod context;
pub mod event;
pub mod handler;
pub mod log;
mod state;

pub use clock::{RunOutcome, SimulationClock};
pub use colored;
pub use context::{Id, SimulationContext};
pub use event::{ActionId, Tick};
pub use handler::{ActionFn, ListenerFn, ListenerId};
pub use state::EPSILON;
