//! The clock: job registration, cancellation and the dispatch loop.
//!
//! Jobs wait in a deadline-ordered queue. A single background task per
//! clock fires them as their deadlines pass and re-queues repeating jobs.

mod dispatch;
mod engine;
mod types;
mod wait;

pub use engine::Clock;
pub use types::{ClockError, ClockStats};
