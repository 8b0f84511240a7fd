//! Core job model: identifiers, schedules, callbacks and notifications.

pub mod callback;
pub mod job;
pub mod notify;
pub mod schedule;
pub mod types;
