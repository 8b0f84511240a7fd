//! Clock type definitions.
//!
//! This module contains the error type and the statistics snapshot for the clock.

use thiserror::Error;

/// Errors that can occur when scheduling or stopping jobs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// The interval was zero.
    #[error("interval must be greater than zero")]
    InvalidInterval,

    /// The first deadline does not fit on the monotonic clock.
    #[error("interval too large to schedule")]
    IntervalOverflow,

    /// The clock has been shut down.
    #[error("clock is stopped")]
    Stopped,

    /// Shutdown gave up waiting for running callbacks.
    #[error("shutdown timed out with {0} callback(s) still running")]
    ShutdownTimeout(usize),
}

/// Point-in-time counters for a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockStats {
    /// Jobs waiting for a deadline.
    pub pending: usize,
    /// Total firings since the clock was created.
    pub total_fired: u64,
    /// Callback invocations currently running.
    pub running_callbacks: usize,
}
