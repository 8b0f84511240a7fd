//! Core identifier and lifecycle types for the clock.
//!
//! These types identify jobs, describe where a job is in its lifecycle,
//! and record individual firings.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Source of job identifiers, shared by every clock in the process.
static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a job.
///
/// Identifiers are assigned in creation order and are never reused while
/// the process runs, so they double as a stable tie-breaker between jobs
/// that share a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// Allocate the next identifier.
    pub(crate) fn next() -> Self {
        Self(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the underlying numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for its deadline.
    Pending,
    /// Being dispatched; will return to `Pending` if it repeats.
    Firing,
    /// Finished or cancelled. Terminal.
    Retired,
}

impl JobState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::Firing => 1,
            JobState::Retired => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Pending,
            1 => JobState::Firing,
            _ => JobState::Retired,
        }
    }
}

/// A single firing of a job, as delivered on its notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    /// The job that fired.
    pub job_id: JobId,
    /// 1-based firing number for this job.
    pub sequence: u64,
    /// The deadline the job was scheduled for.
    pub scheduled_at: Instant,
    /// When the dispatch loop actually fired it.
    pub fired_at: Instant,
}

impl Firing {
    /// How late the firing was relative to its deadline.
    pub fn lateness(&self) -> Duration {
        self.fired_at.saturating_duration_since(self.scheduled_at)
    }
}
