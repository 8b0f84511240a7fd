//! Jobs: the public handle and the record the clock keeps while a job waits.
//!
//! A job is split in three:
//! - [`JobCell`]: immutable identity plus atomically readable state, shared
//!   by everyone who references the job.
//! - [`Entry`]: the scheduling record owned by the wait queue while the job
//!   is pending. It holds the callback and the sending half of the
//!   notification slot; dropping it closes the notification stream.
//! - [`Job`]: the cheap, cloneable handle returned to callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use super::callback::Callback;
use super::notify::{self, Notifications, Slot};
use super::schedule::{Repeat, Schedule};
use super::types::{Firing, JobId, JobState};

/// Shared identity and state of a job.
#[derive(Debug)]
pub(crate) struct JobCell {
    id: JobId,
    schedule: Schedule,
    state: AtomicU8,
    fired: AtomicU64,
}

impl JobCell {
    pub(crate) fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// State transitions happen under the clock's lock; reads may happen anywhere.
    pub(crate) fn set_state(&self, state: JobState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn record_firing(&self) -> u64 {
        self.fired.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn fire_count(&self) -> u64 {
        self.fired.load(Ordering::Acquire)
    }
}

/// A job waiting in (or popped from) the wait queue.
#[derive(Debug)]
pub(crate) struct Entry {
    cell: Arc<JobCell>,
    deadline: Instant,
    /// Firings left, `None` when unbounded.
    remaining: Option<u64>,
    callback: Option<Callback>,
    slot: Slot,
}

impl Entry {
    pub(crate) fn id(&self) -> JobId {
        self.cell.id
    }

    pub(crate) fn cell(&self) -> &Arc<JobCell> {
        &self.cell
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Consume one firing from the budget.
    ///
    /// Returns `true` if the job must retire after this firing.
    pub(crate) fn take_firing(&mut self) -> bool {
        match self.remaining.as_mut() {
            None => false,
            Some(left) => {
                debug_assert!(*left > 0, "job {} fired with an empty budget", self.cell.id);
                *left = left.saturating_sub(1);
                *left == 0
            }
        }
    }

    /// Deliver one firing: bump the job's counter, overwrite the
    /// notification slot and spawn the callback. Never blocks.
    pub(crate) fn fire(&self, now: Instant, tracker: &tokio_util::task::TaskTracker) -> Firing {
        let firing = Firing {
            job_id: self.cell.id,
            sequence: self.cell.record_firing(),
            scheduled_at: self.deadline,
            fired_at: now,
        };
        self.slot.send_replace(Some(firing));
        if let Some(callback) = &self.callback {
            callback.spawn(self.cell.id, tracker);
        }
        firing
    }

    /// Move the deadline one interval forward from the previous deadline.
    ///
    /// Returns `false` if the next deadline is not representable.
    pub(crate) fn advance(&mut self) -> bool {
        match self.deadline.checked_add(self.cell.schedule.interval()) {
            Some(next) => {
                self.deadline = next;
                true
            }
            None => false,
        }
    }
}

/// Handle to a registered job.
///
/// Cloning is cheap. Holding a handle does not keep the job scheduled;
/// use [`Clock::delete`](crate::Clock::delete) to cancel it.
#[derive(Debug, Clone)]
pub struct Job {
    cell: Arc<JobCell>,
    rx: watch::Receiver<Option<Firing>>,
}

impl Job {
    /// Create a job and the entry to queue for it, first due at `now + interval`.
    ///
    /// Returns `None` if the first deadline overflows the clock.
    pub(crate) fn create(
        schedule: Schedule,
        callback: Option<Callback>,
        now: Instant,
    ) -> Option<(Job, Entry)> {
        let deadline = now.checked_add(schedule.interval())?;
        let cell = Arc::new(JobCell {
            id: JobId::next(),
            schedule,
            state: AtomicU8::new(JobState::Pending.as_u8()),
            fired: AtomicU64::new(0),
        });
        let (slot, rx) = notify::slot();

        let entry = Entry {
            cell: Arc::clone(&cell),
            deadline,
            remaining: schedule.repeat().limit(),
            callback,
            slot,
        };
        Some((Job { cell, rx }, entry))
    }

    /// The job's identifier.
    pub fn id(&self) -> JobId {
        self.cell.id
    }

    /// The interval between firings (and before the first one).
    pub fn interval(&self) -> Duration {
        self.cell.schedule.interval()
    }

    /// The repeat policy the job was created with.
    pub fn repeat(&self) -> Repeat {
        self.cell.schedule.repeat()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        self.cell.state()
    }

    /// Check if the job has reached its terminal state.
    pub fn is_retired(&self) -> bool {
        self.state() == JobState::Retired
    }

    /// Number of times this job has fired so far.
    pub fn fire_count(&self) -> u64 {
        self.cell.fire_count()
    }

    /// Subscribe to this job's firings.
    pub fn notifications(&self) -> Notifications {
        Notifications::new(self.rx.clone())
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.cell.id == other.cell.id
    }
}

impl Eq for Job {}
