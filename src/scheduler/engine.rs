//! Clock implementation.
//!
//! The clock is responsible for:
//! - Registering one-shot and repeating jobs
//! - Cancelling single jobs or batches of jobs
//! - Running the dispatch loop that fires due jobs
//! - Counting firings
//! - Graceful shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::config::ClockConfig;
use crate::core::callback::Callback;
use crate::core::job::{Entry, Job};
use crate::core::schedule::Schedule;
use crate::core::types::JobState;

use super::dispatch;
use super::types::{ClockError, ClockStats};
use super::wait::WaitQueue;

/// State guarded by the clock's lock.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) queue: WaitQueue,
    /// Deadline the dispatch loop is currently sleeping toward.
    pub(crate) armed: Option<Instant>,
    /// Set once the dispatch loop has exited; no more jobs are accepted.
    pub(crate) closed: bool,
}

/// State shared between clock handles and the dispatch loop.
pub(crate) struct Shared {
    state: Mutex<State>,
    /// Wakes the dispatch loop when the earliest deadline may have changed.
    pub(crate) wake: Notify,
    total_fired: AtomicU64,
    pub(crate) callbacks: TaskTracker,
    pub(crate) stop: CancellationToken,
    /// Cancelled once the dispatch loop has retired the queue and exited.
    pub(crate) exited: CancellationToken,
    pub(crate) config: ClockConfig,
}

impl Shared {
    /// Lock the wait queue.
    ///
    /// No user code runs under this lock, so a poisoned lock still holds
    /// consistent data.
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_fired(&self, count: u64) {
        self.total_fired.fetch_add(count, Ordering::Relaxed);
    }
}

struct ClockInner {
    shared: Arc<Shared>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    /// Stops the dispatch loop once the last handle is dropped.
    _stop_on_drop: DropGuard,
}

/// Timer and job scheduler.
///
/// Cloning a clock is cheap; clones share the same jobs and dispatch loop.
/// The dispatch loop stops when [`shutdown`](Clock::shutdown) is called or
/// the last clone is dropped.
///
/// A clock must be created inside a Tokio runtime.
#[derive(Clone)]
pub struct Clock {
    inner: Arc<ClockInner>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("name", &self.inner.shared.config.name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Clock {
    /// Create a clock with default settings and start its dispatch loop.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(ClockConfig::default())
    }

    /// Create a clock with the given settings and start its dispatch loop.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config(mut config: ClockConfig) -> Self {
        if config.dispatch_batch == 0 {
            tracing::warn!(clock = %config.name, "dispatch_batch of 0 raised to 1");
            config.dispatch_batch = 1;
        }

        let stop = CancellationToken::new();
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: WaitQueue::new(),
                armed: None,
                closed: false,
            }),
            wake: Notify::new(),
            total_fired: AtomicU64::new(0),
            callbacks: TaskTracker::new(),
            stop: stop.clone(),
            exited: CancellationToken::new(),
            config,
        });

        let span = tracing::info_span!("clock", name = %shared.config.name);
        let dispatcher = tokio::spawn(dispatch::run(Arc::clone(&shared)).instrument(span));

        Self {
            inner: Arc::new(ClockInner {
                shared,
                dispatcher: Mutex::new(Some(dispatcher)),
                _stop_on_drop: stop.drop_guard(),
            }),
        }
    }

    fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    /// Fire `callback` once, `interval` from now.
    ///
    /// The callback runs on Tokio's blocking pool; see [`Callback::Blocking`]
    /// for its limits.
    pub fn add_once<F>(&self, interval: Duration, callback: F) -> Result<Job, ClockError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.schedule(Schedule::once(interval), Some(Callback::blocking(callback)))
    }

    /// Fire `callback` every `interval`, `times` times (`0` = until deleted).
    ///
    /// The callback runs on Tokio's blocking pool like in [`add_once`](Clock::add_once).
    pub fn add_repeating<F>(
        &self,
        interval: Duration,
        times: u64,
        callback: F,
    ) -> Result<Job, ClockError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.schedule(
            Schedule::repeating(interval, times),
            Some(Callback::blocking(callback)),
        )
    }

    /// Register a job.
    ///
    /// Without a callback the job only delivers notifications.
    pub fn schedule(
        &self,
        schedule: Schedule,
        callback: Option<Callback>,
    ) -> Result<Job, ClockError> {
        if !schedule.is_valid() {
            return Err(ClockError::InvalidInterval);
        }

        let shared = self.shared();
        let (job, wake) = {
            let mut state = shared.lock();
            if state.closed {
                return Err(ClockError::Stopped);
            }

            let (job, entry) = Job::create(schedule, callback, Instant::now())
                .ok_or(ClockError::IntervalOverflow)?;
            let deadline = entry.deadline();
            state.queue.insert(entry);

            let wake = state.armed.is_none_or(|armed| deadline < armed);
            if wake {
                state.armed = Some(deadline);
            }
            (job, wake)
        };

        if wake {
            shared.wake.notify_one();
        }

        tracing::trace!(
            job_id = %job.id(),
            interval = ?schedule.interval(),
            repeat = ?schedule.repeat(),
            "Job scheduled"
        );
        Ok(job)
    }

    /// Cancel a job.
    ///
    /// Returns `false` if the job already retired, was already deleted, or
    /// belongs to another clock. Once this returns `true` the job never
    /// fires again, though a callback started by an earlier firing keeps
    /// running.
    pub fn delete(&self, job: &Job) -> bool {
        let shared = self.shared();
        let (removed, wake) = {
            let mut state = shared.lock();
            match state.queue.remove(job.id()) {
                Some(entry) => {
                    entry.cell().set_state(JobState::Retired);
                    let wake = state.armed == Some(entry.deadline());
                    (Some(entry), wake)
                }
                None => (None, false),
            }
        };

        if wake {
            shared.wake.notify_one();
        }

        let found = removed.is_some();
        // Dropping the entry closes its notification stream; do it unlocked.
        drop(removed);

        tracing::trace!(job_id = %job.id(), removed = found, "Job delete requested");
        found
    }

    /// Cancel many jobs under a single lock acquisition.
    ///
    /// Returns how many of them were still pending.
    pub fn delete_many<'a, I>(&self, jobs: I) -> usize
    where
        I: IntoIterator<Item = &'a Job>,
    {
        let shared = self.shared();
        let (removed, wake) = {
            let mut state = shared.lock();
            let armed = state.armed;
            let mut wake = false;
            let mut removed: Vec<Entry> = Vec::new();
            for job in jobs {
                if let Some(entry) = state.queue.remove(job.id()) {
                    entry.cell().set_state(JobState::Retired);
                    wake |= armed == Some(entry.deadline());
                    removed.push(entry);
                }
            }
            (removed, wake)
        };

        if wake {
            shared.wake.notify_one();
        }

        let found = removed.len();
        drop(removed);

        tracing::debug!(removed = found, "Bulk delete completed");
        found
    }

    /// Number of jobs waiting for a deadline.
    pub fn pending_count(&self) -> usize {
        self.shared().lock().queue.len()
    }

    /// Total firings since the clock was created.
    pub fn total_fired(&self) -> u64 {
        self.shared().total_fired.load(Ordering::Relaxed)
    }

    /// Snapshot of the clock's counters.
    pub fn stats(&self) -> ClockStats {
        let shared = self.shared();
        let pending = shared.lock().queue.len();
        ClockStats {
            pending,
            total_fired: self.total_fired(),
            running_callbacks: shared.callbacks.len(),
        }
    }

    /// The settings the clock was created with.
    pub fn config(&self) -> &ClockConfig {
        &self.shared().config
    }

    /// Check if the dispatch loop has stopped.
    pub fn is_stopped(&self) -> bool {
        self.shared().lock().closed
    }

    /// Stop the clock.
    ///
    /// Retires every pending job (closing their notification streams),
    /// rejects new jobs, then waits up to the configured shutdown timeout
    /// for running callbacks to finish. Concurrent callers all return
    /// after the queue has been retired.
    pub async fn shutdown(&self) -> Result<(), ClockError> {
        let shared = self.shared();
        shared.stop.cancel();

        let dispatcher = self
            .inner
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match dispatcher {
            Some(dispatcher) => {
                if let Err(e) = dispatcher.await {
                    tracing::warn!(error = %e, "Dispatch loop ended abnormally");
                    // The loop normally closes the queue on exit.
                    dispatch::retire_all(shared);
                    shared.exited.cancel();
                }
            }
            // Another caller is already joining the loop.
            None => shared.exited.cancelled().await,
        }

        shared.callbacks.close();
        let running = shared.callbacks.len();
        if running == 0 {
            tracing::info!("Clock stopped");
            return Ok(());
        }

        tracing::info!(
            "Graceful shutdown: waiting for {} running callback(s) (timeout: {:?})",
            running,
            shared.config.shutdown_timeout
        );
        let start = Instant::now();
        match tokio::time::timeout(shared.config.shutdown_timeout, shared.callbacks.wait()).await {
            Ok(()) => {
                tracing::info!("All running callbacks completed in {:?}", start.elapsed());
                Ok(())
            }
            Err(_) => {
                let remaining = shared.callbacks.len();
                tracing::warn!(
                    "Graceful shutdown timeout ({:?}) exceeded with {} callback(s) still running",
                    shared.config.shutdown_timeout,
                    remaining
                );
                Err(ClockError::ShutdownTimeout(remaining))
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
