//! The dispatch loop.
//!
//! One task per clock sleeps toward the earliest deadline, then pops every
//! expired job, fires it and re-queues it if it repeats. Adding an earlier
//! job or deleting the armed one wakes the loop so it can re-arm.

use std::sync::Arc;
use tokio::time::Instant;

use crate::core::job::Entry;
use crate::core::types::JobState;

use super::engine::Shared;

pub(crate) async fn run(shared: Arc<Shared>) {
    tracing::info!("Dispatch loop started");

    loop {
        let deadline = {
            let mut state = shared.lock();
            let next = state.queue.next_deadline();
            state.armed = next;
            next
        };

        tokio::select! {
            biased;
            _ = shared.stop.cancelled() => break,
            _ = shared.wake.notified() => {}
            _ = sleep_until(deadline) => {}
        }

        // A wakeup may also mean the armed job went away; popping is cheap
        // either way.
        if dispatch_expired(&shared, Instant::now()) {
            tokio::task::yield_now().await;
        }
    }

    retire_all(&shared);
    shared.exited.cancel();
    tracing::info!("Dispatch loop stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Fire every job due at `now`, up to one batch.
///
/// Returns `true` if the batch was full and more jobs may be due.
fn dispatch_expired(shared: &Shared, now: Instant) -> bool {
    let limit = shared.config.dispatch_batch;
    let mut retired: Vec<Entry> = Vec::new();

    let fired = {
        let mut state = shared.lock();
        let expired = state.queue.pop_expired(now, limit);
        shared.record_fired(expired.len() as u64);
        let fired = expired.len();

        for mut entry in expired {
            entry.cell().set_state(JobState::Firing);
            let last = entry.take_firing();
            entry.fire(now, &shared.callbacks);

            if last {
                entry.cell().set_state(JobState::Retired);
                retired.push(entry);
            } else if entry.advance() {
                entry.cell().set_state(JobState::Pending);
                state.queue.insert(entry);
            } else {
                tracing::warn!(job_id = %entry.id(), "Next deadline overflows the clock, retiring job");
                entry.cell().set_state(JobState::Retired);
                retired.push(entry);
            }
        }
        fired
    };

    if fired > 0 {
        tracing::debug!(fired, retired = retired.len(), "Dispatched expired jobs");
    }
    // Closes the notification streams of retired jobs.
    drop(retired);

    fired == limit
}

/// Close the clock: reject new jobs and retire everything still queued.
pub(crate) fn retire_all(shared: &Shared) {
    let drained = {
        let mut state = shared.lock();
        state.closed = true;
        state.armed = None;
        let drained = state.queue.drain();
        for entry in &drained {
            entry.cell().set_state(JobState::Retired);
        }
        drained
    };

    if !drained.is_empty() {
        tracing::debug!(retired = drained.len(), "Retired pending jobs on stop");
    }
}
