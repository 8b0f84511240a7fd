//! Common test utilities shared across integration tests.

use hourglass::{Firing, Job};
use std::time::Duration;

/// Wait for a job's next firing.
///
/// # Panics
///
/// Panics if the job does not fire (or its stream does not close) within
/// the timeout.
pub async fn next_firing(job: &Job, timeout: Duration) -> Option<Firing> {
    let mut notifications = job.notifications();
    match tokio::time::timeout(timeout, notifications.recv()).await {
        Ok(firing) => firing,
        Err(_) => panic!(
            "Timeout waiting for {} to fire, state: {:?}",
            job.id(),
            job.state()
        ),
    }
}

/// Collect every firing delivered on a job's stream until it closes.
///
/// # Panics
///
/// Panics if the stream is still open after the timeout.
pub async fn drain_firings(job: &Job, timeout: Duration) -> Vec<Firing> {
    let mut notifications = job.notifications();
    let collect = async {
        let mut firings = Vec::new();
        while let Some(firing) = notifications.recv().await {
            firings.push(firing);
        }
        firings
    };
    match tokio::time::timeout(timeout, collect).await {
        Ok(firings) => firings,
        Err(_) => panic!(
            "Timeout waiting for {} to retire, state: {:?}",
            job.id(),
            job.state()
        ),
    }
}
