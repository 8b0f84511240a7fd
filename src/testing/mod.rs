//! Testing utilities for users of the Hourglass library.
//!
//! This module provides helpers for testing code that schedules jobs:
//!
//! - [`FireCounter`]: A callback that counts its invocations
//! - [`wait_until`]: Polls a condition instead of sleeping a fixed time
//! - [`wait_for_fired`]: Waits for a clock to reach a firing count

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::scheduler::Clock;

/// A shared invocation counter to use as a job callback.
///
/// # Example
///
/// ```no_run
/// use hourglass::Clock;
/// use hourglass::testing::FireCounter;
/// use std::time::Duration;
///
/// # async fn demo() {
/// let clock = Clock::new();
/// let counter = FireCounter::new();
/// clock.add_once(Duration::from_millis(100), counter.hook()).unwrap();
///
/// tokio::time::sleep(Duration::from_secs(1)).await;
/// assert_eq!(counter.count(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FireCounter {
    count: Arc<AtomicUsize>,
}

impl FireCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that increments this counter.
    pub fn hook(&self) -> impl Fn() + Clone + Send + Sync + 'static {
        let count = Arc::clone(&self.count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Invocations so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Poll `condition` every few milliseconds until it holds.
///
/// Returns `false` if `timeout` elapses first.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until `clock` has fired at least `expected` times.
///
/// # Panics
///
/// Panics if the timeout is reached first.
pub async fn wait_for_fired(clock: &Clock, expected: u64, timeout: Duration) {
    if !wait_until(timeout, || clock.total_fired() >= expected).await {
        panic!(
            "Timeout waiting for {} firing(s), clock has fired {}",
            expected,
            clock.total_fired()
        );
    }
}
