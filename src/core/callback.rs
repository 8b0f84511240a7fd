//! Job callbacks.
//!
//! A callback is a zero-argument action invoked on every firing. Each
//! invocation runs as its own task so that a slow, blocking or panicking
//! callback only affects its own job.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

use super::types::JobId;

/// Boxed future returned by async callbacks.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type BlockingFn = Arc<dyn Fn() + Send + Sync + 'static>;
type AsyncFn = Arc<dyn Fn() -> BoxFuture + Send + Sync + 'static>;

/// Action invoked when a job fires.
#[derive(Clone)]
pub enum Callback {
    /// Synchronous closure, run on the blocking thread pool.
    ///
    /// The pool is bounded (512 threads unless the runtime is built with a
    /// different `max_blocking_threads`). Once every pool thread is stuck in
    /// a callback, later firings still happen but their blocking callbacks
    /// queue until a thread frees up. Work that waits for long periods
    /// belongs in [`Callback::Async`].
    Blocking(BlockingFn),
    /// Closure returning a future, run as a runtime task.
    Async(AsyncFn),
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Blocking(_) => f.write_str("Callback::Blocking"),
            Callback::Async(_) => f.write_str("Callback::Async"),
        }
    }
}

impl Callback {
    /// Wrap a synchronous closure.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Callback::Blocking(Arc::new(f))
    }

    /// Wrap a closure that returns a future.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Callback::Async(Arc::new(move || Box::pin(f()) as BoxFuture))
    }

    /// Run one invocation on `tracker`, isolated from the caller.
    ///
    /// Panics are caught and logged; they never propagate.
    pub(crate) fn spawn(&self, job_id: JobId, tracker: &TaskTracker) {
        match self {
            Callback::Blocking(f) => {
                let f = Arc::clone(f);
                tracker.spawn_blocking(move || {
                    if std::panic::catch_unwind(AssertUnwindSafe(|| f())).is_err() {
                        tracing::warn!(job_id = %job_id, "Job callback panicked");
                    }
                });
            }
            Callback::Async(f) => {
                let f = Arc::clone(f);
                tracker.spawn(async move {
                    if AssertUnwindSafe(async move { f().await })
                        .catch_unwind()
                        .await
                        .is_err()
                    {
                        tracing::warn!(job_id = %job_id, "Async job callback panicked");
                    }
                });
            }
        }
    }
}

impl<F> From<F> for Callback
where
    F: Fn() + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Callback::blocking(f)
    }
}
