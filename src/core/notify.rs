//! Per-job firing notifications.
//!
//! Every job owns a single-slot notification channel. The dispatch loop
//! overwrites the slot on each firing and never waits for a consumer, so a
//! slow consumer only ever observes the most recent firing. The stream ends
//! once the job is retired and its last firing has been observed.

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::watch;

use super::types::Firing;

/// Sending half, owned by the queued job.
pub(crate) type Slot = watch::Sender<Option<Firing>>;

/// Create a fresh notification slot for a job.
pub(crate) fn slot() -> (Slot, watch::Receiver<Option<Firing>>) {
    watch::channel(None)
}

/// Receiver for a job's firings.
///
/// Obtained from [`Job::notifications`](crate::Job::notifications). Each
/// subscription starts by yielding the most recent firing, if one has
/// already happened.
#[derive(Debug, Clone)]
pub struct Notifications {
    rx: watch::Receiver<Option<Firing>>,
}

impl Notifications {
    pub(crate) fn new(rx: watch::Receiver<Option<Firing>>) -> Self {
        Self { rx }
    }

    /// Wait for the next firing.
    ///
    /// Returns `None` once the job is retired (finished, deleted, or the
    /// clock stopped) and no unseen firing remains.
    pub async fn recv(&mut self) -> Option<Firing> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(firing) = *self.rx.borrow_and_update() {
                return Some(firing);
            }
        }
    }

    /// The most recent firing, without waiting or marking it seen.
    pub fn latest(&self) -> Option<Firing> {
        *self.rx.borrow()
    }

    /// Convert into a [`Stream`](futures::Stream) of firings.
    pub fn into_stream(self) -> BoxStream<'static, Firing> {
        futures::stream::unfold(self, |mut notifications| async move {
            notifications
                .recv()
                .await
                .map(|firing| (firing, notifications))
        })
        .boxed()
    }
}
