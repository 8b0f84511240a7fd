//! Wait queue: pending jobs ordered by deadline.
//!
//! Entries live in a `BTreeMap` keyed by `(deadline, id)`, so the earliest
//! deadline is always the first key and jobs sharing a deadline keep their
//! creation order. A `HashMap` index from id to deadline makes cancelling
//! any job O(log n) without scanning.

use std::collections::{BTreeMap, HashMap};
use tokio::time::Instant;

use crate::core::job::Entry;
use crate::core::types::JobId;

/// Ordered collection of pending jobs plus the id index.
#[derive(Debug, Default)]
pub(crate) struct WaitQueue {
    pending: BTreeMap<(Instant, JobId), Entry>,
    index: HashMap<JobId, Instant>,
}

impl WaitQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue an entry at its deadline.
    pub(crate) fn insert(&mut self, entry: Entry) {
        let key = (entry.deadline(), entry.id());
        self.index.insert(key.1, key.0);
        let previous = self.pending.insert(key, entry);
        debug_assert!(previous.is_none(), "job {} queued twice", key.1);
    }

    /// Remove a job by id.
    ///
    /// Returns `None` if the job is not queued (retired, deleted, or owned
    /// by another clock).
    pub(crate) fn remove(&mut self, id: JobId) -> Option<Entry> {
        let deadline = self.index.remove(&id)?;
        let entry = self.pending.remove(&(deadline, id));
        debug_assert!(entry.is_some(), "index points at missing entry for job {}", id);
        entry
    }

    /// Earliest queued deadline.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.first_key_value().map(|((deadline, _), _)| *deadline)
    }

    /// Pop up to `limit` entries whose deadline is at or before `now`,
    /// earliest first. Popped jobs leave the index.
    pub(crate) fn pop_expired(&mut self, now: Instant, limit: usize) -> Vec<Entry> {
        let mut expired = Vec::new();
        while expired.len() < limit {
            match self.pending.first_entry() {
                Some(first) if first.key().0 <= now => {
                    let entry = first.remove();
                    self.index.remove(&entry.id());
                    expired.push(entry);
                }
                _ => break,
            }
        }
        expired
    }

    /// Remove every queued entry.
    pub(crate) fn drain(&mut self) -> Vec<Entry> {
        self.index.clear();
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.pending.len(), "wait queue index out of sync");
        self.pending.len()
    }
}
