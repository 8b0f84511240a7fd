//! Schedule definition: how often and how many times a job fires.
//!
//! A schedule is a fixed interval plus a repeat policy. There are no
//! calendar semantics; every deadline is measured on the monotonic clock.

use std::num::NonZeroU64;
use std::time::Duration;

/// How many times a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Fire until explicitly deleted.
    Forever,
    /// Fire exactly this many times, then retire.
    Times(NonZeroU64),
}

impl Repeat {
    /// Fire a single time.
    pub const ONCE: Repeat = Repeat::Times(NonZeroU64::MIN);

    /// Build a repeat policy from a count, where `0` means unbounded.
    pub fn from_times(times: u64) -> Self {
        match NonZeroU64::new(times) {
            Some(n) => Repeat::Times(n),
            None => Repeat::Forever,
        }
    }

    /// Total number of firings, or `None` when unbounded.
    pub fn limit(&self) -> Option<u64> {
        match self {
            Repeat::Forever => None,
            Repeat::Times(n) => Some(n.get()),
        }
    }
}

/// When and how often a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    repeat: Repeat,
}

impl Schedule {
    /// Fire once, `delay` from now.
    pub fn once(delay: Duration) -> Self {
        Self {
            interval: delay,
            repeat: Repeat::ONCE,
        }
    }

    /// Fire every `interval` until deleted.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            repeat: Repeat::Forever,
        }
    }

    /// Fire every `interval`, `times` times in total (`0` = unbounded).
    pub fn repeating(interval: Duration, times: u64) -> Self {
        Self {
            interval,
            repeat: Repeat::from_times(times),
        }
    }

    /// Builder: limit the number of firings (`0` = unbounded).
    pub fn times(mut self, times: u64) -> Self {
        self.repeat = Repeat::from_times(times);
        self
    }

    /// The delay before the first firing and between subsequent ones.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The repeat policy.
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Whether the schedule can be registered at all.
    pub fn is_valid(&self) -> bool {
        !self.interval.is_zero()
    }
}
