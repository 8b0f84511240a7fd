//! Hourglass: an in-process timer and job scheduler.
//!
//! A [`Clock`] fires callbacks after a delay, once or repeatedly, and
//! delivers each firing on a per-job notification stream. Thousands of
//! jobs can be added and cancelled concurrently from any task.
//!
//! ```no_run
//! use hourglass::Clock;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), hourglass::ClockError> {
//! let clock = Clock::new();
//! let job = clock.add_repeating(Duration::from_millis(100), 3, || println!("tick"))?;
//!
//! let mut firings = job.notifications();
//! while let Some(firing) = firings.recv().await {
//!     println!("{} fired ({})", firing.job_id, firing.sequence);
//! }
//! clock.shutdown().await
//! # }
//! ```

pub mod config;
pub mod core;
pub mod scheduler;
pub mod testing;

pub use config::{ClockConfig, ConfigError, YamlLoader};
pub use crate::core::callback::{BoxFuture, Callback};
pub use crate::core::job::Job;
pub use crate::core::notify::Notifications;
pub use crate::core::schedule::{Repeat, Schedule};
pub use crate::core::types::{Firing, JobId, JobState};
pub use scheduler::{Clock, ClockError, ClockStats};
