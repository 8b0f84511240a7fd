//! Clock configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of expired jobs dispatched before the loop yields.
pub const DEFAULT_DISPATCH_BATCH: usize = 4096;

/// Default time `shutdown` waits for running callbacks.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a [`Clock`](crate::Clock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Name recorded on the dispatch loop's tracing span.
    pub name: String,

    /// How long `shutdown` waits for running callbacks.
    #[serde(rename = "shutdown_timeout_ms", with = "serde_millis")]
    pub shutdown_timeout: Duration,

    /// Maximum expired jobs fired per pass before the loop yields to
    /// other tasks. A clock treats `0` as `1`.
    pub dispatch_batch: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            name: "clock".to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            dispatch_batch: DEFAULT_DISPATCH_BATCH,
        }
    }
}

impl ClockConfig {
    /// Builder: set the clock name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set the graceful shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builder: set the dispatch batch size.
    pub fn with_dispatch_batch(mut self, batch: usize) -> Self {
        self.dispatch_batch = batch;
        self
    }
}

mod serde_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
