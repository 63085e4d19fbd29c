//! Poll budget for watching a build.

use std::time::Duration;

/// Polls before a build still reported as `pending` is given up on.
pub const BUILD_POLL_TRIES: u32 = 30;

/// Wait between two polls of the same build.
pub const BUILD_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How long to keep polling a pending build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PollConfig {
    /// Number of polls, including the last one.
    pub max_tries: u32,
    /// Wait after each poll that still reports `pending`.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_tries: BUILD_POLL_TRIES,
            interval: BUILD_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Same budget, no waiting between polls.
    pub fn immediate(max_tries: u32) -> Self {
        Self {
            max_tries,
            interval: Duration::ZERO,
        }
    }

    /// Upper bound on the time spent waiting.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_tries
    }
}
