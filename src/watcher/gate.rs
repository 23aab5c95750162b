// Launch rate limiter
//
// OSes sometimes deliver several notifications in quick succession for one
// physical event (wake immediately followed by unlock, duplicate session
// messages). The gate collapses those bursts into a single launch.

use std::time::{Duration, Instant};

/// Minimum quiet period between client launches
pub const MIN_LAUNCH_INTERVAL: Duration = Duration::from_secs(5);

/// Tracks the last launch attempt for rate limiting. Purely in-memory;
/// reset each watcher start.
#[derive(Debug)]
pub struct LaunchGate {
    last_launch: Option<Instant>,
    min_interval: Duration,
}

impl LaunchGate {
    pub fn new() -> Self {
        Self::with_interval(MIN_LAUNCH_INTERVAL)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            last_launch: None,
            min_interval,
        }
    }

    /// True if enough time has passed since the last recorded launch.
    pub fn permits(&self) -> bool {
        match self.last_launch {
            Some(last) => last.elapsed() >= self.min_interval,
            None => true,
        }
    }

    /// Record a launch attempt. Called for attempts, not just successes:
    /// a failed spawn must not be hammered in a tight burst either.
    pub fn record(&mut self) {
        self.last_launch = Some(Instant::now());
    }
}
