// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::time::{Duration, Instant};

/// A fixed-delay retry policy bounded by a caller-supplied deadline.
///
/// The locator never gives up on a transient miss by itself (transport
/// failure, lock loss, tablet hole) -- only the deadline ends the loop.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    interval: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Sleeps for one backoff interval, or returns `false` without sleeping
    /// if `deadline` has already passed (or would pass before the sleep
    /// could usefully complete).
    #[must_use]
    pub fn wait(&self, deadline: Option<Instant>) -> bool {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return false;
            }
        }
        std::thread::sleep(self.interval);
        match deadline {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
