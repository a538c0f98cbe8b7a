// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::backoff::Backoff;
use std::time::Duration;

const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Tuning knobs for a [`crate::LocatorRegistry`] and the locators it creates.
///
/// None of these affect correctness, only how aggressively a stuck lookup
/// retries and how the well-known registry paths are rooted.
#[derive(Clone, Debug)]
pub struct LocatorConfig {
    backoff: Backoff,
    root_path: String,
    lock_path_prefix: String,
}

impl LocatorConfig {
    /// Fixed delay between `locate_tablet` retries when `retry = true`.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.backoff = Backoff::new(interval);
        self
    }

    /// The well-known registry path under which the root tablet's location
    /// is published.
    #[must_use]
    pub fn root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = path.into();
        self
    }

    /// The registry path prefix under which per-server liveness tokens are
    /// published, one child level below a server's own path.
    #[must_use]
    pub fn lock_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lock_path_prefix = prefix.into();
        self
    }

    #[must_use]
    pub(crate) fn backoff(&self) -> Backoff {
        self.backoff
    }

    #[must_use]
    pub fn root_path_str(&self) -> &str {
        &self.root_path
    }

    #[must_use]
    pub fn lock_path_prefix_str(&self) -> &str {
        &self.lock_path_prefix
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            backoff: Backoff::new(DEFAULT_RETRY_INTERVAL),
            root_path: "/tablet-store/root".into(),
            lock_path_prefix: "/tablet-store/locks".into(),
        }
    }
}
