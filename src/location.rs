// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::extent::KeyExtent;
use std::sync::Arc;

/// A `host:port` pair identifying a tablet server.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ServerAddress(Arc<str>);

impl ServerAddress {
    #[must_use]
    pub fn new(address: impl Into<Arc<str>>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServerAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A monotonic liveness identifier re-issued whenever a server re-registers.
///
/// Used to fence routings against a server that died and was replaced: a
/// `TabletLocation` is only safe to act on while [`crate::LockChecker::is_lock_held`]
/// still reports the session as held.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct SessionToken(u64);

impl SessionToken {
    #[must_use]
    pub fn new(token: u64) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionToken {
    fn from(token: u64) -> Self {
        Self::new(token)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A resolved `(extent, server, session)` triple: the answer to "who hosts
/// this tablet right now".
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TabletLocation {
    pub extent: KeyExtent,
    pub server: ServerAddress,
    pub session: SessionToken,
}

impl TabletLocation {
    #[must_use]
    pub fn new(extent: KeyExtent, server: ServerAddress, session: SessionToken) -> Self {
        Self {
            extent,
            server,
            session,
        }
    }
}
