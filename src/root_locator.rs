// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::error::Result;
use crate::extent::KeyExtent;
use crate::location::{ServerAddress, TabletLocation};
use crate::lock_checker::LockChecker;
use crate::locator::Locator;
use crate::row::Row;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// External collaborator that reads the root tablet's current location from
/// the well-known registry path (see [`crate::LocatorConfig::root_path`]).
///
/// This is the one read [`RootLocator`] cannot serve from cache; everything
/// else about root resolution is just re-validating what was last read.
pub trait RootRegistryReader: Send + Sync {
    fn read_root_location(&self) -> Result<TabletLocation>;
}

/// Specialised locator for the root tablet (table [`crate::extent::TableId::root`]).
///
/// The root tablet is a singleton, so there is no ordered cache to maintain:
/// `locate_tablet` always resolves to the same tablet, and the only state is
/// whether the last-read location is still known to be valid.
pub struct RootLocator {
    reader: Arc<dyn RootRegistryReader>,
    lock_checker: Arc<dyn LockChecker>,
    cached: RwLock<Option<TabletLocation>>,
}

impl RootLocator {
    #[must_use]
    pub fn new(reader: Arc<dyn RootRegistryReader>, lock_checker: Arc<dyn LockChecker>) -> Self {
        Self {
            reader,
            lock_checker,
            cached: RwLock::new(None),
        }
    }
}

impl Locator for RootLocator {
    fn locate_tablet(
        &self,
        _row: &Row,
        _skip_row: bool,
        _retry: bool,
        _deadline: Option<Instant>,
    ) -> Result<Option<TabletLocation>> {
        {
            #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
            let cached = self.cached.read().expect("lock poisoned");
            if let Some(loc) = cached.as_ref() {
                if self.lock_checker.is_lock_held(&loc.server, loc.session) {
                    return Ok(Some(loc.clone()));
                }
            }
        }

        log::debug!("re-reading root tablet location from the registry");
        let loc = self.reader.read_root_location()?;
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut cached = self.cached.write().expect("lock poisoned");
        *cached = Some(loc.clone());
        Ok(Some(loc))
    }

    fn invalidate_extent(&self, _extent: &KeyExtent) {
        // The root tablet has no sub-extents to evict individually.
    }

    fn invalidate_extents(&self, _extents: &[KeyExtent]) {}

    fn invalidate_server(&self, server: &ServerAddress) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut cached = self.cached.write().expect("lock poisoned");
        if cached.as_ref().map(|loc| &loc.server) == Some(server) {
            *cached = None;
        }
        self.lock_checker.invalidate_cache(server);
    }

    fn invalidate_all(&self) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut cached = self.cached.write().expect("lock poisoned");
        *cached = None;
    }
}
