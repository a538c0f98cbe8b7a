// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::config::LocatorConfig;
use crate::extent::TableId;
use crate::lock_checker::LockChecker;
use crate::locator::Locator;
use crate::obtainer::LocationObtainer;
use crate::root_locator::{RootLocator, RootRegistryReader};
use crate::tablet_locator::TabletLocator;
use crate::FxHashMap;
use std::sync::{Arc, RwLock};

/// Owns the root and metadata locators and lazily creates one
/// [`TabletLocator`] per user table, wiring each as a dependent of the
/// metadata locator so a metadata-server failure fans out to every table
/// that was routed through it.
///
/// This is the entry point applications hold: one registry per client,
/// shared across every table it touches.
pub struct LocatorRegistry {
    root: Arc<RootLocator>,
    metadata: Arc<TabletLocator>,
    tables: RwLock<FxHashMap<TableId, Arc<TabletLocator>>>,
    obtainer: Arc<dyn LocationObtainer>,
    lock_checker: Arc<dyn LockChecker>,
    config: LocatorConfig,
}

impl LocatorRegistry {
    #[must_use]
    pub fn new(
        root_reader: Arc<dyn RootRegistryReader>,
        obtainer: Arc<dyn LocationObtainer>,
        lock_checker: Arc<dyn LockChecker>,
        config: LocatorConfig,
    ) -> Self {
        let root = Arc::new(RootLocator::new(root_reader, lock_checker.clone()));
        let metadata = Arc::new(TabletLocator::new(
            TableId::metadata(),
            root.clone() as Arc<dyn Locator>,
            obtainer.clone(),
            lock_checker.clone(),
            config.clone(),
            true,
        ));

        Self {
            root,
            metadata,
            tables: RwLock::new(FxHashMap::default()),
            obtainer,
            lock_checker,
            config,
        }
    }

    /// The locator for the root table. Exposed mainly for diagnostics and
    /// tests; callers routing ordinary table traffic want [`Self::locator_for`].
    #[must_use]
    pub fn root_locator(&self) -> Arc<dyn Locator> {
        self.root.clone()
    }

    /// The locator for the metadata table.
    #[must_use]
    pub fn metadata_locator(&self) -> Arc<dyn Locator> {
        self.metadata.clone()
    }

    /// Returns the locator for `table_id`, creating and registering it with
    /// the metadata locator on first use.
    ///
    /// `table_id == TableId::metadata()` and `table_id == TableId::root()`
    /// return the shared metadata/root locators directly rather than
    /// allocating a redundant one.
    #[must_use]
    pub fn locator_for(&self, table_id: &TableId) -> Arc<dyn Locator> {
        if table_id == &TableId::root() {
            return self.root.clone();
        }
        if table_id == &TableId::metadata() {
            return self.metadata.clone();
        }

        {
            #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
            let tables = self.tables.read().expect("lock poisoned");
            if let Some(locator) = tables.get(table_id) {
                return locator.clone();
            }
        }

        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut tables = self.tables.write().expect("lock poisoned");
        if let Some(locator) = tables.get(table_id) {
            return locator.clone();
        }

        let locator = Arc::new(TabletLocator::new(
            table_id.clone(),
            self.metadata.clone() as Arc<dyn Locator>,
            self.obtainer.clone(),
            self.lock_checker.clone(),
            self.config.clone(),
            false,
        ));
        self.metadata
            .register_dependent(Arc::downgrade(&(locator.clone() as Arc<dyn Locator>)));
        tables.insert(table_id.clone(), locator.clone());
        locator
    }

    /// Invalidates every cached entry, at every level of the hierarchy, for
    /// every table this registry has ever created a locator for.
    pub fn invalidate_all(&self) {
        self.root.invalidate_all();
        self.metadata.invalidate_all();
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let tables = self.tables.read().expect("lock poisoned");
        for locator in tables.values() {
            locator.invalidate_all();
        }
    }
}
