// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::bin::{BinnedMutations, BinnedRanges, Mutation, RowRange};
use crate::cache::{end_row_key, TabletCache};
use crate::config::LocatorConfig;
use crate::error::{Error, Result};
use crate::extent::{encode_metadata_row, KeyExtent, TableId};
use crate::location::{ServerAddress, TabletLocation};
use crate::lock_checker::LockChecker;
use crate::locator::Locator;
use crate::obtainer::LocationObtainer;
use crate::row::Row;
use crate::{FxHashMap, FxHashSet};
use std::sync::{Arc, RwLock, Weak};
use std::time::Instant;

struct State {
    cache: TabletCache,
    bad_extents: FxHashSet<KeyExtent>,
}

/// The per-table recursive tablet locator: the heart of the design.
///
/// Holds an ordered cache of discovered tablets and, on a miss, recurses
/// through `parent` (the locator for this table's metadata parent) to
/// refresh it via `obtainer`. Every location handed back to a caller has
/// just been re-validated against `lock_checker`.
pub struct TabletLocator {
    table_id: TableId,
    parent: Arc<dyn Locator>,
    obtainer: Arc<dyn LocationObtainer>,
    lock_checker: Arc<dyn LockChecker>,
    config: LocatorConfig,
    is_metadata: bool,
    dependents: RwLock<Vec<Weak<dyn Locator>>>,
    state: RwLock<State>,
}

impl TabletLocator {
    #[must_use]
    pub fn new(
        table_id: TableId,
        parent: Arc<dyn Locator>,
        obtainer: Arc<dyn LocationObtainer>,
        lock_checker: Arc<dyn LockChecker>,
        config: LocatorConfig,
        is_metadata: bool,
    ) -> Self {
        Self {
            table_id,
            parent,
            obtainer,
            lock_checker,
            config,
            is_metadata,
            dependents: RwLock::new(Vec::new()),
            state: RwLock::new(State {
                cache: TabletCache::new(),
                bad_extents: FxHashSet::default(),
            }),
        }
    }

    #[must_use]
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    /// Registers `dependent` to receive `invalidate_server` calls whenever
    /// this locator (the metadata locator) evicts a server. Only meaningful
    /// when `self.is_metadata`; called by [`crate::LocatorRegistry`] as it
    /// creates each user-table locator.
    pub(crate) fn register_dependent(&self, dependent: Weak<dyn Locator>) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut dependents = self.dependents.write().expect("lock poisoned");
        dependents.push(dependent);
    }

    #[cfg(test)]
    pub(crate) fn cached_len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let state = self.state.read().expect("lock poisoned");
        state.cache.len()
    }

    /// Drains `bad_extents` and evicts each one. Runs at the start of any
    /// cache access so deferred invalidations (enqueued via
    /// `invalidate_extents`) are applied before the cache is consulted.
    fn process_bad_extents(&self, state: &mut State) {
        if state.bad_extents.is_empty() {
            return;
        }
        let doomed: Vec<KeyExtent> = state.bad_extents.drain().collect();
        for extent in doomed {
            state.cache.remove_overlapping(&extent);
        }
    }

    /// Cache probe: drains deferred invalidations, then looks for a covering
    /// entry. Takes the read lock on the fast path and only upgrades to the
    /// write lock when there is actually something to drain.
    fn probe(&self, row: &Row) -> Option<TabletLocation> {
        {
            #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
            let state = self.state.read().expect("lock poisoned");
            if state.bad_extents.is_empty() {
                return state.cache.get_covering(row);
            }
        }
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("lock poisoned");
        self.process_bad_extents(&mut state);
        state.cache.get_covering(row)
    }

    /// Resolves `row` via the parent locator and the `LocationObtainer`,
    /// merging every returned location into the cache after lock
    /// validation. Returns the location covering `row`, if any of the
    /// returned locations do.
    fn refresh(&self, row: &Row) -> Result<Option<TabletLocation>> {
        let metadata_row = encode_metadata_row(&self.table_id, Some(row));
        let metadata_stop_row = metadata_row.successor();

        let Some(parent_location) = self.parent.locate_tablet(&metadata_row, false, false, None)?
        else {
            log::debug!("parent locator has a hole covering metadata row for {row:?}");
            return Ok(None);
        };

        let discovered = self.obtainer.lookup_tablet(
            &parent_location,
            &metadata_row,
            &metadata_stop_row,
            self.parent.as_ref(),
        )?;

        self.merge_discovered(discovered, row)
    }

    fn merge_discovered(
        &self,
        discovered: Vec<TabletLocation>,
        wanted_row: &Row,
    ) -> Result<Option<TabletLocation>> {
        let mut seen: FxHashMap<KeyExtent, ServerAddress> = FxHashMap::default();
        for loc in &discovered {
            if let Some(existing) = seen.get(&loc.extent) {
                if existing != &loc.server {
                    log::warn!(
                        "inconsistent metadata for {}: {existing} vs {}",
                        loc.extent,
                        loc.server
                    );
                    return Err(Error::InconsistentMetadata {
                        extent: loc.extent.clone(),
                        first: existing.clone(),
                        second: loc.server.clone(),
                    });
                }
            } else {
                seen.insert(loc.extent.clone(), loc.server.clone());
            }
        }

        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("lock poisoned");
        let mut result = None;
        for loc in discovered {
            state.cache.remove_overlapping(&loc.extent);

            if !self.lock_checker.is_lock_held(&loc.server, loc.session) {
                log::debug!("discovered {} but its session is already gone", loc.extent);
                continue;
            }

            let covers_wanted = loc.extent.contains_row(wanted_row);
            state.cache.insert(loc.clone());
            if covers_wanted {
                result = Some(loc);
            }
        }
        Ok(result)
    }

    /// Locates the tablet covering the tail end of `range`, starting from
    /// `first`, by walking the cache in ascending `end_row` order. Returns
    /// `None` (aborting the whole range) the moment a hole is found.
    fn walk_range(&self, range: &RowRange, first: TabletLocation) -> Option<Vec<(ServerAddress, KeyExtent)>> {
        let mut contributions = vec![(first.server.clone(), first.extent.clone())];
        let mut prev_end_row = first.extent.end_row.clone();

        if range_tail_covered(&prev_end_row, &range.end_row, range.end_inclusive) {
            return Some(contributions);
        }

        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let state = self.state.read().expect("lock poisoned");
        loop {
            let key = end_row_key(&prev_end_row);
            let next = state.cache.next_after(&key)?;

            if next.extent.prev_end_row != prev_end_row {
                return None;
            }

            contributions.push((next.server.clone(), next.extent.clone()));
            prev_end_row = next.extent.end_row.clone();

            if range_tail_covered(&prev_end_row, &range.end_row, range.end_inclusive) {
                return Some(contributions);
            }
        }
    }

    fn bin_one_range(&self, range: &RowRange) -> Option<Vec<(ServerAddress, KeyExtent)>> {
        let start_key = range.start_row.clone().unwrap_or_else(Row::min);
        let skip_row = !range.start_inclusive && range.start_row.is_some();

        let first = self.locate_tablet(&start_key, skip_row, false, None).ok().flatten()?;
        self.walk_range(range, first)
    }
}

impl Locator for TabletLocator {
    fn locate_tablet(
        &self,
        row: &Row,
        skip_row: bool,
        retry: bool,
        deadline: Option<Instant>,
    ) -> Result<Option<TabletLocation>> {
        let lookup_row = if skip_row { row.successor() } else { row.clone() };

        loop {
            if let Some(loc) = self.probe(&lookup_row) {
                if self.lock_checker.is_lock_held(&loc.server, loc.session) {
                    return Ok(Some(loc));
                }
                log::debug!(
                    "evicting {}: {} lost its session before the lookup could return",
                    loc.extent,
                    loc.server
                );
                self.invalidate_server(&loc.server);
                continue;
            }

            match self.refresh(&lookup_row)? {
                Some(loc) => return Ok(Some(loc)),
                None => {
                    if !retry {
                        return Ok(None);
                    }
                    if !self.config.backoff().wait(deadline) {
                        return Ok(None);
                    }
                    continue;
                }
            }
        }
    }

    fn invalidate_extent(&self, extent: &KeyExtent) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("lock poisoned");
        state.cache.remove_overlapping(extent);
    }

    fn invalidate_extents(&self, extents: &[KeyExtent]) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("lock poisoned");
        state.bad_extents.extend(extents.iter().cloned());
    }

    fn invalidate_server(&self, server: &ServerAddress) {
        {
            #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
            let mut state = self.state.write().expect("lock poisoned");
            state.cache.remove_for_server(server);
        }
        self.lock_checker.invalidate_cache(server);

        if self.is_metadata {
            #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
            let dependents = self.dependents.read().expect("lock poisoned");
            for dependent in dependents.iter() {
                if let Some(dependent) = dependent.upgrade() {
                    dependent.invalidate_server(server);
                }
            }
        }
    }

    fn invalidate_all(&self) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut state = self.state.write().expect("lock poisoned");
        state.cache.clear();
        state.bad_extents.clear();
    }

    fn bin_ranges(&self, ranges: Vec<RowRange>) -> (BinnedRanges, Vec<RowRange>) {
        let mut binned = BinnedRanges::default();
        let mut failures = Vec::new();

        for range in ranges {
            match self.bin_one_range(&range) {
                Some(contributions) => {
                    for (server, extent) in contributions {
                        binned
                            .entry(server)
                            .or_default()
                            .entry(extent)
                            .or_default()
                            .push(range.clone());
                    }
                }
                None => failures.push(range),
            }
        }

        (binned, failures)
    }

    fn bin_mutations(&self, mutations: Vec<Mutation>) -> (BinnedMutations, Vec<Mutation>) {
        let mut binned = BinnedMutations::default();
        let mut failures = Vec::new();

        for mutation in mutations {
            match self.locate_tablet(&mutation.row, false, false, None) {
                Ok(Some(loc)) => binned
                    .entry(loc.server.clone())
                    .or_default()
                    .add(loc.extent.clone(), mutation),
                _ => failures.push(mutation),
            }
        }

        (binned, failures)
    }
}

/// `true` if the tablet ending at `current_end_row` already covers the tail
/// of a range ending at `range_end` (`None` on either side means +∞).
fn range_tail_covered(
    current_end_row: &Option<Row>,
    range_end: &Option<Row>,
    _range_end_inclusive: bool,
) -> bool {
    match (current_end_row, range_end) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(current), Some(range_end)) => current >= range_end,
    }
}
