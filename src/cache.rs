// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::extent::KeyExtent;
use crate::location::{ServerAddress, TabletLocation};
use crate::row::Row;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Ordered key used to index the cache by `end_row`, with `Max` standing in
/// for `end_row = None` (+∞) so that it sorts after every real row.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) enum EndRowKey {
    Row(Row),
    Max,
}

pub(crate) fn end_row_key(end_row: &Option<Row>) -> EndRowKey {
    match end_row {
        Some(row) => EndRowKey::Row(row.clone()),
        None => EndRowKey::Max,
    }
}

/// `true` if `prev_end_row < hi`, where `prev_end_row = None` means −∞ and
/// `hi = None` means +∞.
fn prev_end_row_lt(prev_end_row: &Option<Row>, hi: &Option<Row>) -> bool {
    match (prev_end_row, hi) {
        (_, None) => true,
        (None, Some(_)) => true,
        (Some(prev), Some(hi)) => prev < hi,
    }
}

/// The ordered cache of discovered tablets for a single table: a `BTreeMap`
/// keyed by `end_row`, holding no two overlapping entries (invariant I1).
///
/// Tablets are contiguous in principle but the cache may have holes where a
/// tablet hasn't been discovered yet; a hole implies the next lookup must go
/// through the parent locator.
#[derive(Default)]
pub struct TabletCache {
    entries: BTreeMap<EndRowKey, TabletLocation>,
}

impl TabletCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The first entry whose `end_row >= row`, i.e. the tablet that would
    /// cover `row` if one has been discovered and there is no hole below it.
    #[must_use]
    pub(crate) fn ceiling(&self, row: &Row) -> Option<&TabletLocation> {
        self.entries
            .range((Bound::Included(EndRowKey::Row(row.clone())), Bound::Unbounded))
            .next()
            .map(|(_, loc)| loc)
    }

    /// Returns the cached location covering `row`, or `None` on a hole.
    #[must_use]
    pub fn get_covering(&self, row: &Row) -> Option<TabletLocation> {
        let loc = self.ceiling(row)?;
        loc.extent.contains_row(row).then(|| loc.clone())
    }

    /// The entry immediately after `key` in ascending `end_row` order.
    #[must_use]
    pub(crate) fn next_after(&self, key: &EndRowKey) -> Option<&TabletLocation> {
        self.entries
            .range((Bound::Excluded(key.clone()), Bound::Unbounded))
            .next()
            .map(|(_, loc)| loc)
    }

    /// Removes and returns every cached entry that overlaps `extent`
    /// (invariant-preserving precondition for inserting `extent`).
    ///
    /// `lo = extent.prev_end_row` (−∞ if `None`), `hi = extent.end_row` (+∞
    /// if `None`). Deletes entries with `end_row > lo` while their
    /// `prev_end_row < hi`.
    pub fn remove_overlapping(&mut self, extent: &KeyExtent) -> Vec<TabletLocation> {
        let lower_bound = match &extent.prev_end_row {
            None => Bound::Unbounded,
            Some(lo) => Bound::Excluded(EndRowKey::Row(lo.clone())),
        };

        let mut doomed = Vec::new();
        for (key, loc) in self.entries.range((lower_bound, Bound::Unbounded)) {
            if prev_end_row_lt(&loc.extent.prev_end_row, &extent.end_row) {
                doomed.push(key.clone());
            } else {
                break;
            }
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for key in doomed {
            if let Some(loc) = self.entries.remove(&key) {
                removed.push(loc);
            }
        }
        removed
    }

    /// Inserts a freshly discovered location. Callers must have already run
    /// [`Self::remove_overlapping`] for its extent to preserve invariant I1.
    pub fn insert(&mut self, location: TabletLocation) {
        self.entries.insert(end_row_key(&location.extent.end_row), location);
    }

    /// Removes every entry hosted by `server` (used on session loss).
    pub fn remove_for_server(&mut self, server: &ServerAddress) {
        self.entries.retain(|_, loc| &loc.server != server);
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TabletLocation> {
        self.entries.values()
    }
}
