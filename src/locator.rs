// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::bin::{BinnedMutations, BinnedRanges, Mutation, RowRange};
use crate::error::Result;
use crate::extent::KeyExtent;
use crate::location::{ServerAddress, TabletLocation};
use crate::row::Row;
use std::time::Instant;

/// The capability set shared by [`crate::RootLocator`] and
/// [`crate::TabletLocator`]. Parents reference children (and callers
/// reference either) through `Arc<dyn Locator>`, never a concrete type, so
/// the depth-3 Root → Metadata → User tree never needs to know which kind of
/// node sits above it.
pub trait Locator: Send + Sync {
    /// Resolves the tablet whose range contains `row` (or, if `skip_row` is
    /// set, the tablet containing `row`'s immediate successor).
    ///
    /// When `retry` is `true` and the tablet cannot currently be resolved
    /// (a hole, or a transient transport failure), retries with a bounded
    /// backoff until `deadline` elapses; with `retry` false, returns `Ok(None)`
    /// immediately on the first miss.
    fn locate_tablet(
        &self,
        row: &Row,
        skip_row: bool,
        retry: bool,
        deadline: Option<Instant>,
    ) -> Result<Option<TabletLocation>>;

    /// Evicts the cached entry (if any) that overlaps `extent`.
    fn invalidate_extent(&self, extent: &KeyExtent);

    /// Enqueues `extents` for deferred eviction, processed the next time
    /// this locator is accessed (batches several invalidations under one
    /// write-lock acquisition).
    fn invalidate_extents(&self, extents: &[KeyExtent]);

    /// Evicts every cached entry hosted by `server` and tells the
    /// `LockChecker` to drop its memo for it. If this locator is the
    /// metadata locator, also propagates to every dependent table locator.
    fn invalidate_server(&self, server: &ServerAddress);

    /// Clears the entire cache for this table.
    fn invalidate_all(&self);

    /// Groups `ranges` by destination server and the extent(s) of that
    /// server each range covers. Ranges whose coverage includes a hole are
    /// returned whole in `failures`, with no partial bindings recorded.
    ///
    /// The default implementation locates the start of each range without
    /// walking the cache for contiguous coverage; [`crate::TabletLocator`]
    /// overrides this with the full walk described in the design.
    fn bin_ranges(&self, ranges: Vec<RowRange>) -> (BinnedRanges, Vec<RowRange>) {
        let mut binned = BinnedRanges::default();
        let mut failures = Vec::new();

        for range in ranges {
            let start_key = range.start_row.clone().unwrap_or_else(Row::min);
            let skip_row = !range.start_inclusive && range.start_row.is_some();

            match self.locate_tablet(&start_key, skip_row, false, None) {
                Ok(Some(loc)) => {
                    binned
                        .entry(loc.server.clone())
                        .or_default()
                        .entry(loc.extent.clone())
                        .or_default()
                        .push(range);
                }
                _ => failures.push(range),
            }
        }

        (binned, failures)
    }

    /// Routes each mutation to the tablet server hosting its row, or to
    /// `failures` when that tablet cannot currently be resolved.
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
