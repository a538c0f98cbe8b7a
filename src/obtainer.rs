// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::error::Result;
use crate::extent::KeyExtent;
use crate::location::{ServerAddress, TabletLocation};
use crate::locator::Locator;
use crate::row::Row;
use std::collections::HashMap;

/// External collaborator that turns a metadata scan request into tablet
/// locations, by reading raw rows out of a parent metadata tablet.
///
/// Implementations own the wire transport; the locator only sees the
/// resulting `TabletLocation`s (or an error).
pub trait LocationObtainer: Send + Sync {
    /// Resolves the single tablet containing `row`, by scanning the parent
    /// metadata tablet hosted at `parent` from `row` up to (but not
    /// including) `stop_row`.
    ///
    /// On transport failure, implementations call
    /// `parent_locator.invalidate_server(&parent.server)` before returning
    /// the error, since the failure may mean the parent's own cached
    /// location is stale.
    fn lookup_tablet(
        &self,
        parent: &TabletLocation,
        row: &Row,
        stop_row: &Row,
        parent_locator: &dyn Locator,
    ) -> Result<Vec<TabletLocation>>;

    /// Resolves a batch of extent-scoped range lookups against a single
    /// server in one round trip. On a miss, implementations call
    /// `parent_locator.invalidate_extents(...)` for the extents that could
    /// not be resolved.
    fn lookup_tablets(
        &self,
        server: &ServerAddress,
        requests: &HashMap<KeyExtent, Vec<crate::bin::RowRange>>,
        parent_locator: &dyn Locator,
    ) -> Result<Vec<TabletLocation>>;
}
