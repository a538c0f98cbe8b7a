// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::error::{Error, Result};
use crate::extent::KeyExtent;
use crate::location::ServerAddress;
use crate::row::Row;
use std::collections::HashMap;

/// A row range to be bound to the tablet(s) that cover it.
///
/// `start_row = None` means the range starts at the smallest possible row;
/// `end_row = None` means it has no upper bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start_row: Option<Row>,
    pub start_inclusive: bool,
    pub end_row: Option<Row>,
    pub end_inclusive: bool,
}

impl RowRange {
    /// Creates a range, rejecting a `start_row` that sorts after `end_row`.
    pub fn new(
        start_row: Option<Row>,
        start_inclusive: bool,
        end_row: Option<Row>,
        end_inclusive: bool,
    ) -> Result<Self> {
        if let (Some(start), Some(end)) = (&start_row, &end_row) {
            if start > end {
                return Err(Error::InvalidArgument(format!(
                    "range start {start:?} sorts after end {end:?}"
                )));
            }
        }
        Ok(Self {
            start_row,
            start_inclusive,
            end_row,
            end_inclusive,
        })
    }

    /// A range covering exactly one row.
    #[must_use]
    pub fn for_row(row: Row) -> Self {
        Self {
            start_row: Some(row.clone()),
            start_inclusive: true,
            end_row: Some(row),
            end_inclusive: true,
        }
    }

    /// A range covering the whole table.
    #[must_use]
    pub fn everything() -> Self {
        Self {
            start_row: None,
            start_inclusive: true,
            end_row: None,
            end_inclusive: true,
        }
    }
}

/// A single row-keyed write, opaque to the locator beyond its destination row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub row: Row,
    pub payload: Vec<u8>,
}

impl Mutation {
    #[must_use]
    pub fn new(row: Row, payload: Vec<u8>) -> Self {
        Self { row, payload }
    }
}

/// An append-only grouping of mutations by extent for a single destination
/// server, preserving insertion order per extent.
#[derive(Default)]
pub struct TabletServerMutations {
    order: Vec<KeyExtent>,
    by_extent: HashMap<KeyExtent, Vec<Mutation>>,
}

impl TabletServerMutations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, extent: KeyExtent, mutation: Mutation) {
        self.by_extent
            .entry(extent.clone())
            .or_insert_with(|| {
                self.order.push(extent);
                Vec::new()
            })
            .push(mutation);
    }

    /// Extents in the order they were first seen, each with its mutations
    /// in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyExtent, &[Mutation])> {
        self.order
            .iter()
            .map(move |extent| (extent, self.by_extent.get(extent).map_or(&[][..], Vec::as_slice)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Output of [`crate::Locator::bin_ranges`]: ranges grouped by destination
/// server, then by the specific extent(s) of that server they cover.
pub type BinnedRanges = HashMap<ServerAddress, HashMap<KeyExtent, Vec<RowRange>>>;

/// Output of [`crate::Locator::bin_mutations`]: mutations grouped by
/// destination server.
pub type BinnedMutations = HashMap<ServerAddress, TabletServerMutations>;
