// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A client-side tablet locator for a range-partitioned tabular store.
//!
//! ##### NOTE
//!
//! > This crate only provides the client-side routing cache, not a tablet
//! > server or a wire protocol. You supply the collaborators
//! > ([`LocationObtainer`], [`LockChecker`], [`RootRegistryReader`]) that
//! > actually talk to your cluster; this crate only maintains and walks the
//! > cache that sits in front of them.
//!
//! ##### About
//!
//! A range-partitioned table is split into contiguous row-range tablets, each
//! hosted by exactly one tablet server at a time. Finding out which server
//! currently hosts a given row means consulting a small hierarchy of metadata
//! tables, themselves tablets: a root tablet locates the metadata table, and
//! the metadata table locates every user table.
//!
//! Doing this lookup on every single read or write would be far too slow, so
//! this crate caches what it has discovered, in an ordered structure keyed by
//! each tablet's end row, and only falls back to the metadata hierarchy on a
//! cache miss ("hole"). Every cached location is re-validated against a
//! [`LockChecker`] before being handed to a caller, so a tablet server that
//! died and was replaced can never be silently acted on with its old routing.
//!
//! # Example usage
//!
//! ```
//! use tablet_locator::{LocatorConfig, LocatorRegistry, TableId};
//! # use tablet_locator::{
//! #     Error, LocationObtainer, LockChecker, Locator, Result, RootRegistryReader,
//! #     Row, ServerAddress, SessionToken, TabletLocation, KeyExtent,
//! # };
//! # use std::sync::Arc;
//! #
//! # struct FixedRoot(TabletLocation);
//! # impl RootRegistryReader for FixedRoot {
//! #     fn read_root_location(&self) -> Result<TabletLocation> { Ok(self.0.clone()) }
//! # }
//! # struct AlwaysHeld;
//! # impl LockChecker for AlwaysHeld {
//! #     fn is_lock_held(&self, _: &ServerAddress, _: SessionToken) -> bool { true }
//! #     fn invalidate_cache(&self, _: &ServerAddress) {}
//! # }
//! # struct NoRows;
//! # impl LocationObtainer for NoRows {
//! #     fn lookup_tablet(&self, _: &TabletLocation, _: &Row, _: &Row, _: &dyn Locator) -> Result<Vec<TabletLocation>> { Ok(vec![]) }
//! #     fn lookup_tablets(&self, _: &ServerAddress, _: &std::collections::HashMap<KeyExtent, Vec<tablet_locator::RowRange>>, _: &dyn Locator) -> Result<Vec<TabletLocation>> { Ok(vec![]) }
//! # }
//! # let root_loc = TabletLocation::new(KeyExtent::new(TableId::root(), None, None), ServerAddress::new("root:9000"), SessionToken::new(1));
//!
//! let registry = LocatorRegistry::new(
//!     Arc::new(FixedRoot(root_loc)),
//!     Arc::new(NoRows),
//!     Arc::new(AlwaysHeld),
//!     LocatorConfig::default(),
//! );
//!
//! let users = registry.locator_for(&TableId::from("users"));
//! let location = users.locate_tablet(&Row::from("alice"), false, false, None)?;
//! # let _ = location;
//! # Ok::<(), Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]

mod backoff;
mod bin;
mod cache;
mod config;
mod error;
mod extent;
mod location;
mod lock_checker;
mod locator;
mod obtainer;
mod registry;
mod root_locator;
mod row;
mod tablet_locator;

/// Fast-hash map used for internal bookkeeping (cache entries, dependent
/// tracking). Never appears in a public signature: collaborator traits use
/// the standard library's `HashMap` so they stay implementable without
/// pulling in `rustc-hash`.
pub(crate) type FxHashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;
pub(crate) type FxHashSet<K> = std::collections::HashSet<K, rustc_hash::FxBuildHasher>;

pub use {
    bin::{BinnedMutations, BinnedRanges, Mutation, RowRange, TabletServerMutations},
    config::LocatorConfig,
    error::{Error, Result},
    extent::{KeyExtent, TableId},
    location::{ServerAddress, SessionToken, TabletLocation},
    lock_checker::LockChecker,
    locator::Locator,
    obtainer::LocationObtainer,
    registry::LocatorRegistry,
    root_locator::{RootLocator, RootRegistryReader},
    row::Row,
    tablet_locator::TabletLocator,
};
