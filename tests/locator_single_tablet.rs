mod common;

use common::{harness, root_location, FixedRootReader};
use tablet_locator::{KeyExtent, LocatorConfig, LocatorRegistry, Row, TableId};
use test_log::test;

/// A single-tablet table resolves any row to the same tablet once
/// discovered, and the result is served straight out of the cache on a
/// second lookup (no further metadata RPC needed).
#[test]
fn single_tablet_resolves_and_caches() -> tablet_locator::Result<()> {
    let (lock_checker, obtainer) = harness();
    lock_checker.grant(&"meta-host:9000".into(), 1.into());
    lock_checker.grant(&"user-host:9000".into(), 1.into());

    let root_loc = root_location("root-host:9000");
    lock_checker.grant(&root_loc.server, root_loc.session);

    let users = TableId::from("users");
    let metadata_extent = KeyExtent::new(TableId::metadata(), None, None);
    obtainer.respond_for_extent(
        &metadata_extent,
        vec![common::location(metadata_extent.clone(), "meta-host:9000", 1)],
    );

    let user_extent = KeyExtent::new(users.clone(), None, None);
    obtainer.respond_for_extent(
        &user_extent,
        vec![common::location(user_extent.clone(), "user-host:9000", 1)],
    );

    let registry = LocatorRegistry::new(
        std::sync::Arc::new(FixedRootReader(root_loc)),
        obtainer,
        lock_checker,
        LocatorConfig::default(),
    );

    let locator = registry.locator_for(&users);
    let first = locator
        .locate_tablet(&Row::from("alice"), false, false, None)?
        .expect("should resolve the single tablet");
    assert_eq!(first.server.as_str(), "user-host:9000");

    let second = locator
        .locate_tablet(&Row::from("zzz"), false, false, None)?
        .expect("second lookup should hit the cache");
    assert_eq!(second.extent, first.extent);

    Ok(())
}
