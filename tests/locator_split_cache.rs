mod common;

use common::{harness, location, root_location, FixedParent};
use std::sync::Arc;
use tablet_locator::{KeyExtent, LocatorConfig, Locator, Row, TableId, TabletLocator};
use test_log::test;

fn table_locator(
    table: TableId,
) -> (Arc<TabletLocator>, Arc<common::FakeLockChecker>, Arc<common::FakeObtainer>) {
    let (lock_checker, obtainer) = harness();
    let parent = Arc::new(FixedParent(root_location("parent-host:9000")));
    let locator = Arc::new(TabletLocator::new(
        table,
        parent,
        obtainer.clone(),
        lock_checker.clone(),
        LocatorConfig::default(),
        false,
    ));
    (locator, lock_checker, obtainer)
}

/// A table split into two tablets at "g" resolves `skip_row=false` to
/// the lower tablet and `skip_row=true` to the upper one.
#[test]
fn split_resolves_either_side_of_the_boundary() -> tablet_locator::Result<()> {
    let table = TableId::from("foo");
    let (locator, lock_checker, obtainer) = table_locator(table.clone());

    lock_checker.grant(&"l1:9000".into(), 1.into());
    lock_checker.grant(&"l2:9000".into(), 1.into());

    obtainer.respond_for_extent(
        &KeyExtent::new(table.clone(), None, None),
        vec![
            location(KeyExtent::new(table.clone(), Some(Row::from("g")), None), "l1:9000", 1),
            location(KeyExtent::new(table.clone(), None, Some(Row::from("g"))), "l2:9000", 1),
        ],
    );

    let lower = locator.locate_tablet(&Row::from("g"), false, false, None)?.expect("covers g");
    assert_eq!(lower.server.as_str(), "l1:9000");

    let upper = locator.locate_tablet(&Row::from("g"), true, false, None)?.expect("covers g+");
    assert_eq!(upper.server.as_str(), "l2:9000");

    Ok(())
}
