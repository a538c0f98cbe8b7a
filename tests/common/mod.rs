#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tablet_locator::{
    Error, KeyExtent, LocationObtainer, Locator, LockChecker, Result, Row, RowRange,
    RootRegistryReader, ServerAddress, SessionToken, TableId, TabletLocation,
};

/// A fresh lock checker and location obtainer test double: no servers
/// granted, no canned responses registered yet.
pub fn harness() -> (Arc<FakeLockChecker>, Arc<FakeObtainer>) {
    (Arc::new(FakeLockChecker::default()), Arc::new(FakeObtainer::default()))
}

/// A `TabletLocation` for the single-tablet root table, hosted at `server`.
pub fn root_location(server: &str) -> TabletLocation {
    location(KeyExtent::new(TableId::root(), None, None), server, 1)
}

/// A `TabletLocation` for `extent`, hosted at `server` with `session`.
pub fn location(extent: KeyExtent, server: &str, session: u64) -> TabletLocation {
    TabletLocation::new(extent, ServerAddress::from(server), SessionToken::new(session))
}

/// Hands back a fixed, unchanging root tablet location.
pub struct FixedRootReader(pub TabletLocation);

impl RootRegistryReader for FixedRootReader {
    fn read_root_location(&self) -> Result<TabletLocation> {
        Ok(self.0.clone())
    }
}

/// A stand-in parent `Locator` that always resolves to the same location,
/// regardless of which row it is asked about. Lets a single `TabletLocator`
/// be exercised directly without wiring up the full root/metadata hierarchy.
pub struct FixedParent(pub TabletLocation);

impl Locator for FixedParent {
    fn locate_tablet(
        &self,
        _row: &Row,
        _skip_row: bool,
        _retry: bool,
        _deadline: Option<std::time::Instant>,
    ) -> Result<Option<TabletLocation>> {
        Ok(Some(self.0.clone()))
    }

    fn invalidate_extent(&self, _extent: &KeyExtent) {}
    fn invalidate_extents(&self, _extents: &[KeyExtent]) {}
    fn invalidate_server(&self, _server: &ServerAddress) {}
    fn invalidate_all(&self) {}
}

/// A `LockChecker` test double backed by an explicit grant table. A server
/// with no entry (or one explicitly revoked) is treated as not holding its
/// lock, matching the fail-closed default a real registry-backed checker
/// would have for a server it has never heard of.
#[derive(Default)]
pub struct FakeLockChecker {
    held: Mutex<HashMap<ServerAddress, SessionToken>>,
    invalidations: Mutex<Vec<ServerAddress>>,
}

impl FakeLockChecker {
    pub fn grant(&self, server: &ServerAddress, session: SessionToken) {
        self.held.lock().expect("lock is poisoned").insert(server.clone(), session);
    }

    pub fn revoke(&self, server: &ServerAddress) {
        self.held.lock().expect("lock is poisoned").remove(server);
    }

    pub fn invalidation_count(&self, server: &ServerAddress) -> usize {
        self.invalidations
            .lock()
            .expect("lock is poisoned")
            .iter()
            .filter(|s| *s == server)
            .count()
    }
}

impl LockChecker for FakeLockChecker {
    fn is_lock_held(&self, server: &ServerAddress, session: SessionToken) -> bool {
        self.held.lock().expect("lock is poisoned").get(server) == Some(&session)
    }

    fn invalidate_cache(&self, server: &ServerAddress) {
        self.invalidations.lock().expect("lock is poisoned").push(server.clone());
    }
}

/// A `LocationObtainer` test double that resolves a metadata row to whatever
/// locations were registered for the table encoded in its prefix.
///
/// `lookup_tablet`'s `row` argument is always `encode_metadata_row(table_id,
/// ..)` for whichever locator issued the call, so keying canned responses on
/// the row's table-id prefix is enough to tell hops in the hierarchy apart
/// without modeling the parent server's own routing table.
#[derive(Default)]
pub struct FakeObtainer {
    responses: Mutex<HashMap<TableId, Vec<TabletLocation>>>,
    fail_for: Mutex<Option<TableId>>,
}

impl FakeObtainer {
    /// Registers the locations handed back for any row belonging to
    /// `extent.table_id`.
    pub fn respond_for_extent(&self, extent: &KeyExtent, locations: Vec<TabletLocation>) {
        self.responses
            .lock()
            .expect("lock is poisoned")
            .insert(extent.table_id.clone(), locations);
    }

    /// Makes the next (and every subsequent) lookup for `table_id` fail with
    /// a simulated transport error.
    pub fn fail_for_table(&self, table_id: &TableId) {
        *self.fail_for.lock().expect("lock is poisoned") = Some(table_id.clone());
    }

    fn table_id_of(row: &Row) -> TableId {
        let bytes = row.as_bytes();
        let end = bytes
            .iter()
            .position(|b| *b == b';' || *b == b'<')
            .unwrap_or(bytes.len());
        TableId::from(String::from_utf8_lossy(&bytes[..end]).as_ref())
    }
}

impl LocationObtainer for FakeObtainer {
    fn lookup_tablet(
        &self,
        parent: &TabletLocation,
        row: &Row,
        _stop_row: &Row,
        parent_locator: &dyn Locator,
    ) -> Result<Vec<TabletLocation>> {
        let table_id = Self::table_id_of(row);

        if self.fail_for.lock().expect("lock is poisoned").as_ref() == Some(&table_id) {
            parent_locator.invalidate_server(&parent.server);
            return Err(Error::Transport("simulated transport failure".into()));
        }

        Ok(self
            .responses
            .lock()
            .expect("lock is poisoned")
            .get(&table_id)
            .cloned()
            .unwrap_or_default())
    }

    fn lookup_tablets(
        &self,
        _server: &ServerAddress,
        requests: &HashMap<KeyExtent, Vec<RowRange>>,
        _parent_locator: &dyn Locator,
    ) -> Result<Vec<TabletLocation>> {
        let responses = self.responses.lock().expect("lock is poisoned");
        let mut out = Vec::new();
        for extent in requests.keys() {
            if let Some(locs) = responses.get(&extent.table_id) {
                out.extend(locs.iter().cloned());
            }
        }
        Ok(out)
    }
}
