// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::row::Row;
use std::sync::Arc;

/// Identifies a table. Two reserved IDs exist for the metadata hierarchy:
/// the root table (which locates the metadata table) and the metadata table
/// (which locates user tables).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TableId(Arc<str>);

impl TableId {
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The ID of the single-tablet root table, which locates the metadata table.
    #[must_use]
    pub fn root() -> Self {
        Self::new("+r")
    }

    /// The ID of the metadata table, which locates all user tables.
    #[must_use]
    pub fn metadata() -> Self {
        Self::new("!0")
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TableId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifies a tablet: the half-open, high-side-closed row range
/// `(prev_end_row, end_row]` of a table.
///
/// `end_row = None` means +∞ and `prev_end_row = None` means −∞.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct KeyExtent {
    pub table_id: TableId,
    pub end_row: Option<Row>,
    pub prev_end_row: Option<Row>,
}

impl KeyExtent {
    #[must_use]
    pub fn new(table_id: TableId, end_row: Option<Row>, prev_end_row: Option<Row>) -> Self {
        Self {
            table_id,
            end_row,
            prev_end_row,
        }
    }

    /// Returns `true` if `row` falls within `(prev_end_row, end_row]`.
    #[must_use]
    pub fn contains_row(&self, row: &Row) -> bool {
        end_row_covers(&self.end_row, row) && !prev_end_row_excludes(&self.prev_end_row, row)
    }

    /// Returns `true` if `self` and `other` share at least one row.
    ///
    /// Neither's `end_row` may be `<=` the other's `prev_end_row`.
    #[must_use]
    pub fn overlaps_with(&self, other: &Self) -> bool {
        if self.table_id != other.table_id {
            return false;
        }
        !end_row_le_prev_end_row(&self.end_row, &other.prev_end_row)
            && !end_row_le_prev_end_row(&other.end_row, &self.prev_end_row)
    }

    /// The metadata row used to locate this extent in the parent metadata
    /// tablet: `table_id;end_row`, or `table_id<` when `end_row` is `None`.
    #[must_use]
    pub fn metadata_row(&self) -> Row {
        encode_metadata_row(&self.table_id, self.end_row.as_ref())
    }
}

impl std::fmt::Display for KeyExtent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_row = |r: &Option<Row>| match r {
            Some(r) => String::from_utf8_lossy(r).into_owned(),
            None => "-inf".into(),
        };
        write!(
            f,
            "{}:({}, {}]",
            self.table_id,
            fmt_row(&self.prev_end_row),
            fmt_row(&self.end_row)
        )
    }
}

/// `true` if `row <= end_row`, where `end_row = None` means +∞.
fn end_row_covers(end_row: &Option<Row>, row: &Row) -> bool {
    match end_row {
        None => true,
        Some(er) => row <= er,
    }
}

/// `true` if `prev_end_row >= row`, i.e. `row` is not in `(prev_end_row, ..]`.
fn prev_end_row_excludes(prev_end_row: &Option<Row>, row: &Row) -> bool {
    match prev_end_row {
        None => false,
        Some(per) => per >= row,
    }
}

/// `true` if `end_row <= prev_end_row`, the overlap-disqualifying comparison
/// used by both directions of [`KeyExtent::overlaps_with`].
fn end_row_le_prev_end_row(end_row: &Option<Row>, prev_end_row: &Option<Row>) -> bool {
    match (end_row, prev_end_row) {
        (None, _) => false,       // end_row = +inf, never <=
        (Some(_), None) => false, // prev_end_row = -inf, a finite end_row is never <=
        (Some(er), Some(per)) => er <= per,
    }
}

/// Encodes the metadata row key for a lookup bounded by `end_row`
/// (or unbounded, i.e. the last tablet of `table_id`, when `end_row` is `None`).
#[must_use]
pub fn encode_metadata_row(table_id: &TableId, end_row: Option<&Row>) -> Row {
    let table_bytes = table_id.as_bytes();
    let mut buf = Vec::with_capacity(table_bytes.len() + 1 + end_row.map_or(0, Row::len));
    buf.extend_from_slice(table_bytes);
    match end_row {
        Some(row) => {
            buf.push(b';');
            buf.extend_from_slice(row.as_bytes());
        }
        None => buf.push(b'<'),
    }
    Row::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(table: &str, prev: Option<&str>, end: Option<&str>) -> KeyExtent {
        KeyExtent::new(
            TableId::from(table),
            end.map(Row::from),
            prev.map(Row::from),
        )
    }

    #[test]
    fn contains_row_is_half_open() {
        let e = extent("1", Some("g"), Some("m"));
        assert!(!e.contains_row(&Row::from("g")));
        assert!(e.contains_row(&Row::from("h")));
        assert!(e.contains_row(&Row::from("m")));
        assert!(!e.contains_row(&Row::from("n")));
    }

    #[test]
    fn unbounded_extent_contains_everything_above_prev() {
        let e = extent("1", Some("m"), None);
        assert!(!e.contains_row(&Row::from("m")));
        assert!(e.contains_row(&Row::from("zzzzzzzz")));
    }

    #[test]
    fn adjacent_extents_do_not_overlap() {
        let a = extent("1", None, Some("g"));
        let b = extent("1", Some("g"), None);
        assert!(!a.overlaps_with(&b));
        assert!(!b.overlaps_with(&a));
    }

    #[test]
    fn extents_spanning_a_boundary_overlap() {
        let a = extent("1", None, Some("g"));
        let b = extent("1", Some("c"), Some("m"));
        assert!(a.overlaps_with(&b));
        assert!(b.overlaps_with(&a));
    }

    #[test]
    fn different_tables_never_overlap() {
        let a = extent("1", None, None);
        let b = extent("2", None, None);
        assert!(!a.overlaps_with(&b));
    }

    #[test]
    fn metadata_row_encoding() {
        let e = extent("1", Some("g"), Some("m"));
        assert_eq!(e.metadata_row().as_bytes(), b"1;m");

        let e = extent("1", Some("m"), None);
        assert_eq!(e.metadata_row().as_bytes(), b"1<");
    }
}
