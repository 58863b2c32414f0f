//! Items, sort keys, collection order and cursors.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The value a collection is ordered by.
///
/// Every item in one collection uses the same variant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum SortKey {
    /// A creation timestamp.
    Time(DateTime<Utc>),
    /// A text key such as a username.
    Text(String),
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Time(t) => write!(f, "{}", t.to_rfc3339()),
            SortKey::Text(s) => f.write_str(s),
        }
    }
}

/// An element of a paged collection.
pub trait Item: Clone + fmt::Debug + Send + Sync + 'static {
    /// Unique identifier within the collection.
    fn id(&self) -> &str;

    /// The key the collection is ordered by.
    fn sort_key(&self) -> SortKey;
}

/// Direction a collection is ordered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Smallest key first (e.g. usernames).
    Ascending,
    /// Largest key first (e.g. newest first).
    Descending,
}

impl Order {
    /// Compare two keys by their position in this order.
    ///
    /// `Less` means `a` is listed before `b`.
    pub fn cmp_keys(self, a: &SortKey, b: &SortKey) -> Ordering {
        match self {
            Order::Ascending => a.cmp(b),
            Order::Descending => b.cmp(a),
        }
    }

    /// Compare two positions, breaking key ties by id in the same direction.
    pub fn cmp_positions(self, a: (&SortKey, &str), b: (&SortKey, &str)) -> Ordering {
        let ids = match self {
            Order::Ascending => a.1.cmp(b.1),
            Order::Descending => b.1.cmp(a.1),
        };
        self.cmp_keys(a.0, b.0).then(ids)
    }

    /// Compare two items by their position in this order.
    pub fn cmp_items<T: Item>(self, a: &T, b: &T) -> Ordering {
        self.cmp_positions((&a.sort_key(), a.id()), (&b.sort_key(), b.id()))
    }

    /// Returns true if `item` sits at or after `start`.
    ///
    /// Positions compare by `(key, id)`, so items sharing the cursor's key
    /// are split by id. With `exclude_start`, the boundary item itself is
    /// excluded too.
    pub fn admits<T: Item>(self, item: &T, start: &Cursor, exclude_start: bool) -> bool {
        match self.cmp_positions((&item.sort_key(), item.id()), (start.key(), start.id())) {
            Ordering::Less => false,
            Ordering::Equal => !exclude_start,
            Ordering::Greater => true,
        }
    }
}

/// Forward-only position in a collection, taken from the boundary item.
///
/// Backends page from the `(key, id)` position, so items sharing a key
/// are never skipped; the id also identifies the boundary item itself so
/// it can be dropped when the backend returns it again at the head of the
/// next page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    key: SortKey,
    id: String,
}

impl Cursor {
    /// The cursor positioned at `item`.
    pub fn at<T: Item>(item: &T) -> Self {
        Self {
            key: item.sort_key(),
            id: item.id().to_string(),
        }
    }

    /// The sort key of the boundary item.
    pub fn key(&self) -> &SortKey {
        &self.key
    }

    /// A cursor at an explicit position.
    pub fn new(key: SortKey, id: impl Into<String>) -> Self {
        Self { key, id: id.into() }
    }

    /// The id of the boundary item.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true if `self` lies strictly after `other` in `order`.
    pub fn is_after(&self, other: &Cursor, order: Order) -> bool {
        order.cmp_positions((&self.key, &self.id), (&other.key, &other.id)) == Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> SortKey {
        SortKey::Time(Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn descending_lists_newest_first() {
        assert_eq!(Order::Descending.cmp_keys(&at(20), &at(10)), Ordering::Less);
        assert_eq!(Order::Ascending.cmp_keys(&at(20), &at(10)), Ordering::Greater);
    }

    #[test]
    fn ties_break_by_id() {
        let key = at(5);
        assert_eq!(
            Order::Ascending.cmp_positions((&key, "a"), (&key, "b")),
            Ordering::Less
        );
        assert_eq!(
            Order::Descending.cmp_positions((&key, "a"), (&key, "b")),
            Ordering::Greater
        );
    }

    #[derive(Debug, Clone)]
    struct Entry {
        id: &'static str,
        key: SortKey,
    }

    impl Item for Entry {
        fn id(&self) -> &str {
            self.id
        }

        fn sort_key(&self) -> SortKey {
            self.key.clone()
        }
    }

    fn named(id: &'static str, name: &str) -> Entry {
        Entry {
            id,
            key: SortKey::Text(name.into()),
        }
    }

    fn timed(id: &'static str, secs: i64) -> Entry {
        Entry { id, key: at(secs) }
    }

    #[test]
    fn admits_respects_exclusive_start() {
        let start = Cursor::at(&named("u2", "bob"));
        assert!(Order::Ascending.admits(&named("u2", "bob"), &start, false));
        assert!(!Order::Ascending.admits(&named("u2", "bob"), &start, true));
        assert!(Order::Ascending.admits(&named("u3", "carol"), &start, true));
        assert!(!Order::Descending.admits(&named("u3", "carol"), &start, false));
    }

    #[test]
    fn admits_splits_shared_keys_by_id() {
        let start = Cursor::new(at(5), "m");
        assert!(Order::Descending.admits(&timed("a", 5), &start, true));
        assert!(!Order::Descending.admits(&timed("z", 5), &start, true));
        assert!(Order::Ascending.admits(&timed("z", 5), &start, true));
        assert!(!Order::Ascending.admits(&timed("a", 5), &start, true));
    }

    #[test]
    fn sort_key_serializes_tagged() {
        let json = serde_json::to_value(SortKey::Text("amy".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "text", "value": "amy"}));
    }
}
