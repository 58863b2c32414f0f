//! Query descriptors selecting which collection a list pages through.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::{Item, Order};

/// A backend collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Posts,
    Comments,
    Follows,
}

impl Collection {
    /// All collections.
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Posts,
        Collection::Comments,
        Collection::Follows,
    ];

    /// The collection name used by backends.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
            Collection::Follows => "follows",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a list does with items pushed by a realtime subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivePolicy {
    /// Insert at index 0 (feeds and comment threads).
    Prepend,
    /// Drop them (search results, follower lists).
    Ignore,
}

/// Describes one ordered collection a list pages through.
pub trait Query: Clone + fmt::Debug + Send + Sync + 'static {
    /// The element type of the collection.
    type Item: Item;

    /// The backend collection the items live in.
    fn collection(&self) -> Collection;

    /// The order pages are returned in.
    fn order(&self) -> Order;

    /// How live items are merged.
    fn live_policy(&self) -> LivePolicy {
        LivePolicy::Ignore
    }

    /// For prefix searches, the prefix to check with `exists_with_prefix`
    /// before fetching the first page.
    fn search_prefix(&self) -> Option<&str> {
        None
    }
}
