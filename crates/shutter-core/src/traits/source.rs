//! Paged remote query traits.

use async_trait::async_trait;

use crate::Result;
use crate::feed::{Collection, Cursor, Query};

/// Answers "up to `limit` items of this query, starting at `start`".
///
/// Implementations are stateless per call: the caller owns the cursor.
#[async_trait]
pub trait PagedSource<Q: Query>: Send + Sync {
    /// Fetch one page in `query`'s order.
    ///
    /// Items are ordered by `(sort key, id)` and start at the position of
    /// `start`, boundary item included (all items when `start` is `None`).
    /// With `exclude_start`, the boundary item is skipped as well.
    async fn fetch_page(
        &self,
        query: &Q,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Q::Item>>;
}

/// Checks whether a prefix search can match anything.
#[async_trait]
pub trait PrefixLookup: Send + Sync {
    /// Returns true if any document in `collection` has a search key
    /// starting with `prefix`.
    async fn exists_with_prefix(&self, collection: Collection, prefix: &str) -> Result<bool>;
}
