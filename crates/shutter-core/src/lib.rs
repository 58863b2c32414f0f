//! shutter-core - Core types, collaborator traits and the feed engine.
//!
//! Backends (`shutter-file`, `shutter-firestore`) implement the traits in
//! [`traits`]; list screens drive a [`FeedEngine`] over them.

pub mod error;
pub mod feed;
pub mod models;
pub mod traits;
pub mod types;

pub use error::Error;
pub use feed::{
    Collection, Cursor, FeedEngine, FeedError, FeedEvent, FeedHandle, FeedObserver, Order,
    Paginator, PaginatorConfig, Query, ResultState, Settlement, SortKey,
};
pub use models::{Comment, CommentQuery, Follow, FollowQuery, Post, PostQuery, UserProfile, UserQuery};
pub use traits::{LiveSource, LiveStream, PagedSource, PrefixLookup, Store};
pub use types::{CommentId, FollowId, PostId, StoreUrl, UserId, Username};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
