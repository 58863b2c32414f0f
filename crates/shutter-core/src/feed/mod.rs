//! The cursor pagination engine.
//!
//! One generic engine serves every list screen: a [`Query`] names the
//! collection, its order and how live items merge; a [`PagedSource`] fetches
//! pages; a [`FeedObserver`] hears about every change.
//!
//! [`PagedSource`]: crate::traits::PagedSource

mod engine;
mod error;
mod item;
mod observer;
mod paginator;
mod poll;
mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{FeedEngine, FeedHandle, Settle, Settlement};
pub use error::FeedError;
pub use item::{Cursor, Item, Order, SortKey};
pub use observer::{FeedEvent, FeedObserver};
pub use paginator::{
    Completion, DEFAULT_PAGE_SIZE, FeedStatus, FetchKind, FetchRequest, Fetched, Paginator,
    PaginatorConfig, ResultState, Ticket,
};
pub use poll::poll_live;
pub use query::{Collection, LivePolicy, Query};
