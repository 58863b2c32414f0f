//! Errors surfaced to list screens.

use std::sync::Arc;

use thiserror::Error;

use crate::Error;

/// A failed pagination request.
///
/// Never invalidates what is already on screen; the next user action is the
/// only retry. Cheap to clone so it can be both reported to the observer and
/// returned to whoever awaits the request.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// A page fetch failed.
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] Arc<Error>),

    /// The search-existence check failed.
    #[error("prefix check failed: {0}")]
    PrefixCheckFailed(#[source] Arc<Error>),
}

impl FeedError {
    pub(crate) fn fetch(err: Error) -> Self {
        FeedError::FetchFailed(Arc::new(err))
    }

    pub(crate) fn prefix_check(err: Error) -> Self {
        FeedError::PrefixCheckFailed(Arc::new(err))
    }

    /// The underlying backend error.
    pub fn cause(&self) -> &Error {
        match self {
            FeedError::FetchFailed(e) | FeedError::PrefixCheckFailed(e) => e,
        }
    }
}
