//! Collaborator traits implemented by backends.

mod live;
mod source;
mod store;

pub use live::{LiveSource, LiveStream};
pub use source::{PagedSource, PrefixLookup};
pub use store::Store;
