//! Command implementations.

pub mod lists;
pub mod pager;
pub mod posts;
pub mod profile;
pub mod select;
pub mod social;
pub mod watch;
