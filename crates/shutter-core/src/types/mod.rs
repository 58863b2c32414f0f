//! Core shutter types.
//!
//! These types enforce their invariants at construction time,
//! so invalid identifiers and URLs never reach a backend.

mod ids;
mod store_url;
mod username;

pub use ids::{CommentId, FollowId, PostId, UserId};
pub use store_url::StoreUrl;
pub use username::Username;
