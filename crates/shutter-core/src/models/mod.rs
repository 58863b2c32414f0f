//! Domain models and the queries that page through them.

mod comment;
mod follow;
mod post;
mod profile;
mod queries;

pub use comment::Comment;
pub use follow::Follow;
pub use post::Post;
pub use profile::UserProfile;
pub use queries::{CommentQuery, FollowQuery, PostQuery, UserQuery};
