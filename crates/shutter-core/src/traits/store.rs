//! Write-side store trait.

use async_trait::async_trait;

use crate::Result;
use crate::models::{Comment, Follow, Post, UserProfile};
use crate::types::{PostId, UserId, Username};

/// Writes that populate the network.
///
/// The acting user is always an explicit parameter.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a profile. Fails with a 409 if the username is taken.
    async fn create_profile(&self, username: &Username, full_name: &str) -> Result<UserProfile>;

    /// Get a profile by id. Fails with a 404 if it does not exist.
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile>;

    /// Look up a profile by username.
    async fn find_profile(&self, username: &Username) -> Result<Option<UserProfile>>;

    /// Publish a post as `author`.
    async fn create_post(
        &self,
        author: &UserId,
        caption: &str,
        image_url: Option<&str>,
    ) -> Result<Post>;

    /// Delete one of `author`'s posts. Fails with a 403 for someone else's post.
    async fn delete_post(&self, author: &UserId, post: &PostId) -> Result<()>;

    /// Comment on a post as `author`.
    async fn add_comment(&self, author: &UserId, post: &PostId, text: &str) -> Result<Comment>;

    /// Make `follower` follow `followee`. Following twice returns the existing relationship.
    async fn follow(&self, follower: &UserId, followee: &UserId) -> Result<Follow>;

    /// Remove the relationship if it exists.
    async fn unfollow(&self, follower: &UserId, followee: &UserId) -> Result<()>;
}
