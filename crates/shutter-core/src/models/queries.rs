//! Queries for each list screen.

use crate::feed::{Collection, LivePolicy, Order, Query};
use crate::types::{PostId, UserId};

use super::{Comment, Follow, Post, UserProfile};

/// Posts, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostQuery {
    /// The home feed: posts by `viewer` and everyone `viewer` follows.
    Feed { viewer: UserId },
    /// One author's posts, as shown on their profile.
    Profile { author: UserId },
}

impl Query for PostQuery {
    type Item = Post;

    fn collection(&self) -> Collection {
        Collection::Posts
    }

    fn order(&self) -> Order {
        Order::Descending
    }

    fn live_policy(&self) -> LivePolicy {
        match self {
            PostQuery::Feed { .. } => LivePolicy::Prepend,
            PostQuery::Profile { .. } => LivePolicy::Ignore,
        }
    }
}

/// Comments on one post, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentQuery {
    pub post: PostId,
}

impl Query for CommentQuery {
    type Item = Comment;

    fn collection(&self) -> Collection {
        Collection::Comments
    }

    fn order(&self) -> Order {
        Order::Descending
    }

    fn live_policy(&self) -> LivePolicy {
        LivePolicy::Prepend
    }
}

/// Profiles by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    /// Usernames starting with `prefix`, alphabetically.
    Search { prefix: String },
}

impl UserQuery {
    /// A search for `prefix`, normalised the way usernames are.
    pub fn search(prefix: impl AsRef<str>) -> Self {
        UserQuery::Search {
            prefix: prefix.as_ref().trim().to_ascii_lowercase(),
        }
    }
}

impl Query for UserQuery {
    type Item = UserProfile;

    fn collection(&self) -> Collection {
        Collection::Users
    }

    fn order(&self) -> Order {
        Order::Ascending
    }

    fn search_prefix(&self) -> Option<&str> {
        match self {
            UserQuery::Search { prefix } => Some(prefix),
        }
    }
}

/// Follow relationships around one user, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowQuery {
    /// Who follows the user.
    Followers(UserId),
    /// Whom the user follows.
    Following(UserId),
}

impl FollowQuery {
    /// The user whose relationships are listed.
    pub fn user(&self) -> &UserId {
        match self {
            FollowQuery::Followers(user) | FollowQuery::Following(user) => user,
        }
    }
}

impl Query for FollowQuery {
    type Item = Follow;

    fn collection(&self) -> Collection {
        Collection::Follows
    }

    fn order(&self) -> Order {
        Order::Descending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_normalises_prefix() {
        let query = UserQuery::search("  JaN ");
        assert_eq!(query.search_prefix(), Some("jan"));
        assert_eq!(query.order(), Order::Ascending);
    }

    #[test]
    fn only_feed_and_comments_prepend_live_items() {
        let user = UserId::new("u1").unwrap();
        assert_eq!(
            PostQuery::Feed { viewer: user.clone() }.live_policy(),
            LivePolicy::Prepend
        );
        assert_eq!(
            PostQuery::Profile { author: user.clone() }.live_policy(),
            LivePolicy::Ignore
        );
        assert_eq!(
            CommentQuery {
                post: PostId::new("p1").unwrap()
            }
            .live_policy(),
            LivePolicy::Prepend
        );
        assert_eq!(UserQuery::search("a").live_policy(), LivePolicy::Ignore);
        assert_eq!(FollowQuery::Followers(user).live_policy(), LivePolicy::Ignore);
    }
}
