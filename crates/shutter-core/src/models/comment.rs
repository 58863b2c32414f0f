//! Comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::{Item, SortKey};
use crate::types::{CommentId, PostId, UserId};

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post: PostId,
    pub author: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Item for Comment {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn sort_key(&self) -> SortKey {
        SortKey::Time(self.created_at)
    }
}
