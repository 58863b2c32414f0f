//! Posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::{Item, SortKey};
use crate::types::{PostId, UserId};

/// A photo post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub caption: String,
    /// Location of the uploaded image; uploads themselves happen elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Item for Post {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn sort_key(&self) -> SortKey {
        SortKey::Time(self.created_at)
    }
}
