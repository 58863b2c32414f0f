//! Follow relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::{Item, SortKey};
use crate::types::{FollowId, UserId};

/// `follower` follows `followee`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: FollowId,
    pub follower: UserId,
    pub followee: UserId,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    /// A relationship created at `created_at`, with its derived id.
    pub fn new(follower: UserId, followee: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: FollowId::between(&follower, &followee),
            follower,
            followee,
            created_at,
        }
    }
}

impl Item for Follow {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn sort_key(&self) -> SortKey {
        SortKey::Time(self.created_at)
    }
}
