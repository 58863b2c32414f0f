//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::{Item, SortKey};
use crate::types::{UserId, Username};

/// A user of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: Username,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Searches page through profiles by username.
impl Item for UserProfile {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn sort_key(&self) -> SortKey {
        SortKey::Text(self.username.as_str().to_string())
    }
}
