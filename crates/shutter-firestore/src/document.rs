//! Firestore documents and their mapping to shutter models.
//!
//! Firestore wraps every field value in a typed object
//! (`{"stringValue": "..."}`, `{"timestampValue": "..."}`), so models are
//! converted field by field rather than through serde.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use shutter_core::error::InvalidInputError;
use shutter_core::feed::{Collection, SortKey};
use shutter_core::models::{Comment, Follow, Post, UserProfile};
use shutter_core::types::{CommentId, FollowId, PostId, UserId, Username};
use shutter_core::{Error, Result};

/// Typed document fields.
pub type Fields = Map<String, Value>;

/// A document as returned by the REST API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, ending in `<collection>/<id>`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// The document id: the last segment of its name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn malformed(&self, reason: impl std::fmt::Display) -> Error {
        InvalidInputError::Other {
            message: format!("malformed document {}: {}", self.name, reason),
        }
        .into()
    }

    fn string(&self, field: &str) -> Result<String> {
        self.optional_string(field)?
            .ok_or_else(|| self.malformed(format!("missing string field '{}'", field)))
    }

    fn optional_string(&self, field: &str) -> Result<Option<String>> {
        match self.fields.get(field) {
            None => Ok(None),
            Some(value) if value.get("nullValue").is_some() => Ok(None),
            Some(value) => value
                .get("stringValue")
                .and_then(Value::as_str)
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.malformed(format!("field '{}' is not a string", field))),
        }
    }

    fn timestamp(&self, field: &str) -> Result<DateTime<Utc>> {
        let raw = self
            .fields
            .get(field)
            .and_then(|v| v.get("timestampValue"))
            .and_then(Value::as_str)
            .ok_or_else(|| self.malformed(format!("missing timestamp field '{}'", field)))?;

        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| self.malformed(e))
    }
}

/// A `stringValue`.
pub fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

/// A `timestampValue` with microsecond precision, as Firestore stores it.
pub fn timestamp_value(t: &DateTime<Utc>) -> Value {
    json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

/// An `arrayValue`.
pub fn array_value(values: Vec<Value>) -> Value {
    json!({ "arrayValue": { "values": values } })
}

/// A `referenceValue` naming a document.
pub fn reference_value(name: &str) -> Value {
    json!({ "referenceValue": name })
}

/// The value a cursor's sort key pages from.
pub fn sort_value(key: &SortKey) -> Value {
    match key {
        SortKey::Time(t) => timestamp_value(t),
        SortKey::Text(s) => string_value(s),
    }
}

fn optional(fields: &mut Fields, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        fields.insert(name.to_string(), string_value(value));
    }
}

/// A model stored as a Firestore document.
pub trait FirestoreDocument: Sized {
    /// The collection documents live in.
    const COLLECTION: Collection;

    /// The field the collection is ordered by.
    const SORT_FIELD: &'static str;

    /// Encode as typed fields. The id is the document name, not a field.
    fn to_fields(&self) -> Fields;

    /// Decode from a document.
    fn from_document(doc: &Document) -> Result<Self>;
}

impl FirestoreDocument for UserProfile {
    const COLLECTION: Collection = Collection::Users;
    const SORT_FIELD: &'static str = "username";

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("username".into(), string_value(self.username.as_str()));
        fields.insert("fullName".into(), string_value(&self.full_name));
        optional(&mut fields, "bio", self.bio.as_deref());
        optional(&mut fields, "avatarUrl", self.avatar_url.as_deref());
        fields.insert("createdAt".into(), timestamp_value(&self.created_at));
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(UserProfile {
            id: UserId::new(doc.id())?,
            username: Username::new(doc.string("username")?)?,
            full_name: doc.string("fullName")?,
            bio: doc.optional_string("bio")?,
            avatar_url: doc.optional_string("avatarUrl")?,
            created_at: doc.timestamp("createdAt")?,
        })
    }
}

impl FirestoreDocument for Post {
    const COLLECTION: Collection = Collection::Posts;
    const SORT_FIELD: &'static str = "createdAt";

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("author".into(), string_value(self.author.as_str()));
        fields.insert("caption".into(), string_value(&self.caption));
        optional(&mut fields, "imageUrl", self.image_url.as_deref());
        fields.insert("createdAt".into(), timestamp_value(&self.created_at));
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(Post {
            id: PostId::new(doc.id())?,
            author: UserId::new(doc.string("author")?)?,
            caption: doc.string("caption")?,
            image_url: doc.optional_string("imageUrl")?,
            created_at: doc.timestamp("createdAt")?,
        })
    }
}

impl FirestoreDocument for Comment {
    const COLLECTION: Collection = Collection::Comments;
    const SORT_FIELD: &'static str = "createdAt";

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("post".into(), string_value(self.post.as_str()));
        fields.insert("author".into(), string_value(self.author.as_str()));
        fields.insert("text".into(), string_value(&self.text));
        fields.insert("createdAt".into(), timestamp_value(&self.created_at));
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(Comment {
            id: CommentId::new(doc.id())?,
            post: PostId::new(doc.string("post")?)?,
            author: UserId::new(doc.string("author")?)?,
            text: doc.string("text")?,
            created_at: doc.timestamp("createdAt")?,
        })
    }
}

impl FirestoreDocument for Follow {
    const COLLECTION: Collection = Collection::Follows;
    const SORT_FIELD: &'static str = "createdAt";

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("follower".into(), string_value(self.follower.as_str()));
        fields.insert("followee".into(), string_value(self.followee.as_str()));
        fields.insert("createdAt".into(), timestamp_value(&self.created_at));
        fields
    }

    fn from_document(doc: &Document) -> Result<Self> {
        Ok(Follow {
            id: FollowId::new(doc.id())?,
            follower: UserId::new(doc.string("follower")?)?,
            followee: UserId::new(doc.string("followee")?)?,
            created_at: doc.timestamp("createdAt")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post_document() -> Document {
        serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/posts/abc123",
            "fields": {
                "author": { "stringValue": "u1" },
                "caption": { "stringValue": "sunset" },
                "createdAt": { "timestampValue": "2026-03-01T10:00:00.250Z" }
            },
            "createTime": "2026-03-01T10:00:00.300Z"
        }))
        .unwrap()
    }

    #[test]
    fn id_is_last_name_segment() {
        assert_eq!(post_document().id(), "abc123");
    }

    #[test]
    fn decodes_post() {
        let post = Post::from_document(&post_document()).unwrap();
        assert_eq!(post.id.as_str(), "abc123");
        assert_eq!(post.author.as_str(), "u1");
        assert_eq!(post.caption, "sunset");
        assert_eq!(post.image_url, None);
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap() + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut doc = post_document();
        doc.fields.remove("caption");
        let err = Post::from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("caption"));
    }

    #[test]
    fn encodes_profile_fields() {
        let profile = UserProfile {
            id: UserId::new("u1").unwrap(),
            username: Username::new("amy").unwrap(),
            full_name: "Amy Pond".into(),
            bio: None,
            avatar_url: Some("https://img.example/amy.jpg".into()),
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };

        let fields = profile.to_fields();
        assert_eq!(fields["username"], json!({ "stringValue": "amy" }));
        assert_eq!(fields["avatarUrl"], json!({ "stringValue": "https://img.example/amy.jpg" }));
        assert_eq!(
            fields["createdAt"],
            json!({ "timestampValue": "2026-01-02T03:04:05.000000Z" })
        );
        assert!(!fields.contains_key("bio"));
    }

    #[test]
    fn null_optional_field_decodes_as_none() {
        let mut doc = post_document();
        doc.fields.insert("imageUrl".into(), json!({ "nullValue": null }));
        assert_eq!(Post::from_document(&doc).unwrap().image_url, None);
    }
}
