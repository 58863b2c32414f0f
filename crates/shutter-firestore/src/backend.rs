//! Firestore-backed store implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument, warn};

use shutter_core::error::ProtocolError;
use shutter_core::feed::{Collection, Cursor, Query, poll_live};
use shutter_core::models::{
    Comment, CommentQuery, Follow, FollowQuery, Post, PostQuery, UserProfile, UserQuery,
};
use shutter_core::traits::{LiveSource, LiveStream, PagedSource, PrefixLookup, Store};
use shutter_core::types::{CommentId, FollowId, PostId, StoreUrl, UserId, Username};
use shutter_core::{Error, Result};

use crate::client::FirestoreClient;
use crate::document::{
    FirestoreDocument, array_value, reference_value, sort_value, string_value,
};
use crate::query::{FieldOp, StructuredQuery};

/// Firestore caps the values of an `IN` filter.
pub const MAX_IN_VALUES: usize = 30;

/// The pseudo-field holding a document's name.
const DOCUMENT_NAME: &str = "__name__";

/// Upper bound appended to a prefix to form a range.
const PREFIX_END: char = '\u{f8ff}';

/// How often live subscriptions re-poll by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How many head items each live poll reads.
const LIVE_WINDOW: u32 = 20;

/// Comments removed with a post, per query.
const CASCADE_BATCH: u32 = 100;

/// A Firestore-backed store.
#[derive(Debug, Clone)]
pub struct FirestoreBackend {
    client: FirestoreClient,
    poll_interval: Duration,
}

impl FirestoreBackend {
    /// Connect to the documents root `url`.
    pub fn new(url: StoreUrl, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: FirestoreClient::new(url, token)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Set how often live subscriptions poll.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the documents root for this instance.
    pub fn url(&self) -> &StoreUrl {
        self.client.root()
    }

    async fn query<T: FirestoreDocument>(&self, query: StructuredQuery) -> Result<Vec<T>> {
        self.client
            .run_query(&query)
            .await?
            .iter()
            .map(T::from_document)
            .collect()
    }

    async fn get<T: FirestoreDocument>(&self, id: &str) -> Result<Option<T>> {
        match self.client.get_document(T::COLLECTION, id).await? {
            Some(doc) => T::from_document(&doc).map(Some),
            None => Ok(None),
        }
    }

    async fn post(&self, id: &PostId) -> Result<Post> {
        self.get::<Post>(id.as_str()).await?.ok_or_else(|| {
            ProtocolError::not_found("PostNotFound", format!("Post {} not found", id)).into()
        })
    }

    /// A page query over `T`'s collection in `order`, from `start`.
    ///
    /// Ties on the sort field are broken by document name, so a page can
    /// resume in the middle of a run of equal keys.
    fn paged<T: FirestoreDocument, Q: Query>(
        &self,
        query: &Q,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> StructuredQuery {
        let mut structured = StructuredQuery::new(T::COLLECTION)
            .order_by(T::SORT_FIELD, query.order())
            .order_by(DOCUMENT_NAME, query.order());
        if let Some(start) = start {
            let name = self.client.document_name(T::COLLECTION, start.id());
            structured = structured.start_at(
                vec![sort_value(start.key()), reference_value(&name)],
                exclude_start,
            );
        }
        structured.limit(limit)
    }

    /// Everyone whose posts appear in `viewer`'s feed, `viewer` first.
    async fn feed_authors(&self, viewer: &UserId) -> Result<Vec<UserId>> {
        let following: Vec<Follow> = self
            .query(
                StructuredQuery::new(Collection::Follows)
                    .filter("follower", FieldOp::Equal, string_value(viewer.as_str()))
                    .limit(MAX_IN_VALUES as u32),
            )
            .await?;

        let mut authors = vec![viewer.clone()];
        authors.extend(following.into_iter().map(|f| f.followee));

        if authors.len() > MAX_IN_VALUES {
            warn!(
                viewer = %viewer,
                "Viewer follows more accounts than one query can cover; feed limited to {} authors",
                MAX_IN_VALUES
            );
            authors.truncate(MAX_IN_VALUES);
        }

        Ok(authors)
    }
}

#[async_trait]
impl Store for FirestoreBackend {
    #[instrument(skip(self))]
    async fn create_profile(&self, username: &Username, full_name: &str) -> Result<UserProfile> {
        if self.find_profile(username).await?.is_some() {
            return Err(ProtocolError::conflict(
                "UsernameTaken",
                format!("Username {} is already taken", username),
            )
            .into());
        }

        let created_at = Utc::now();
        let draft = UserProfile {
            id: UserId::new("pending")?,
            username: username.clone(),
            full_name: full_name.to_string(),
            bio: None,
            avatar_url: None,
            created_at,
        };
        let document = self
            .client
            .create_document(Collection::Users, None, draft.to_fields())
            .await?;
        let profile = UserProfile::from_document(&document)?;

        debug!(id = %profile.id, username = %username, "Created profile");

        Ok(profile)
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile> {
        self.get::<UserProfile>(id.as_str()).await?.ok_or_else(|| {
            ProtocolError::not_found("ProfileNotFound", format!("Profile {} not found", id)).into()
        })
    }

    async fn find_profile(&self, username: &Username) -> Result<Option<UserProfile>> {
        let found: Vec<UserProfile> = self
            .query(
                StructuredQuery::new(Collection::Users)
                    .filter("username", FieldOp::Equal, string_value(username.as_str()))
                    .limit(1),
            )
            .await?;
        Ok(found.into_iter().next())
    }

    #[instrument(skip(self, caption))]
    async fn create_post(
        &self,
        author: &UserId,
        caption: &str,
        image_url: Option<&str>,
    ) -> Result<Post> {
        self.get_profile(author).await?;

        let draft = Post {
            id: PostId::new("pending")?,
            author: author.clone(),
            caption: caption.to_string(),
            image_url: image_url.map(str::to_string),
            created_at: Utc::now(),
        };
        let document = self
            .client
            .create_document(Collection::Posts, None, draft.to_fields())
            .await?;
        let post = Post::from_document(&document)?;

        debug!(id = %post.id, "Created post");

        Ok(post)
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, author: &UserId, post: &PostId) -> Result<()> {
        let existing = self.post(post).await?;
        if &existing.author != author {
            return Err(ProtocolError::forbidden(format!("Post {} belongs to another user", post)).into());
        }

        self.client
            .delete_document(Collection::Posts, post.as_str())
            .await?;

        loop {
            let comments: Vec<Comment> = self
                .query(
                    StructuredQuery::new(Collection::Comments)
                        .filter("post", FieldOp::Equal, string_value(post.as_str()))
                        .limit(CASCADE_BATCH),
                )
                .await?;
            for comment in &comments {
                self.client
                    .delete_document(Collection::Comments, comment.id.as_str())
                    .await?;
            }
            if comments.len() < CASCADE_BATCH as usize {
                break;
            }
        }

        debug!(id = %post, "Deleted post");

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn add_comment(&self, author: &UserId, post: &PostId, text: &str) -> Result<Comment> {
        self.get_profile(author).await?;
        self.post(post).await?;

        let draft = Comment {
            id: CommentId::new("pending")?,
            post: post.clone(),
            author: author.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let document = self
            .client
            .create_document(Collection::Comments, None, draft.to_fields())
            .await?;
        let comment = Comment::from_document(&document)?;

        debug!(id = %comment.id, "Added comment");

        Ok(comment)
    }

    #[instrument(skip(self))]
    async fn follow(&self, follower: &UserId, followee: &UserId) -> Result<Follow> {
        if follower == followee {
            return Err(Error::invalid("users cannot follow themselves"));
        }
        self.get_profile(follower).await?;
        self.get_profile(followee).await?;

        let id = FollowId::between(follower, followee);
        if let Some(existing) = self.get::<Follow>(id.as_str()).await? {
            return Ok(existing);
        }

        let follow = Follow::new(follower.clone(), followee.clone(), Utc::now());
        self.client
            .create_document(Collection::Follows, Some(follow.id.as_str()), follow.to_fields())
            .await?;

        debug!(id = %follow.id, "Created follow");

        Ok(follow)
    }

    #[instrument(skip(self))]
    async fn unfollow(&self, follower: &UserId, followee: &UserId) -> Result<()> {
        let id = FollowId::between(follower, followee);
        self.client
            .delete_document(Collection::Follows, id.as_str())
            .await
    }
}

#[async_trait]
impl PagedSource<PostQuery> for FirestoreBackend {
    async fn fetch_page(
        &self,
        query: &PostQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Post>> {
        let structured = self.paged::<Post, _>(query, start, limit, exclude_start);
        let structured = match query {
            PostQuery::Feed { viewer } => {
                let authors = self
                    .feed_authors(viewer)
                    .await?
                    .iter()
                    .map(|a| string_value(a.as_str()))
                    .collect();
                structured.filter("author", FieldOp::In, array_value(authors))
            }
            PostQuery::Profile { author } => {
                structured.filter("author", FieldOp::Equal, string_value(author.as_str()))
            }
        };
        self.query(structured).await
    }
}

#[async_trait]
impl PagedSource<CommentQuery> for FirestoreBackend {
    async fn fetch_page(
        &self,
        query: &CommentQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Comment>> {
        let structured = self.paged::<Comment, _>(query, start, limit, exclude_start).filter(
            "post",
            FieldOp::Equal,
            string_value(query.post.as_str()),
        );
        self.query(structured).await
    }
}

#[async_trait]
impl PagedSource<UserQuery> for FirestoreBackend {
    async fn fetch_page(
        &self,
        query: &UserQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<UserProfile>> {
        let UserQuery::Search { prefix } = query;
        let structured = self.paged::<UserProfile, _>(query, start, limit, exclude_start)
            .filter("username", FieldOp::GreaterThanOrEqual, string_value(prefix))
            .filter(
                "username",
                FieldOp::LessThan,
                string_value(&format!("{}{}", prefix, PREFIX_END)),
            );
        self.query(structured).await
    }
}

#[async_trait]
impl PagedSource<FollowQuery> for FirestoreBackend {
    async fn fetch_page(
        &self,
        query: &FollowQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Follow>> {
        let field = match query {
            FollowQuery::Followers(_) => "followee",
            FollowQuery::Following(_) => "follower",
        };
        let structured = self.paged::<Follow, _>(query, start, limit, exclude_start).filter(
            field,
            FieldOp::Equal,
            string_value(query.user().as_str()),
        );
        self.query(structured).await
    }
}

#[async_trait]
impl PrefixLookup for FirestoreBackend {
    async fn exists_with_prefix(&self, collection: Collection, prefix: &str) -> Result<bool> {
        if collection != Collection::Users {
            return Err(Error::invalid(format!(
                "prefix search is not supported on {}",
                collection
            )));
        }

        let lookup = StructuredQuery::new(Collection::Users)
            .filter("username", FieldOp::GreaterThanOrEqual, string_value(prefix))
            .filter(
                "username",
                FieldOp::LessThan,
                string_value(&format!("{}{}", prefix, PREFIX_END)),
            )
            .limit(1);

        Ok(!self.client.run_query(&lookup).await?.is_empty())
    }
}

impl LiveSource<PostQuery> for FirestoreBackend {
    fn subscribe(&self, query: &PostQuery) -> Result<LiveStream<Post>> {
        Ok(poll_live(
            Arc::new(self.clone()),
            query.clone(),
            self.poll_interval,
            LIVE_WINDOW,
        ))
    }
}

impl LiveSource<CommentQuery> for FirestoreBackend {
    fn subscribe(&self, query: &CommentQuery) -> Result<LiveStream<Comment>> {
        Ok(poll_live(
            Arc::new(self.clone()),
            query.clone(),
            self.poll_interval,
            LIVE_WINDOW,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use shutter_core::feed::SortKey;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROOT: &str = "/v1/projects/demo/databases/(default)/documents";

    fn backend(server: &MockServer) -> FirestoreBackend {
        let url = StoreUrl::new(format!("{}{}", server.uri(), ROOT)).unwrap();
        FirestoreBackend::new(url, None).unwrap()
    }

    fn post_result(id: &str, author: &str, at: &str) -> serde_json::Value {
        json!({
            "document": {
                "name": format!("projects/demo/databases/(default)/documents/posts/{}", id),
                "fields": {
                    "author": { "stringValue": author },
                    "caption": { "stringValue": format!("caption {}", id) },
                    "createdAt": { "timestampValue": at }
                }
            },
            "readTime": "2026-03-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn profile_page_sends_ordered_cursor_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "posts" }],
                    "where": { "fieldFilter": {
                        "field": { "fieldPath": "author" },
                        "op": "EQUAL",
                        "value": { "stringValue": "u1" }
                    }},
                    "orderBy": [
                        { "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" },
                        { "field": { "fieldPath": "__name__" }, "direction": "DESCENDING" }
                    ],
                    "startAt": {
                        "values": [
                            { "timestampValue": "2026-03-01T10:00:00Z" },
                            { "referenceValue": "projects/demo/databases/(default)/documents/posts/p2" }
                        ],
                        "before": true
                    },
                    "limit": 11
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                post_result("p2", "u1", "2026-03-01T10:00:00Z"),
                post_result("p1", "u1", "2026-03-01T09:00:00Z")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let start = Cursor::new(
            SortKey::Time("2026-03-01T10:00:00Z".parse().unwrap()),
            "p2",
        );
        let posts = backend(&server)
            .fetch_page(
                &PostQuery::Profile {
                    author: UserId::new("u1").unwrap(),
                },
                Some(&start),
                11,
                false,
            )
            .await
            .unwrap();

        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn feed_queries_followed_authors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(body_partial_json(json!({
                "structuredQuery": { "from": [{ "collectionId": "follows" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "document": {
                    "name": "x/follows/amy_bob",
                    "fields": {
                        "follower": { "stringValue": "amy" },
                        "followee": { "stringValue": "bob" },
                        "createdAt": { "timestampValue": "2026-01-01T00:00:00Z" }
                    }
                }
            }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "posts" }],
                    "where": { "fieldFilter": {
                        "field": { "fieldPath": "author" },
                        "op": "IN",
                        "value": { "arrayValue": { "values": [
                            { "stringValue": "amy" },
                            { "stringValue": "bob" }
                        ]}}
                    }}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                post_result("p1", "bob", "2026-03-01T09:00:00Z")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let posts = backend(&server)
            .fetch_page(
                &PostQuery::Feed {
                    viewer: UserId::new("amy").unwrap(),
                },
                None,
                10,
                false,
            )
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author.as_str(), "bob");
    }

    #[tokio::test]
    async fn feed_of_a_prolific_follower_keeps_viewer_and_first_follows() {
        let server = MockServer::start().await;
        let follows: Vec<_> = (0..MAX_IN_VALUES)
            .map(|n| {
                json!({
                    "document": {
                        "name": format!("x/follows/amy_u{}", n),
                        "fields": {
                            "follower": { "stringValue": "amy" },
                            "followee": { "stringValue": format!("u{}", n) },
                            "createdAt": { "timestampValue": "2026-01-01T00:00:00Z" }
                        }
                    }
                })
            })
            .collect();
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(body_partial_json(json!({
                "structuredQuery": { "from": [{ "collectionId": "follows" }], "limit": 30 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(follows)))
            .expect(1)
            .mount(&server)
            .await;

        let mut authors = vec![json!({ "stringValue": "amy" })];
        authors.extend(
            (0..MAX_IN_VALUES - 1).map(|n| json!({ "stringValue": format!("u{}", n) })),
        );
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "posts" }],
                    "where": { "fieldFilter": {
                        "op": "IN",
                        "value": { "arrayValue": { "values": authors } }
                    }}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                post_result("p1", "u0", "2026-03-01T09:00:00Z")
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let posts = backend(&server)
            .fetch_page(
                &PostQuery::Feed {
                    viewer: UserId::new("amy").unwrap(),
                },
                None,
                10,
                false,
            )
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn follow_from_missing_profile_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/users/ghost", ROOT)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "missing", "status": "NOT_FOUND" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/follows", ROOT)))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = backend(&server)
            .follow(&UserId::new("ghost").unwrap(), &UserId::new("bob").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ref p) if p.status == 404));
    }

    #[tokio::test]
    async fn prefix_lookup_uses_range_and_limit_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{ "collectionId": "users" }],
                    "where": { "compositeFilter": { "op": "AND" } },
                    "limit": 1
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "readTime": "2026-03-01T00:00:00Z" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let exists = backend(&server)
            .exists_with_prefix(Collection::Users, "zz")
            .await
            .unwrap();
        assert!(!exists);
    }

    #[tokio::test]
    async fn delete_of_foreign_post_is_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/posts/p1", ROOT)))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                post_result("p1", "bob", "2026-03-01T09:00:00Z")["document"].clone(),
            ))
            .mount(&server)
            .await;

        let err = backend(&server)
            .delete_post(&UserId::new("amy").unwrap(), &PostId::new("p1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ref p) if p.status == 403));
    }

    #[tokio::test]
    async fn live_comments_poll_for_new_documents() {
        let server = MockServer::start().await;
        let comment = |id: &str, at: &str| {
            json!({
                "document": {
                    "name": format!("x/comments/{}", id),
                    "fields": {
                        "post": { "stringValue": "p1" },
                        "author": { "stringValue": "amy" },
                        "text": { "stringValue": "hi" },
                        "createdAt": { "timestampValue": at }
                    }
                }
            })
        };
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([comment("c1", "2026-03-01T09:00:00Z")])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                comment("c2", "2026-03-01T10:00:00Z"),
                comment("c1", "2026-03-01T09:00:00Z")
            ])))
            .mount(&server)
            .await;

        let backend = backend(&server).with_poll_interval(Duration::from_millis(10));
        let mut live = backend
            .subscribe(&CommentQuery {
                post: PostId::new("p1").unwrap(),
            })
            .unwrap();

        let next = tokio::time::timeout(Duration::from_secs(5), live.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(next.id.as_str(), "c2");
    }

    #[tokio::test]
    async fn server_errors_surface_as_protocol_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "code": 503, "message": "unavailable", "status": "UNAVAILABLE" }
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .fetch_page(
                &CommentQuery {
                    post: PostId::new("p1").unwrap(),
                },
                None,
                10,
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(ref p) if p.status == 503));
    }
}
