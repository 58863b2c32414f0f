//! File-backed store implementation.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use tracing::{debug, instrument};

use shutter_core::error::{InvalidInputError, ProtocolError};
use shutter_core::feed::{Collection, Cursor, Query};
use shutter_core::models::{
    Comment, CommentQuery, Follow, FollowQuery, Post, PostQuery, UserProfile, UserQuery,
};
use shutter_core::traits::{LiveSource, LiveStream, PagedSource, PrefixLookup, Store};
use shutter_core::types::{CommentId, FollowId, PostId, StoreUrl, UserId, Username};
use shutter_core::{Error, Result};

use crate::changes::ChangeFeed;
use crate::store::{ChangeOp, ChangeRecord, FileStore};

/// Filesystem-backed store.
#[derive(Debug, Clone)]
pub struct FileBackend {
    store: FileStore,
    url: StoreUrl,
}

impl FileBackend {
    /// Create a new file-backed store at the given root directory.
    pub fn new(root: impl AsRef<Path>, url: StoreUrl) -> Self {
        Self {
            store: FileStore::new(root),
            url,
        }
    }

    /// Open the store a `file://` URL points at.
    pub fn open(url: StoreUrl) -> Result<Self> {
        let root = url.to_file_path().ok_or_else(|| InvalidInputError::StoreUrl {
            value: url.to_string(),
            reason: "not a file:// URL".to_string(),
        })?;
        Ok(Self::new(root, url))
    }

    /// Returns the store URL for this instance.
    pub fn url(&self) -> &StoreUrl {
        &self.url
    }

    /// Access the underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    fn profiles(&self) -> Result<Vec<UserProfile>> {
        self.store.scan(Collection::Users)
    }

    fn post(&self, id: &PostId) -> Result<Post> {
        self.store
            .get(Collection::Posts, id.as_str())?
            .ok_or_else(|| ProtocolError::not_found("PostNotFound", format!("Post {} not found", id)).into())
    }

    /// Everyone whose posts appear in `viewer`'s feed, `viewer` included.
    fn feed_authors(&self, viewer: &UserId) -> Result<HashSet<UserId>> {
        let mut authors: HashSet<UserId> = self
            .store
            .scan::<Follow>(Collection::Follows)?
            .into_iter()
            .filter(|f| &f.follower == viewer)
            .map(|f| f.followee)
            .collect();
        authors.insert(viewer.clone());
        Ok(authors)
    }

    fn created_post(&self, query: &PostQuery, change: &ChangeRecord) -> Result<Option<Post>> {
        if change.op != ChangeOp::Create || change.collection != Collection::Posts {
            return Ok(None);
        }
        let Some(post) = self.store.get::<Post>(Collection::Posts, &change.id)? else {
            return Ok(None);
        };

        let matches = match query {
            PostQuery::Feed { viewer } => self.feed_authors(viewer)?.contains(&post.author),
            PostQuery::Profile { author } => &post.author == author,
        };
        Ok(matches.then_some(post))
    }

    fn created_comment(&self, query: &CommentQuery, change: &ChangeRecord) -> Result<Option<Comment>> {
        if change.op != ChangeOp::Create || change.collection != Collection::Comments {
            return Ok(None);
        }
        let comment = self.store.get::<Comment>(Collection::Comments, &change.id)?;
        Ok(comment.filter(|c| c.post == query.post))
    }
}

#[async_trait]
impl Store for FileBackend {
    #[instrument(skip(self))]
    async fn create_profile(&self, username: &Username, full_name: &str) -> Result<UserProfile> {
        if self.find_profile(username).await?.is_some() {
            return Err(ProtocolError::conflict(
                "UsernameTaken",
                format!("Username {} is already taken", username),
            )
            .into());
        }

        let profile = UserProfile {
            id: UserId::new(FileStore::generate_id())?,
            username: username.clone(),
            full_name: full_name.to_string(),
            bio: None,
            avatar_url: None,
            created_at: Utc::now(),
        };
        self.store.put(Collection::Users, profile.id.as_str(), &profile)?;

        debug!(id = %profile.id, username = %username, "Created profile");

        Ok(profile)
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile> {
        self.store.get(Collection::Users, id.as_str())?.ok_or_else(|| {
            ProtocolError::not_found("ProfileNotFound", format!("Profile {} not found", id)).into()
        })
    }

    async fn find_profile(&self, username: &Username) -> Result<Option<UserProfile>> {
        Ok(self.profiles()?.into_iter().find(|p| &p.username == username))
    }

    #[instrument(skip(self, caption))]
    async fn create_post(
        &self,
        author: &UserId,
        caption: &str,
        image_url: Option<&str>,
    ) -> Result<Post> {
        self.get_profile(author).await?;

        let post = Post {
            id: PostId::new(FileStore::generate_id())?,
            author: author.clone(),
            caption: caption.to_string(),
            image_url: image_url.map(str::to_string),
            created_at: Utc::now(),
        };
        self.store.put(Collection::Posts, post.id.as_str(), &post)?;

        debug!(id = %post.id, "Created post");

        Ok(post)
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, author: &UserId, post: &PostId) -> Result<()> {
        let existing = self.post(post)?;
        if &existing.author != author {
            return Err(ProtocolError::forbidden(format!("Post {} belongs to another user", post)).into());
        }

        self.store.remove(Collection::Posts, post.as_str())?;

        let comments: Vec<Comment> = self.store.scan(Collection::Comments)?;
        for comment in comments.iter().filter(|c| &c.post == post) {
            self.store.remove(Collection::Comments, comment.id.as_str())?;
        }

        debug!(id = %post, "Deleted post");

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn add_comment(&self, author: &UserId, post: &PostId, text: &str) -> Result<Comment> {
        self.get_profile(author).await?;
        self.post(post)?;

        let comment = Comment {
            id: CommentId::new(FileStore::generate_id())?,
            post: post.clone(),
            author: author.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.store.put(Collection::Comments, comment.id.as_str(), &comment)?;

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
        if let Some(existing) = self.store.get::<Follow>(Collection::Follows, id.as_str())? {
            return Ok(existing);
        }

        let follow = Follow::new(follower.clone(), followee.clone(), Utc::now());
        self.store.put(Collection::Follows, follow.id.as_str(), &follow)?;

        debug!(id = %follow.id, "Created follow");

        Ok(follow)
    }

    #[instrument(skip(self))]
    async fn unfollow(&self, follower: &UserId, followee: &UserId) -> Result<()> {
        let id = FollowId::between(follower, followee);
        if self.store.remove(Collection::Follows, id.as_str())? {
            debug!(id = %id, "Removed follow");
        }
        Ok(())
    }
}

#[async_trait]
impl PagedSource<PostQuery> for FileBackend {
    async fn fetch_page(
        &self,
        query: &PostQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Post>> {
        match query {
            PostQuery::Feed { viewer } => {
                let authors = self.feed_authors(viewer)?;
                self.store.page(
                    Collection::Posts,
                    query.order(),
                    |p: &Post| authors.contains(&p.author),
                    start,
                    limit,
                    exclude_start,
                )
            }
            PostQuery::Profile { author } => self.store.page(
                Collection::Posts,
                query.order(),
                |p: &Post| &p.author == author,
                start,
                limit,
                exclude_start,
            ),
        }
    }
}

#[async_trait]
impl PagedSource<CommentQuery> for FileBackend {
    async fn fetch_page(
        &self,
        query: &CommentQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Comment>> {
        self.store.page(
            Collection::Comments,
            query.order(),
            |c: &Comment| c.post == query.post,
            start,
            limit,
            exclude_start,
        )
    }
}

#[async_trait]
impl PagedSource<UserQuery> for FileBackend {
    async fn fetch_page(
        &self,
        query: &UserQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<UserProfile>> {
        let UserQuery::Search { prefix } = query;
        self.store.page(
            Collection::Users,
            query.order(),
            |p: &UserProfile| p.username.as_str().starts_with(prefix.as_str()),
            start,
            limit,
            exclude_start,
        )
    }
}

#[async_trait]
impl PagedSource<FollowQuery> for FileBackend {
    async fn fetch_page(
        &self,
        query: &FollowQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Follow>> {
        self.store.page(
            Collection::Follows,
            query.order(),
            |f: &Follow| match query {
                FollowQuery::Followers(user) => &f.followee == user,
                FollowQuery::Following(user) => &f.follower == user,
            },
            start,
            limit,
            exclude_start,
        )
    }
}

#[async_trait]
impl PrefixLookup for FileBackend {
    async fn exists_with_prefix(&self, collection: Collection, prefix: &str) -> Result<bool> {
        match collection {
            Collection::Users => Ok(self
                .profiles()?
                .iter()
                .any(|p| p.username.as_str().starts_with(prefix))),
            other => Err(Error::invalid(format!(
                "prefix search is not supported on {}",
                other
            ))),
        }
    }
}

impl LiveSource<PostQuery> for FileBackend {
    fn subscribe(&self, query: &PostQuery) -> Result<LiveStream<Post>> {
        let mut changes = ChangeFeed::open(&self.store)?;
        let backend = self.clone();
        let query = query.clone();

        Ok(LiveStream::new(async_stream::stream! {
            while let Some(change) = changes.next().await {
                match change.and_then(|c| backend.created_post(&query, &c)) {
                    Ok(Some(post)) => yield Ok(post),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        }))
    }
}

impl LiveSource<CommentQuery> for FileBackend {
    fn subscribe(&self, query: &CommentQuery) -> Result<LiveStream<Comment>> {
        let mut changes = ChangeFeed::open(&self.store)?;
        let backend = self.clone();
        let query = query.clone();

        Ok(LiveStream::new(async_stream::stream! {
            while let Some(change) = changes.next().await {
                match change.and_then(|c| backend.created_comment(&query, &c)) {
                    Ok(Some(comment)) => yield Ok(comment),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        }))
    }
}
