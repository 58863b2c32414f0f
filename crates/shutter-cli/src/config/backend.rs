//! Dispatch over the configured backend.

use async_trait::async_trait;

use shutter_core::feed::{Collection, Cursor, Query};
use shutter_core::models::{Comment, Follow, Post, UserProfile};
use shutter_core::traits::{LiveSource, LiveStream, PagedSource, PrefixLookup, Store};
use shutter_core::types::{PostId, StoreUrl, UserId, Username};
use shutter_core::Result;
use shutter_file::FileBackend;
use shutter_firestore::FirestoreBackend;

/// The backend a store URL selects.
#[derive(Debug, Clone)]
pub enum CliBackend {
    File(FileBackend),
    Firestore(FirestoreBackend),
}

impl CliBackend {
    /// `file://` URLs open a local store; http(s) URLs talk to Firestore.
    pub fn connect(url: StoreUrl, token: Option<String>) -> Result<Self> {
        if url.is_local() {
            Ok(CliBackend::File(FileBackend::open(url)?))
        } else {
            Ok(CliBackend::Firestore(FirestoreBackend::new(url, token)?))
        }
    }

    pub fn url(&self) -> &StoreUrl {
        match self {
            CliBackend::File(b) => b.url(),
            CliBackend::Firestore(b) => b.url(),
        }
    }
}

#[async_trait]
impl Store for CliBackend {
    async fn create_profile(&self, username: &Username, full_name: &str) -> Result<UserProfile> {
        match self {
            CliBackend::File(b) => b.create_profile(username, full_name).await,
            CliBackend::Firestore(b) => b.create_profile(username, full_name).await,
        }
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile> {
        match self {
            CliBackend::File(b) => b.get_profile(id).await,
            CliBackend::Firestore(b) => b.get_profile(id).await,
        }
    }

    async fn find_profile(&self, username: &Username) -> Result<Option<UserProfile>> {
        match self {
            CliBackend::File(b) => b.find_profile(username).await,
            CliBackend::Firestore(b) => b.find_profile(username).await,
        }
    }

    async fn create_post(
        &self,
        author: &UserId,
        caption: &str,
        image_url: Option<&str>,
    ) -> Result<Post> {
        match self {
            CliBackend::File(b) => b.create_post(author, caption, image_url).await,
            CliBackend::Firestore(b) => b.create_post(author, caption, image_url).await,
        }
    }

    async fn delete_post(&self, author: &UserId, post: &PostId) -> Result<()> {
        match self {
            CliBackend::File(b) => b.delete_post(author, post).await,
            CliBackend::Firestore(b) => b.delete_post(author, post).await,
        }
    }

    async fn add_comment(&self, author: &UserId, post: &PostId, text: &str) -> Result<Comment> {
        match self {
            CliBackend::File(b) => b.add_comment(author, post, text).await,
            CliBackend::Firestore(b) => b.add_comment(author, post, text).await,
        }
    }

    async fn follow(&self, follower: &UserId, followee: &UserId) -> Result<Follow> {
        match self {
            CliBackend::File(b) => b.follow(follower, followee).await,
            CliBackend::Firestore(b) => b.follow(follower, followee).await,
        }
    }

    async fn unfollow(&self, follower: &UserId, followee: &UserId) -> Result<()> {
        match self {
            CliBackend::File(b) => b.unfollow(follower, followee).await,
            CliBackend::Firestore(b) => b.unfollow(follower, followee).await,
        }
    }
}

#[async_trait]
impl<Q> PagedSource<Q> for CliBackend
where
    Q: Query,
    FileBackend: PagedSource<Q>,
    FirestoreBackend: PagedSource<Q>,
{
    async fn fetch_page(
        &self,
        query: &Q,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Q::Item>> {
        match self {
            CliBackend::File(b) => b.fetch_page(query, start, limit, exclude_start).await,
            CliBackend::Firestore(b) => b.fetch_page(query, start, limit, exclude_start).await,
        }
    }
}

#[async_trait]
impl PrefixLookup for CliBackend {
    async fn exists_with_prefix(&self, collection: Collection, prefix: &str) -> Result<bool> {
        match self {
            CliBackend::File(b) => b.exists_with_prefix(collection, prefix).await,
            CliBackend::Firestore(b) => b.exists_with_prefix(collection, prefix).await,
        }
    }
}

impl<Q> LiveSource<Q> for CliBackend
where
    Q: Query,
    FileBackend: LiveSource<Q>,
    FirestoreBackend: LiveSource<Q>,
{
    fn subscribe(&self, query: &Q) -> Result<LiveStream<Q::Item>> {
        match self {
            CliBackend::File(b) => b.subscribe(query),
            CliBackend::Firestore(b) => b.subscribe(query),
        }
    }
}
