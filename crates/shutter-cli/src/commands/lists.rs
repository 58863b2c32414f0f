//! Paged list commands.

use anyhow::{Context as _, Result};
use clap::Args;

use shutter_core::models::{CommentQuery, FollowQuery, PostQuery, UserQuery};
use shutter_core::types::{PostId, UserId};

use crate::config::Context;

use super::pager::Listing;
use super::watch;

/// How far to page.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Stop after this many pages (default: until the end)
    #[arg(long)]
    pub pages: Option<u32>,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Args, Debug)]
pub struct PostsArgs {
    /// Username (defaults to the acting user)
    pub username: Option<String>,

    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Post ID
    pub post: String,

    /// Keep printing new comments until interrupted
    #[arg(long)]
    pub follow: bool,

    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Username prefix
    pub prefix: String,

    #[command(flatten)]
    pub paging: PageArgs,
}

#[derive(Args, Debug)]
pub struct FollowsArgs {
    /// Username (defaults to the acting user)
    pub username: Option<String>,

    #[command(flatten)]
    pub paging: PageArgs,
}

pub async fn feed(ctx: &Context, args: FeedArgs) -> Result<()> {
    let viewer = ctx.acting_user().await?;
    Listing::run(ctx, PostQuery::Feed { viewer: viewer.id }, args.paging.pages).await?;
    Ok(())
}

pub async fn posts(ctx: &Context, args: PostsArgs) -> Result<()> {
    let author = match args.username.as_deref() {
        Some(username) => ctx.profile_named(username).await?,
        None => ctx.acting_user().await?,
    };
    Listing::run(ctx, PostQuery::Profile { author: author.id }, args.paging.pages).await?;
    Ok(())
}

pub async fn comments(ctx: &Context, args: CommentsArgs) -> Result<()> {
    let post = PostId::new(&args.post).context("Invalid post ID")?;
    let query = CommentQuery { post };

    let listing = Listing::run(ctx, query.clone(), args.paging.pages).await?;
    if args.follow {
        watch::follow_live(ctx, listing, &query).await?;
    }
    Ok(())
}

pub async fn search(ctx: &Context, args: SearchArgs) -> Result<()> {
    Listing::run(ctx, UserQuery::search(&args.prefix), args.paging.pages).await?;
    Ok(())
}

pub async fn followers(ctx: &Context, args: FollowsArgs) -> Result<()> {
    let user = subject(ctx, args.username.as_deref()).await?;
    Listing::run(ctx, FollowQuery::Followers(user), args.paging.pages).await?;
    Ok(())
}

pub async fn following(ctx: &Context, args: FollowsArgs) -> Result<()> {
    let user = subject(ctx, args.username.as_deref()).await?;
    Listing::run(ctx, FollowQuery::Following(user), args.paging.pages).await?;
    Ok(())
}

async fn subject(ctx: &Context, username: Option<&str>) -> Result<UserId> {
    let profile = match username {
        Some(username) => ctx.profile_named(username).await?,
        None => ctx.acting_user().await?,
    };
    Ok(profile.id)
}
