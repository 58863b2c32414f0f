//! Post and comment writes.

use anyhow::{Context as _, Result};
use clap::Args;

use shutter_core::traits::Store;
use shutter_core::types::PostId;

use crate::config::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Caption
    pub caption: String,

    /// URL of the uploaded image
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeletePostArgs {
    /// Post ID
    pub post: String,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Post ID
    pub post: String,

    /// Comment text
    pub text: String,
}

pub async fn create(ctx: &Context, args: PostArgs) -> Result<()> {
    let author = ctx.acting_user().await?;

    let post = ctx
        .backend
        .create_post(&author.id, &args.caption, args.image.as_deref())
        .await
        .context("Failed to create post")?;

    if ctx.json {
        return output::json(&post);
    }

    output::success("Posted");
    output::field("ID", post.id.as_str());
    Ok(())
}

pub async fn delete(ctx: &Context, args: DeletePostArgs) -> Result<()> {
    let author = ctx.acting_user().await?;
    let post = PostId::new(&args.post).context("Invalid post ID")?;

    ctx.backend
        .delete_post(&author.id, &post)
        .await
        .context("Failed to delete post")?;

    output::success(&format!("Deleted {}", post));
    Ok(())
}

pub async fn comment(ctx: &Context, args: CommentArgs) -> Result<()> {
    let author = ctx.acting_user().await?;
    let post = PostId::new(&args.post).context("Invalid post ID")?;

    let comment = ctx
        .backend
        .add_comment(&author.id, &post, &args.text)
        .await
        .context("Failed to add comment")?;

    if ctx.json {
        return output::json(&comment);
    }

    output::success("Commented");
    output::field("ID", comment.id.as_str());
    Ok(())
}
