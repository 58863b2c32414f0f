//! Follow and unfollow.

use anyhow::{Context as _, Result};
use clap::Args;

use shutter_core::traits::Store;

use crate::config::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct FollowArgs {
    /// Username
    pub username: String,
}

pub async fn follow(ctx: &Context, args: FollowArgs) -> Result<()> {
    let me = ctx.acting_user().await?;
    let them = ctx.profile_named(&args.username).await?;

    let follow = ctx
        .backend
        .follow(&me.id, &them.id)
        .await
        .context("Failed to follow")?;

    if ctx.json {
        return output::json(&follow);
    }

    output::success(&format!("Following {}", them.username));
    Ok(())
}

pub async fn unfollow(ctx: &Context, args: FollowArgs) -> Result<()> {
    let me = ctx.acting_user().await?;
    let them = ctx.profile_named(&args.username).await?;

    ctx.backend
        .unfollow(&me.id, &them.id)
        .await
        .context("Failed to unfollow")?;

    output::success(&format!("No longer following {}", them.username));
    Ok(())
}
