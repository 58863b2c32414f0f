//! Profile commands.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use shutter_core::traits::Store;
use shutter_core::types::Username;

use crate::config::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create a profile
    Create {
        /// Username (lowercase letters, digits, '.', '_')
        username: String,

        /// Display name
        #[arg(long)]
        name: String,
    },

    /// Show a profile (defaults to the acting user)
    Show {
        /// Username
        username: Option<String>,
    },
}

pub async fn handle(ctx: &Context, cmd: ProfileCommand) -> Result<()> {
    match cmd.command {
        ProfileCommands::Create { username, name } => create(ctx, &username, &name).await,
        ProfileCommands::Show { username } => show(ctx, username.as_deref()).await,
    }
}

async fn create(ctx: &Context, username: &str, full_name: &str) -> Result<()> {
    let username = Username::new(username).context("Invalid username")?;

    let profile = ctx
        .backend
        .create_profile(&username, full_name)
        .await
        .context("Failed to create profile")?;

    if ctx.json {
        return output::json(&profile);
    }

    output::success("Profile created");
    output::field("Username", profile.username.as_str());
    output::field("ID", profile.id.as_str());

    Ok(())
}

async fn show(ctx: &Context, username: Option<&str>) -> Result<()> {
    let profile = match username {
        Some(username) => ctx.profile_named(username).await?,
        None => ctx.acting_user().await?,
    };

    if ctx.json {
        return output::json(&profile);
    }

    output::field("Username", profile.username.as_str());
    output::field("Name", &profile.full_name);
    if let Some(bio) = &profile.bio {
        output::field("Bio", bio);
    }
    if let Some(avatar) = &profile.avatar_url {
        output::field("Avatar", avatar);
    }
    output::field("ID", profile.id.as_str());
    output::field("Joined", &profile.created_at.to_rfc3339());

    Ok(())
}
