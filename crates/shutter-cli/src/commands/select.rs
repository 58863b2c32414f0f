//! `use`: remember settings for later commands.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;
use crate::config::Context;
use crate::config::storage::{self, StoredConfig};
use crate::output;

#[derive(Args, Debug)]
pub struct UseArgs {
    /// Act as this user from now on
    pub username: Option<String>,
}

pub async fn run(ctx: &Context, global: &GlobalArgs, args: UseArgs) -> Result<()> {
    let previous = storage::load_config()?;

    let user = match args.username.as_deref() {
        Some(username) => Some(ctx.profile_named(username).await?.username),
        None => ctx.user.clone(),
    };

    let config = StoredConfig {
        store: Some(ctx.backend.url().to_string()),
        user: user.map(String::from),
        page_size: global.page_size.or(previous.page_size),
    };
    storage::save_config(&config)?;

    if ctx.json {
        return output::json(&config);
    }

    output::success("Settings saved");
    output::field("Store", ctx.backend.url().as_str());
    if let Some(user) = &config.user {
        output::field("User", user);
    }
    if let Some(page_size) = config.page_size {
        output::field("Page size", &page_size.to_string());
    }

    Ok(())
}
