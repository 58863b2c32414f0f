//! shutter - browse and populate a shutter network from the terminal.
//!
//! A thin wrapper over `shutter-core`: every list command pages through the
//! same feed engine a screen would use.

mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{lists, posts, profile, select, social, watch};
use config::Context;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let ctx = Context::load(&cli.global)?;

    match cli.command {
        Commands::Profile(cmd) => profile::handle(&ctx, cmd).await,
        Commands::Use(args) => select::run(&ctx, &cli.global, args).await,
        Commands::Post(args) => posts::create(&ctx, args).await,
        Commands::DeletePost(args) => posts::delete(&ctx, args).await,
        Commands::Comment(args) => posts::comment(&ctx, args).await,
        Commands::Follow(args) => social::follow(&ctx, args).await,
        Commands::Unfollow(args) => social::unfollow(&ctx, args).await,
        Commands::Feed(args) => lists::feed(&ctx, args).await,
        Commands::Posts(args) => lists::posts(&ctx, args).await,
        Commands::Comments(args) => lists::comments(&ctx, args).await,
        Commands::Search(args) => lists::search(&ctx, args).await,
        Commands::Followers(args) => lists::followers(&ctx, args).await,
        Commands::Following(args) => lists::following(&ctx, args).await,
        Commands::Watch(args) => watch::run(&ctx, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
