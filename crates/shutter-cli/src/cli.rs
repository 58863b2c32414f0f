//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};

use crate::commands::{lists, posts, profile, select, social, watch};

/// Browse and populate a shutter network.
#[derive(Parser, Debug)]
#[command(name = "shutter")]
#[command(author, version = env!("SHUTTER_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Store URL: file:///path for a local store, or a Firestore documents root
    #[arg(long, env = "SHUTTER_STORE", global = true)]
    pub store: Option<String>,

    /// Act as this user
    #[arg(long = "as", env = "SHUTTER_USER", global = true, value_name = "USERNAME")]
    pub user: Option<String>,

    /// Items per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Bearer token for hosted stores
    #[arg(long, env = "SHUTTER_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Print JSON lines instead of formatted rows
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile operations
    Profile(profile::ProfileCommand),

    /// Remember the store, acting user and page size for later commands
    Use(select::UseArgs),

    /// Publish a post
    Post(posts::PostArgs),

    /// Delete one of your posts
    DeletePost(posts::DeletePostArgs),

    /// Comment on a post
    Comment(posts::CommentArgs),

    /// Follow a user
    Follow(social::FollowArgs),

    /// Stop following a user
    Unfollow(social::FollowArgs),

    /// Your home feed
    Feed(lists::FeedArgs),

    /// A user's posts
    Posts(lists::PostsArgs),

    /// Comments on a post
    Comments(lists::CommentsArgs),

    /// Search users by username prefix
    Search(lists::SearchArgs),

    /// Who follows a user
    Followers(lists::FollowsArgs),

    /// Whom a user follows
    Following(lists::FollowsArgs),

    /// Print your feed, then new posts as they arrive
    Watch(watch::WatchArgs),
}
