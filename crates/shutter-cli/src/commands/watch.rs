//! Live tailing.

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::debug;

use shutter_core::feed::Query;
use shutter_core::models::PostQuery;
use shutter_core::traits::{LiveSource, PagedSource};

use crate::config::{CliBackend, Context};
use crate::output::{self, Row};

use super::lists::PageArgs;
use super::pager::Listing;

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub paging: PageArgs,
}

pub async fn run(ctx: &Context, args: WatchArgs) -> Result<()> {
    let viewer = ctx.acting_user().await?;
    let query = PostQuery::Feed { viewer: viewer.id };

    // One page is enough context for a tail.
    let pages = args.paging.pages.or(Some(1));
    let listing = Listing::run(ctx, query.clone(), pages).await?;
    follow_live(ctx, listing, &query).await
}

/// Print live inserts into `listing` until Ctrl+C.
pub async fn follow_live<Q>(ctx: &Context, mut listing: Listing<Q>, query: &Q) -> Result<()>
where
    Q: Query,
    Q::Item: Row,
    CliBackend: PagedSource<Q> + LiveSource<Q>,
{
    let stream = ctx
        .backend
        .subscribe(query)
        .context("Failed to subscribe to updates")?;
    let live = listing.handle.attach_live(stream);

    output::note("Watching for new items. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            event = listing.events.recv() => match event {
                Some(event) => listing.print(event)?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }
    }

    live.abort();
    Ok(())
}
