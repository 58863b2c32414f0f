//! Drives a feed engine page by page and prints what it yields.

use anyhow::{Context as _, Result, anyhow, bail};
use tokio::sync::mpsc;
use tracing::debug;

use shutter_core::feed::{FeedEngine, FeedEvent, FeedHandle, Query, Settlement};
use shutter_core::traits::PagedSource;

use crate::config::{CliBackend, Context};
use crate::output::{self, Printer, Row};

/// A listing in progress.
pub struct Listing<Q: Query> {
    pub handle: FeedHandle<Q>,
    pub events: mpsc::UnboundedReceiver<FeedEvent<Q::Item>>,
    pub printer: Printer,
}

impl<Q> Listing<Q>
where
    Q: Query,
    Q::Item: Row,
    CliBackend: PagedSource<Q>,
{
    /// Start an engine for `query` and print up to `pages` pages.
    ///
    /// With no limit, pages until the list is exhausted.
    pub async fn run(ctx: &Context, query: Q, pages: Option<u32>) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let handle = FeedEngine::spawn(ctx.backend.clone(), ctx.paginator()?, tx);
        let mut listing = Self {
            handle,
            events,
            printer: Printer::new(ctx.json),
        };

        let mut settlement = listing.handle.load(query).await;
        let mut fetched = 0u32;

        loop {
            let status = match settlement {
                Settlement::Applied(status) => status,
                Settlement::Failed(err) => {
                    listing.drain()?;
                    return Err(anyhow!(err)).context("Failed to load list");
                }
                Settlement::Closed => bail!("Feed engine stopped"),
                Settlement::Ignored | Settlement::Superseded => break,
            };

            listing.drain()?;
            fetched += 1;
            debug!(pages = fetched, len = status.len, exhausted = status.exhausted, "Page settled");

            if status.exhausted || pages.is_some_and(|limit| fetched >= limit) {
                break;
            }
            settlement = listing.handle.load_more().await;
        }

        Ok(listing)
    }

    /// Print every event already delivered.
    pub fn drain(&mut self) -> Result<()> {
        while let Ok(event) = self.events.try_recv() {
            self.print(event)?;
        }
        Ok(())
    }

    /// Print one event.
    pub fn print(&self, event: FeedEvent<Q::Item>) -> Result<()> {
        match event {
            FeedEvent::ItemsReplaced(items) | FeedEvent::ItemsAppended { items, .. } => {
                for item in &items {
                    self.printer.row(item)?;
                }
            }
            FeedEvent::ItemInserted { item, .. } => self.printer.live_row(&item)?,
            FeedEvent::NoResult => output::note("No results."),
            FeedEvent::RefreshCompleted | FeedEvent::FetchFailed(_) => {}
        }
        Ok(())
    }
}
