//! Realtime updates for backends without push, by polling the first page.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::traits::{LiveStream, PagedSource};

use super::item::Cursor;
use super::query::Query;

/// Poll the head of `query` every `every` and yield items that appear above
/// the newest one seen so far.
///
/// The first successful poll only records the head. Later polls fetch up to
/// `window` items and yield the new ones oldest first, so prepending each in
/// turn leaves the newest at index 0. Failed polls are yielded as errors and
/// polling continues.
pub fn poll_live<Q, S>(source: Arc<S>, query: Q, every: Duration, window: u32) -> LiveStream<Q::Item>
where
    Q: Query,
    S: PagedSource<Q> + ?Sized + 'static,
{
    let order = query.order();

    let stream = async_stream::stream! {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut head: Option<Cursor> = None;
        let mut primed = false;

        loop {
            ticker.tick().await;

            let page = match source.fetch_page(&query, None, window, false).await {
                Ok(page) => page,
                Err(error) => {
                    yield Err(error);
                    continue;
                }
            };

            if !primed {
                head = page.first().map(Cursor::at);
                primed = true;
                trace!(collection = %query.collection(), "Live poll primed");
                continue;
            }

            let fresh: Vec<_> = page
                .into_iter()
                .take_while(|item| head.as_ref().is_none_or(|h| h.is_after(&Cursor::at(item), order)))
                .collect();

            if let Some(newest) = fresh.first() {
                head = Some(Cursor::at(newest));
            }

            for item in fresh.into_iter().rev() {
                yield Ok(item);
            }
        }
    };

    LiveStream::new(stream)
}
