//! Cursor pagination state for one list.
//!
//! [`Paginator`] is the synchronous half of the engine: it decides which
//! fetch to issue, and merges each completion into the list exactly once.
//! It never performs I/O itself; a [`FetchRequest`] is run against the
//! collaborators and its outcome handed back through
//! [`Paginator::complete`]. [`FeedEngine`](super::FeedEngine) drives it on a
//! single task.

use std::collections::HashSet;
use std::num::NonZeroU32;

use tracing::{debug, trace, warn};

use crate::traits::{PagedSource, PrefixLookup};
use crate::{Error, Result};

use super::error::FeedError;
use super::item::{Cursor, Item};
use super::observer::FeedObserver;
use super::query::{LivePolicy, Query};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

const DEFAULT_PAGE_SIZE_NZ: NonZeroU32 = match NonZeroU32::new(DEFAULT_PAGE_SIZE) {
    Some(n) => n,
    None => panic!("default page size must be non-zero"),
};

/// Paginator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Items requested per page.
    pub page_size: NonZeroU32,
}

impl PaginatorConfig {
    /// Settings with the given page size.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_size` is zero.
    pub fn new(page_size: u32) -> Result<Self> {
        NonZeroU32::new(page_size)
            .map(|page_size| Self { page_size })
            .ok_or_else(|| Error::invalid("page size must be at least 1"))
    }
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE_NZ,
        }
    }
}

/// Whether a list has been queried, and whether that found anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultState {
    /// Nothing has been asked yet (or a search was cleared).
    #[default]
    NotQueried,
    /// The last load or refresh found nothing.
    Empty,
    /// The list has items.
    HasResults,
}

/// Which trigger issued a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Load,
    LoadMore,
    Refresh,
}

/// Identifies one issued fetch; only the latest one may be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A fetch to run against the collaborators.
#[derive(Debug, Clone)]
pub struct FetchRequest<Q: Query> {
    pub ticket: Ticket,
    pub kind: FetchKind,
    pub query: Q,
    /// Boundary of the last page, for `LoadMore`.
    pub start: Option<Cursor>,
    pub limit: u32,
}

/// What a fetch returned.
#[derive(Debug, Clone)]
pub enum Fetched<T> {
    /// A raw page, boundary item included.
    Page(Vec<T>),
    /// The prefix check found no candidates; no page was fetched.
    NoMatches,
}

impl<Q: Query> FetchRequest<Q> {
    /// Run the request: check the prefix for searches, then fetch the page.
    ///
    /// Pages are always requested with an inclusive start; the paginator
    /// drops the boundary item itself.
    pub async fn run<S>(&self, source: &S) -> std::result::Result<Fetched<Q::Item>, FeedError>
    where
        S: PagedSource<Q> + PrefixLookup + ?Sized,
    {
        if self.start.is_none()
            && let Some(prefix) = self.query.search_prefix()
        {
            let exists = source
                .exists_with_prefix(self.query.collection(), prefix)
                .await
                .map_err(FeedError::prefix_check)?;

            if !exists {
                debug!(prefix, collection = %self.query.collection(), "No documents match prefix");
                return Ok(Fetched::NoMatches);
            }
        }

        let page = source
            .fetch_page(
                &self.query,
                self.start.as_ref(),
                self.limit,
                false,
            )
            .await
            .map_err(FeedError::fetch)?;

        trace!(kind = ?self.kind, fetched = page.len(), limit = self.limit, "Fetched page");

        Ok(Fetched::Page(page))
    }
}

/// How a completion was handled.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Merged into the list.
    Applied,
    /// A newer request superseded it; discarded.
    Stale,
    /// Reported to the observer; the list is unchanged.
    Failed(FeedError),
}

/// A snapshot of a paginator's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedStatus {
    pub len: usize,
    pub exhausted: bool,
    pub refreshing: bool,
    pub fetching: bool,
    pub state: ResultState,
    pub cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    ticket: Ticket,
    kind: FetchKind,
}

/// Pagination state for one list screen.
#[derive(Debug)]
pub struct Paginator<Q: Query> {
    config: PaginatorConfig,
    query: Option<Q>,
    items: Vec<Q::Item>,
    seen: HashSet<String>,
    cursor: Option<Cursor>,
    exhausted: bool,
    refreshing: bool,
    state: ResultState,
    pending: Option<Pending>,
    next_ticket: u64,
}

impl<Q: Query> Paginator<Q> {
    /// An empty paginator.
    pub fn new(config: PaginatorConfig) -> Self {
        Self {
            config,
            query: None,
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: None,
            exhausted: false,
            refreshing: false,
            state: ResultState::NotQueried,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn items(&self) -> &[Q::Item] {
        &self.items
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// The query of the last successful load or refresh.
    pub fn query(&self) -> Option<&Q> {
        self.query.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn result_state(&self) -> ResultState {
        self.state
    }

    pub fn status(&self) -> FeedStatus {
        FeedStatus {
            len: self.items.len(),
            exhausted: self.exhausted,
            refreshing: self.refreshing,
            fetching: self.pending.is_some(),
            state: self.state,
            cursor: self.cursor.clone(),
        }
    }

    /// Start loading `query` from the beginning.
    ///
    /// Supersedes any fetch in flight. A search with a blank prefix clears
    /// the list instead and returns `None`.
    pub fn load(
        &mut self,
        query: Q,
        observer: &mut dyn FeedObserver<Q::Item>,
    ) -> Option<FetchRequest<Q>> {
        if query.search_prefix().is_some_and(|p| p.trim().is_empty()) {
            self.clear(observer);
            return None;
        }

        let ticket = self.issue(FetchKind::Load);
        Some(FetchRequest {
            ticket,
            kind: FetchKind::Load,
            query,
            start: None,
            limit: self.config.page_size.get(),
        })
    }

    /// Start fetching the page after the cursor.
    ///
    /// Returns `None` (and changes nothing) before the first page, once
    /// exhausted, or while any fetch is in flight.
    pub fn load_more(&mut self) -> Option<FetchRequest<Q>> {
        if let Some(pending) = self.pending {
            trace!(in_flight = ?pending.kind, "Ignoring load_more while a fetch is in flight");
            return None;
        }

        if self.exhausted {
            trace!("Ignoring load_more on an exhausted list");
            return None;
        }

        let (Some(query), Some(cursor)) = (self.query.clone(), self.cursor.clone()) else {
            trace!("Ignoring load_more before the first page");
            return None;
        };

        let ticket = self.issue(FetchKind::LoadMore);
        Some(FetchRequest {
            ticket,
            kind: FetchKind::LoadMore,
            query,
            start: Some(cursor),
            // One extra for the boundary item the backend returns again.
            limit: self.config.page_size.get().saturating_add(1),
        })
    }

    /// Start re-fetching the first page of the current query.
    ///
    /// Supersedes a `load_more` or refresh in flight. A `load` in flight is
    /// already fetching the first page of the newest query, so the refresh
    /// joins it instead: `refreshing` is set, `None` is returned, and the
    /// load's completion ends the refresh. Also returns `None` before the
    /// first successful load.
    pub fn refresh(&mut self) -> Option<FetchRequest<Q>> {
        if self.pending.is_some_and(|p| p.kind == FetchKind::Load) {
            debug!("Refresh joins the load in flight");
            self.refreshing = true;
            return None;
        }

        let Some(query) = self.query.clone() else {
            debug!("Ignoring refresh before the first load");
            return None;
        };

        self.refreshing = true;
        let ticket = self.issue(FetchKind::Refresh);
        Some(FetchRequest {
            ticket,
            kind: FetchKind::Refresh,
            query,
            start: None,
            limit: self.config.page_size.get(),
        })
    }

    /// Merge the outcome of `request`.
    pub fn complete(
        &mut self,
        request: FetchRequest<Q>,
        outcome: std::result::Result<Fetched<Q::Item>, FeedError>,
        observer: &mut dyn FeedObserver<Q::Item>,
    ) -> Completion {
        if self.pending.map(|p| p.ticket) != Some(request.ticket) {
            debug!(kind = ?request.kind, "Discarding stale completion");
            return Completion::Stale;
        }
        self.pending = None;

        let resets = request.kind != FetchKind::LoadMore;

        match outcome {
            Err(error) => {
                warn!(kind = ?request.kind, %error, "Fetch failed");
                observer.on_fetch_failed(&error);
                if resets {
                    self.finish_refresh(observer);
                }
                Completion::Failed(error)
            }
            Ok(fetched) if resets => {
                self.finish_refresh(observer);
                self.replace(request, fetched, observer);
                Completion::Applied
            }
            Ok(fetched) => {
                self.append(request, fetched, observer);
                Completion::Applied
            }
        }
    }

    /// Merge an item pushed by a realtime subscription.
    ///
    /// Prepended for queries with [`LivePolicy::Prepend`]; the cursor is
    /// never touched.
    pub fn insert_live(&mut self, item: Q::Item, observer: &mut dyn FeedObserver<Q::Item>) {
        let Some(query) = &self.query else {
            trace!(id = item.id(), "Ignoring live item before the first load");
            return;
        };

        if query.live_policy() == LivePolicy::Ignore {
            return;
        }

        if !self.seen.insert(item.id().to_string()) {
            trace!(id = item.id(), "Ignoring live item already in the list");
            return;
        }

        self.items.insert(0, item);
        self.state = ResultState::HasResults;
        observer.on_item_inserted(&self.items[0], 0);
    }

    /// Drop everything and go back to [`ResultState::NotQueried`].
    pub fn clear(&mut self, observer: &mut dyn FeedObserver<Q::Item>) {
        if let Some(pending) = self.pending.take() {
            debug!(kind = ?pending.kind, "Dropping in-flight fetch");
        }

        self.query = None;
        self.items.clear();
        self.seen.clear();
        self.cursor = None;
        self.exhausted = false;
        self.state = ResultState::NotQueried;
        self.finish_refresh(observer);
        observer.on_items_replaced(&[]);
    }

    fn issue(&mut self, kind: FetchKind) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);

        if let Some(previous) = self.pending.replace(Pending { ticket, kind }) {
            debug!(superseded = ?previous.kind, by = ?kind, "Superseding in-flight fetch");
        }

        ticket
    }

    fn finish_refresh(&mut self, observer: &mut dyn FeedObserver<Q::Item>) {
        if self.refreshing {
            self.refreshing = false;
            observer.on_refresh_completed();
        }
    }

    fn replace(
        &mut self,
        request: FetchRequest<Q>,
        fetched: Fetched<Q::Item>,
        observer: &mut dyn FeedObserver<Q::Item>,
    ) {
        let page = match fetched {
            Fetched::Page(page) => page,
            Fetched::NoMatches => Vec::new(),
        };
        let fetched_len = page.len();

        self.items.clear();
        self.seen.clear();
        for item in page {
            if self.seen.insert(item.id().to_string()) {
                self.items.push(item);
            }
        }

        self.cursor = self.items.last().map(Cursor::at);
        self.exhausted = fetched_len < request.limit as usize;
        self.query = Some(request.query);

        debug!(
            len = self.items.len(),
            exhausted = self.exhausted,
            "Replaced list"
        );

        if self.items.is_empty() {
            self.state = ResultState::Empty;
            observer.on_no_result();
        } else {
            self.state = ResultState::HasResults;
            observer.on_items_replaced(&self.items);
        }
    }

    fn append(
        &mut self,
        request: FetchRequest<Q>,
        fetched: Fetched<Q::Item>,
        observer: &mut dyn FeedObserver<Q::Item>,
    ) {
        let page = match fetched {
            Fetched::Page(page) => page,
            Fetched::NoMatches => Vec::new(),
        };
        let fetched_len = page.len();
        let boundary = request.start.as_ref();

        let mut fresh = Vec::with_capacity(fetched_len);
        for (index, item) in page.into_iter().enumerate() {
            if index == 0 && boundary.is_some_and(|b| b.id() == item.id()) {
                continue;
            }
            if !self.seen.insert(item.id().to_string()) {
                trace!(id = item.id(), "Dropping duplicate item");
                continue;
            }
            fresh.push(item);
        }

        self.exhausted = fetched_len < request.limit as usize;

        if fresh.is_empty() {
            if !self.exhausted {
                // The page only repeated rows already listed; paging from the
                // same cursor would return it again.
                warn!(fetched = fetched_len, "Page added no new items; stopping");
                self.exhausted = true;
            }
            return;
        }

        let at = self.items.len();
        self.items.extend(fresh);

        let order = request.query.order();
        if let Some(last) = self.items.last() {
            let next = Cursor::at(last);
            match &self.cursor {
                Some(current) if !next.is_after(current, order) => {
                    warn!(cursor = %current.key(), "Page did not advance the cursor; keeping it");
                }
                _ => self.cursor = Some(next),
            }
        }

        debug!(
            appended = self.items.len() - at,
            len = self.items.len(),
            exhausted = self.exhausted,
            "Appended page"
        );

        observer.on_items_appended(&self.items[at..], at);
    }
}
