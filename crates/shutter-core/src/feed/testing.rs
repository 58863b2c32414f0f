//! In-memory collaborators for engine tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use crate::traits::{PagedSource, PrefixLookup};
use crate::{Error, Result};

use super::item::{Cursor, Item, Order, SortKey};
use super::query::{Collection, LivePolicy, Query};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub at: i64,
}

impl Row {
    pub fn new(id: impl Into<String>, at: i64) -> Self {
        Self { id: id.into(), at }
    }
}

impl Item for Row {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> SortKey {
        SortKey::Time(Utc.timestamp_opt(self.at, 0).unwrap())
    }
}

/// `n` rows with distinct, increasing timestamps.
pub fn rows(n: i64) -> Vec<Row> {
    (1..=n).map(|i| Row::new(format!("row{:03}", i), i)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowQuery {
    All,
    Before(i64),
    Search(String),
}

impl Query for RowQuery {
    type Item = Row;

    fn collection(&self) -> Collection {
        match self {
            RowQuery::Search(_) => Collection::Users,
            _ => Collection::Posts,
        }
    }

    fn order(&self) -> Order {
        Order::Descending
    }

    fn live_policy(&self) -> LivePolicy {
        match self {
            RowQuery::Search(_) => LivePolicy::Ignore,
            _ => LivePolicy::Prepend,
        }
    }

    fn search_prefix(&self) -> Option<&str> {
        match self {
            RowQuery::Search(prefix) => Some(prefix),
            _ => None,
        }
    }
}

impl RowQuery {
    fn matches(&self, row: &Row) -> bool {
        match self {
            RowQuery::All => true,
            RowQuery::Before(t) => row.at < *t,
            RowQuery::Search(prefix) => row.id.starts_with(prefix.as_str()),
        }
    }
}

/// Rows held in memory, with call counters, one-shot failure injection and
/// an optional gate that holds page fetches until released.
#[derive(Debug)]
pub struct MemorySource {
    rows: Mutex<Vec<Row>>,
    fetches: AtomicUsize,
    prefix_checks: AtomicUsize,
    fail: AtomicBool,
    gate: Option<Semaphore>,
}

impl MemorySource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fetches: AtomicUsize::new(0),
            prefix_checks: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            gate: None,
        }
    }

    /// Page fetches wait for [`MemorySource::release`].
    pub fn gated(rows: Vec<Row>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(rows)
        }
    }

    pub fn release(&self, fetches: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(fetches);
        }
    }

    pub fn push(&self, row: Row) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn prefix_check_count(&self) -> usize {
        self.prefix_checks.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<()> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(Error::invalid("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PagedSource<RowQuery> for MemorySource {
    async fn fetch_page(
        &self,
        query: &RowQuery,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<Row>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.take_failure()?;

        let order = query.order();
        let mut page: Vec<Row> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| query.matches(row))
            .filter(|row| start.is_none_or(|s| order.admits(*row, s, exclude_start)))
            .cloned()
            .collect();
        page.sort_by(|a, b| order.cmp_items(a, b));
        page.truncate(limit as usize);
        Ok(page)
    }
}

#[async_trait]
impl PrefixLookup for MemorySource {
    async fn exists_with_prefix(&self, _collection: Collection, prefix: &str) -> Result<bool> {
        self.prefix_checks.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|row| row.id.starts_with(prefix)))
    }
}
