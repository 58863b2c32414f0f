//! Change feed for the file-backed store.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use shutter_core::{Error, Result};

use crate::store::{ChangeRecord, FileStore};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Entries appended to the change log after the feed was opened.
///
/// Changes are picked up by a filesystem watcher and, where watching is
/// unreliable, by polling the log every 500 ms.
pub struct ChangeFeed {
    inner: Pin<Box<dyn Stream<Item = Result<ChangeRecord>> + Send>>,
}

impl ChangeFeed {
    /// Start tailing the change log from its current end.
    ///
    /// Must be called within a tokio runtime.
    pub fn open(store: &FileStore) -> Result<Self> {
        let data_dir = store.data_dir();
        let changes_path = store.changes_path();

        std::fs::create_dir_all(&data_dir)
            .map_err(|e| Error::invalid(format!("Failed to create data directory: {}", e)))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Result<ChangeRecord>>();

        let initial_pos = std::fs::metadata(&changes_path).map(|m| m.len()).unwrap_or(0);
        let position = Arc::new(Mutex::new(initial_pos));

        let watch_position = Arc::clone(&position);
        let watch_path = changes_path.clone();
        let watch_tx = tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };

            if !matches!(
                event.kind,
                notify::EventKind::Modify(_) | notify::EventKind::Create(_)
            ) {
                return;
            }

            let is_change_log = event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|n| n == "changes.jsonl"));

            if is_change_log {
                read_new_changes(&watch_path, &watch_position, &watch_tx);
            }
        })
        .map_err(|e| Error::invalid(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&data_dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::invalid(format!("Failed to watch directory: {}", e)))?;

        tokio::spawn(async move {
            let _watcher = watcher;
            let mut interval = tokio::time::interval(POLL_INTERVAL);

            while !tx.is_closed() {
                interval.tick().await;
                read_new_changes(&changes_path, &position, &tx);
            }

            debug!("Change feed closed");
        });

        let stream = async_stream::stream! {
            while let Some(change) = rx.recv().await {
                yield change;
            }
        };

        Ok(Self {
            inner: Box::pin(stream),
        })
    }
}

impl Stream for ChangeFeed {
    type Item = Result<ChangeRecord>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Send every complete line past `position`, then advance it.
///
/// A trailing line without a newline is still being written and is left
/// for the next read.
fn read_new_changes(
    path: &Path,
    position: &Mutex<u64>,
    tx: &mpsc::UnboundedSender<Result<ChangeRecord>>,
) {
    let Ok(mut pos) = position.lock() else {
        return;
    };
    let Ok(mut file) = File::open(path) else {
        return;
    };
    if file.seek(SeekFrom::Start(*pos)).is_err() {
        return;
    }

    let mut reader = BufReader::new(file);
    let mut line = String::new();

    loop {
        line.clear();
        let read = match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        if !line.ends_with('\n') {
            break;
        }
        *pos += read as u64;

        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }

        match serde_json::from_str::<ChangeRecord>(entry) {
            Ok(record) => {
                let _ = tx.send(Ok(record));
            }
            Err(e) => warn!(error = %e, "Skipping malformed change record"),
        }
    }
}
