//! Filesystem storage for the file-backed store.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use shutter_core::feed::{Collection, Cursor, Item, Order};
use shutter_core::{Error, Result};

fn map_json(err: serde_json::Error) -> Error {
    Error::invalid(format!("malformed document: {}", err))
}

/// An entry in the change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// The collection the document belongs to.
    pub collection: Collection,
    /// The document id.
    pub id: String,
    /// What happened to it.
    pub op: ChangeOp,
    /// When it happened.
    pub time: DateTime<Utc>,
}

/// The type of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    /// A document was written for the first time.
    Create,
    /// A document was removed.
    Delete,
}

/// JSON documents in one directory per collection, plus an append-only
/// change log.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything this store writes.
    pub(crate) fn data_dir(&self) -> PathBuf {
        self.root.join("shutter")
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.data_dir().join(collection.as_str())
    }

    fn document_path(&self, collection: Collection, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }

    /// Get the change log path.
    pub(crate) fn changes_path(&self) -> PathBuf {
        self.data_dir().join("changes.jsonl")
    }

    fn changes_lock_path(&self) -> PathBuf {
        self.data_dir().join("changes.lock")
    }

    /// Generate a new document id.
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Append an entry to the change log under an exclusive lock.
    fn append_change(&self, collection: Collection, id: &str, op: ChangeOp) -> Result<()> {
        let changes_path = self.changes_path();
        fs::create_dir_all(self.data_dir())?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.changes_lock_path())?;

        lock_file.lock_exclusive()?;

        let record = ChangeRecord {
            collection,
            id: id.to_string(),
            op,
            time: Utc::now(),
        };
        let line = serde_json::to_string(&record).map_err(map_json)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&changes_path)?;
        writeln!(file, "{}", line)?;
        file.sync_data()?;

        lock_file.unlock()?;

        Ok(())
    }

    /// Write a document, replacing any previous version.
    ///
    /// Only the first write of an id is logged as a change.
    #[instrument(skip(self, document))]
    pub fn put<T: Serialize>(&self, collection: Collection, id: &str, document: &T) -> Result<()> {
        let path = self.document_path(collection, id);
        let created = !path.exists();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(document).map_err(map_json)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;

        if created {
            self.append_change(collection, id, ChangeOp::Create)?;
        }

        debug!(%collection, id, created, "Wrote document");

        Ok(())
    }

    /// Read a document, if it exists.
    pub fn get<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> Result<Option<T>> {
        let path = self.document_path(collection, id);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let document = serde_json::from_str(&content).map_err(map_json)?;

        Ok(Some(document))
    }

    /// Remove a document. Returns false if it did not exist.
    #[instrument(skip(self))]
    pub fn remove(&self, collection: Collection, id: &str) -> Result<bool> {
        let path = self.document_path(collection, id);

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path)?;
        self.append_change(collection, id, ChangeOp::Delete)?;

        debug!(%collection, id, "Removed document");

        Ok(true)
    }

    /// Read every document in a collection, in no particular order.
    ///
    /// Documents that fail to parse are skipped.
    pub fn scan<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let dir = self.collection_dir(collection);

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(document) => documents.push(document),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping malformed document"),
            }
        }

        Ok(documents)
    }

    /// One page of the documents in `collection` that satisfy `filter`.
    ///
    /// Sorted by `(sort key, id)` in `order`; starts at the position of
    /// `start` (strictly after it with `exclude_start`).
    pub fn page<T, F>(
        &self,
        collection: Collection,
        order: Order,
        filter: F,
        start: Option<&Cursor>,
        limit: u32,
        exclude_start: bool,
    ) -> Result<Vec<T>>
    where
        T: Item + DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut documents: Vec<T> = self
            .scan(collection)?
            .into_iter()
            .filter(|doc| filter(doc))
            .filter(|doc| start.is_none_or(|s| order.admits(doc, s, exclude_start)))
            .collect();

        documents.sort_by(|a, b| order.cmp_items(a, b));
        documents.truncate(limit as usize);

        Ok(documents)
    }
}
