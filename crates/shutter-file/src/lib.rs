//! shutter-file - Filesystem-backed store for shutter.
//!
//! Documents are JSON files under `<root>/shutter/<collection>/`; every
//! create and delete is appended to `<root>/shutter/changes.jsonl`, which
//! [`ChangeFeed`] tails for realtime updates.

mod backend;
mod changes;
mod store;

pub use backend::FileBackend;
pub use changes::ChangeFeed;
pub use store::{ChangeOp, ChangeRecord, FileStore};
