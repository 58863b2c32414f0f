//! shutter-firestore - Firestore REST backend for shutter.
//!
//! Talks to the Firestore documents API (or its emulator) over HTTPS:
//! pages are `:runQuery` structured queries with a `startAt` cursor, and
//! realtime updates come from polling the head of a query.

mod backend;
mod client;
mod document;
mod query;

pub use backend::{DEFAULT_POLL_INTERVAL, FirestoreBackend, MAX_IN_VALUES};
pub use client::FirestoreClient;
pub use document::{Document, FirestoreDocument};
pub use query::{FieldOp, Filter, StructuredQuery};
