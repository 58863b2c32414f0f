//! Error types for shutter.
//!
//! One error type covers every collaborator, with explicit variants for
//! transport, protocol and input validation failures. Pagination failures
//! surfaced to list screens are wrapped in [`FeedError`](crate::feed::FeedError).

use std::fmt;
use thiserror::Error;

/// The unified error type for shutter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport errors (network, filesystem, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol errors (backend error responses, missing documents, conflicts).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (invalid id, username, store URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Shorthand for a free-form [`InvalidInputError::Other`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(InvalidInputError::Other {
            message: message.into(),
        })
    }

    /// Returns true if the backend reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Protocol(p) if p.status == 404)
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Local filesystem error.
    #[error("IO error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Protocol-level errors reported by a backend.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP-style status code.
    pub status: u16,
    /// Backend error code (if present).
    pub error: Option<String>,
    /// Error message from the backend.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// A 404 for a missing document.
    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::new(404, Some(code.to_string()), Some(message.into()))
    }

    /// A 409 for a write that collides with existing data.
    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::new(409, Some(code.to_string()), Some(message.into()))
    }

    /// A 403 for a write the acting user may not perform.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, Some("Forbidden".to_string()), Some(message.into()))
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid document identifier.
    #[error("invalid {kind} '{value}': {reason}")]
    Id {
        kind: &'static str,
        value: String,
        reason: String,
    },

    /// Invalid username.
    #[error("invalid username '{value}': {reason}")]
    Username { value: String, reason: String },

    /// Invalid store URL.
    #[error("invalid store URL '{value}': {reason}")]
    StoreUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
