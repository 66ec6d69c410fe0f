//! Error types for the router inventory
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

use crate::reconcile::DiffAction;

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the router inventory
#[derive(Error, Debug)]
pub enum Error {
    /// A unique-key lookup returned the wrong number of rows
    ///
    /// Never retried: it means the uniqueness invariant on `unique_name`
    /// is broken or two writers raced on the same router.
    #[error("unexpected cardinality for unique key lookup of router {unique_name}: found {found}")]
    Consistency {
        /// Router natural key that was looked up
        unique_name: String,
        /// Number of rows the store returned
        found: usize,
    },

    /// Operation needs a storage-assigned identity the record does not have
    #[error("Missing identity: {0}")]
    MissingIdentity(String),

    /// Persistence engine errors
    #[error("Store error: {0}")]
    Store(String),

    /// A diff action failed while being applied
    #[error("Failed to apply {action} to {record}: {source}")]
    ActionFailed {
        /// The action being applied
        action: DiffAction,
        /// Human readable description of the record
        record: String,
        /// Underlying store error
        #[source]
        source: Box<Error>,
    },

    /// Poller errors
    #[error("Poll error: {0}")]
    Poll(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a consistency error
    pub fn consistency(unique_name: impl Into<String>, found: usize) -> Self {
        Self::Consistency {
            unique_name: unique_name.into(),
            found,
        }
    }

    /// Create a missing identity error
    pub fn missing_identity(msg: impl Into<String>) -> Self {
        Self::MissingIdentity(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a poll error
    pub fn poll(msg: impl Into<String>) -> Self {
        Self::Poll(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with the diff action that produced it
    pub fn action_failed(action: DiffAction, record: impl Into<String>, source: Error) -> Self {
        Self::ActionFailed {
            action,
            record: record.into(),
            source: Box::new(source),
        }
    }

    /// True for errors that indicate corrupted invariants
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Consistency { .. } => true,
            Self::ActionFailed { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
