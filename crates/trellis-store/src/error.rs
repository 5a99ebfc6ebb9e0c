//! Store error types

use std::time::Duration;

use thiserror::Error;
use trellis_core::limits::ValidationError;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store-specific error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Duplicate note: {0}")]
    Duplicate(String),

    #[error("Invalid note: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// The target does not exist (as opposed to the store being unreachable)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Status { status: 404, .. })
    }

    /// The store could not be reached or answered garbage
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Serialization(_) => true,
            Self::Status { status, .. } => *status >= 500,
            #[cfg(feature = "http")]
            Self::Http(_) => true,
            _ => false,
        }
    }
}
