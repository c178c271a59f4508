//! Error types for mfs_explorer

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for mfs_explorer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mfs_explorer operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Node returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid CID: {0}")]
    InvalidCid(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error(
        "{operation} failed for {} of {} entries ({})",
        .failed.len(),
        .failed.len() + .completed.len(),
        BatchFailure::summary(.failed)
    )]
    Batch {
        operation: &'static str,
        failed: Vec<BatchFailure>,
        completed: Vec<String>,
    },
}

impl Error {
    /// Whether the error means the addressed entry is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// One failed entry of a batch operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Entry name as passed by the caller
    pub name: String,
    /// Rendered error for that entry
    pub message: String,
}

impl BatchFailure {
    pub fn new(name: impl Into<String>, error: &Error) -> Self {
        BatchFailure {
            name: name.into(),
            message: error.to_string(),
        }
    }

    fn summary(failed: &[BatchFailure]) -> String {
        failed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}
