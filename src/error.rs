//! Error types for JsonKv operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while using the JsonKv store.
#[derive(Debug, Error)]
pub enum JsonKvError {
    /// The backing document could not be read, written or deleted.
    #[error("file not found or not accessible: {}: {source}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not a JSON object of storable values.
    #[error("invalid document {}: {source}", .path.display())]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A key, value or operand failed its type or nullability check.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("no object stored under key {0:?}")]
    ObjectNotFound(String),

    #[error("no array stored under key {0:?}")]
    ArrayNotFound(String),

    #[error("cannot divide the value stored under key {0:?} by zero")]
    DivisionByZero(String),
}

impl JsonKvError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileNotFound {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn document(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JsonKvError>;
