//! Error types for the planner.
//!
//! Validation failures and missing tasks are not errors: they come back as a
//! `ValidationReport` or an `Option`. What remains is storage I/O, encoding,
//! malformed imports and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the key-value persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by task store mutations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a bulk import was rejected. The store is left untouched in every case.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Import file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Import file must contain a JSON array of tasks")]
    NotAnArray,
    #[error("No valid tasks found in the file")]
    NoValidTasks,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from resolving runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a data directory; pass --data-dir or set CPLAN_DIR")]
    NoDataDir,
    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
