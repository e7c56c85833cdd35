//! Storage error types

use thiserror::Error;

/// Errors that can occur while writing or reading a run directory
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run directory already exists: {0}")]
    RunDirExists(String),

    #[error("Manifest already holds a record for {0}")]
    DuplicateRecord(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
