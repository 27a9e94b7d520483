//! Error types for the registry store

use std::io;

use camino::Utf8PathBuf;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading or writing the registry file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The registry file exists but could not be read
    #[error("reading registry file {path}")]
    Read {
        /// Path of the registry file
        path: Utf8PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The registry file does not contain a valid registry document
    #[error("registry file {path} is corrupt")]
    Corrupt {
        /// Path of the registry file
        path: Utf8PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The registry document could not be encoded
    #[error("encoding registry file")]
    Encode(#[source] serde_json::Error),

    /// The registry file could not be written
    #[error("writing registry file {path}")]
    Write {
        /// Path of the registry file
        path: Utf8PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The blocking write task panicked or was cancelled
    #[error("registry file task failed")]
    Task(#[from] tokio::task::JoinError),
}
