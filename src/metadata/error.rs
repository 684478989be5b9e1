//! Error types for metadata persistence.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while writing the store to disk.
///
/// The in-memory mutation that triggered the write has already been applied
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The metadata document could not be serialised.
    #[error("failed to serialise metadata: {0}")]
    Serialise(#[from] serde_json::Error),

    /// The metadata file could not be written.
    #[error("failed to write metadata file {path}: {source}")]
    Persist {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
