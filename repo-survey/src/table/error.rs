//! Table error types.

use thiserror::Error;

/// Errors that can occur while reading or writing CSV tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to read or write a file.
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content.
    #[error("Failed to parse CSV '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent.
    #[error("Missing required column '{column}' in '{path}'")]
    MissingColumn { path: String, column: String },

    /// The finished file could not be moved into place.
    #[error("Failed to replace '{path}': {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
}
