//! Runner error types.

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration and credential loading errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Input or output CSV errors.
    #[error(transparent)]
    Table(#[from] crate::table::TableError),

    /// GitHub API errors outside per-row processing.
    #[error(transparent)]
    Api(#[from] crate::github::ApiError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// Failed to read or write an output file.
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
