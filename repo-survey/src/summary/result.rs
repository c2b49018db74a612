//! Per-row outcome types.

/// Result of processing a single CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    /// The probe ran and its values were written.
    Success {
        /// Repository full name.
        repository: String,
    },

    /// The key column was already filled.
    Skipped {
        /// Value of the `html_url` cell.
        url: String,
    },

    /// The row is outside the probe's scope (for example its language);
    /// its columns were set null without calling the API.
    OutOfScope {
        /// Value of the `html_url` cell.
        url: String,
    },

    /// The URL is not a GitHub repository URL.
    Unsupported {
        /// Value of the `html_url` cell.
        url: String,
    },

    /// The row has no URL.
    MissingUrl,

    /// The API failed for this row; its columns were set null.
    Failed {
        /// Repository full name.
        repository: String,
        /// Error message.
        error: String,
    },
}
