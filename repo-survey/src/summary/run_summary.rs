//! Run summary types.

use super::result::ProcessingResult;

/// Summary of one probe or export run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// What was run (probe name or command).
    pub label: String,

    /// Rows of the current input.
    pub rows_total: usize,

    /// Rows whose values were written.
    pub processed: usize,

    /// Rows skipped because their key column was filled.
    pub skipped: usize,

    /// Rows the probe does not apply to.
    pub out_of_scope: usize,

    /// Rows whose URL is not a GitHub repository.
    pub unsupported: usize,

    /// Rows without a URL.
    pub missing_url: usize,

    /// Rows whose API calls failed.
    pub failed: usize,

    /// Repositories that could not be resolved, for the final report.
    pub unresolved: Vec<String>,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: &ProcessingResult) {
        match result {
            ProcessingResult::Success { .. } => self.processed += 1,
            ProcessingResult::Skipped { .. } => self.skipped += 1,
            ProcessingResult::OutOfScope { .. } => self.out_of_scope += 1,
            ProcessingResult::Unsupported { url } => {
                self.unsupported += 1;
                self.unresolved.push(url.clone());
            }
            ProcessingResult::MissingUrl => self.missing_url += 1,
            ProcessingResult::Failed { repository, .. } => {
                self.failed += 1;
                self.unresolved.push(repository.clone());
            }
        }
    }

    /// Returns true if any row could not be resolved.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.unsupported > 0 || self.missing_url > 0
    }

    /// Returns true if every row was processed or skipped.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures()
    }
}
