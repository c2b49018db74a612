//! Runner configuration.

use crate::config::{ConfigError, SurveyConfig};
use crate::rate_limit::RetryPolicy;
use crate::table::parse_delimiter;

/// Configuration for probe and export runs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Input CSV delimiter.
    delimiter: u8,
    /// Output CSV delimiter.
    output_delimiter: u8,
    /// Whether rows with a filled key column are processed again.
    force: bool,
    /// Repositories probed at once.
    concurrency: usize,
    /// Repositories between output writes.
    checkpoint_every: usize,
    /// Whether to read the rate-limit endpoint before each repository.
    precheck_quota: bool,
    /// Sleep-and-retry policy for API calls.
    retry_policy: RetryPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            output_delimiter: b',',
            force: false,
            concurrency: 1,
            checkpoint_every: 1,
            precheck_quota: false,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with defaults: sequential, comma-separated,
    /// checkpoint after every repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from `survey.toml` settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a delimiter is not a single ASCII character.
    pub fn from_survey(survey: &SurveyConfig) -> Result<Self, ConfigError> {
        let delimiter = delimiter_byte(survey.run.delimiter)?;
        let output_delimiter = match survey.run.output_delimiter {
            Some(c) => delimiter_byte(c)?,
            None => delimiter,
        };

        Ok(Self::new()
            .with_delimiter(delimiter)
            .with_output_delimiter(output_delimiter)
            .with_concurrency(survey.run.concurrency)
            .with_checkpoint_every(survey.run.checkpoint_every)
            .with_precheck_quota(survey.run.precheck_quota)
            .with_retry_policy(survey.retry_policy()))
    }

    /// Sets the input delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the output delimiter.
    pub fn with_output_delimiter(mut self, delimiter: u8) -> Self {
        self.output_delimiter = delimiter;
        self
    }

    /// Reprocesses rows whose key column is already filled.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets the number of repositories probed at once (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets how many repositories pass between output writes (at least 1).
    pub fn with_checkpoint_every(mut self, checkpoint_every: usize) -> Self {
        self.checkpoint_every = checkpoint_every.max(1);
        self
    }

    /// Enables the rate-limit check before each repository.
    pub fn with_precheck_quota(mut self, precheck_quota: bool) -> Self {
        self.precheck_quota = precheck_quota;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the input delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Returns the output delimiter.
    pub fn output_delimiter(&self) -> u8 {
        self.output_delimiter
    }

    /// Returns whether filled rows are reprocessed.
    pub fn force(&self) -> bool {
        self.force
    }

    /// Returns the number of repositories probed at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the checkpoint cadence.
    pub fn checkpoint_every(&self) -> usize {
        self.checkpoint_every
    }

    /// Returns whether the quota is checked before each repository.
    pub fn precheck_quota(&self) -> bool {
        self.precheck_quota
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }
}

fn delimiter_byte(value: char) -> Result<u8, ConfigError> {
    parse_delimiter(value).map_err(|c| ConfigError::ValidationError {
        path: "survey.toml".to_string(),
        message: format!("delimiter '{c}' is not a single ASCII character"),
    })
}
