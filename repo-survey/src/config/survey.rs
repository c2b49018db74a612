//! `survey.toml` deserialization.

use super::ConfigError;
use crate::rate_limit::{RetryPolicy, WaitStrategy};
use crate::table::parse_delimiter;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How to wait once the quota is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Sleep `fixed-wait-secs` every time.
    Fixed,
    /// Sleep until the reported reset.
    #[default]
    UntilReset,
}

/// The `[rate-limit]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RateLimitSettings {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Fixed sleep, also used when no reset time is reported.
    #[serde(default = "default_fixed_wait_secs")]
    pub fixed_wait_secs: u64,

    /// Margin added after the reported reset.
    #[serde(default = "default_reset_buffer_secs")]
    pub reset_buffer_secs: u64,

    /// Bound on retries; unbounded when absent.
    pub max_retries: Option<u32>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            fixed_wait_secs: default_fixed_wait_secs(),
            reset_buffer_secs: default_reset_buffer_secs(),
            max_retries: None,
        }
    }
}

/// The `[run]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunSettings {
    /// Write the output after this many repositories.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Repositories probed at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Read the rate-limit endpoint before each repository.
    #[serde(default)]
    pub precheck_quota: bool,

    /// Input delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Output delimiter; the input delimiter when absent.
    pub output_delimiter: Option<char>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            checkpoint_every: default_checkpoint_every(),
            concurrency: default_concurrency(),
            precheck_quota: false,
            delimiter: default_delimiter(),
            output_delimiter: None,
        }
    }
}

pub(crate) fn default_fixed_wait_secs() -> u64 {
    20 * 60
}

pub(crate) fn default_reset_buffer_secs() -> u64 {
    60
}

pub(crate) fn default_checkpoint_every() -> usize {
    1
}

pub(crate) fn default_concurrency() -> usize {
    1
}

pub(crate) fn default_delimiter() -> char {
    ','
}

/// Parsed `survey.toml`. Every key is optional.
///
/// ```toml
/// [rate-limit]
/// strategy = "fixed"
/// fixed-wait-secs = 900
///
/// [run]
/// checkpoint-every = 10
/// concurrency = 5
/// delimiter = ";"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SurveyConfig {
    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub run: RunSettings,
}

impl SurveyConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid TOML
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::MissingFile { path: path_str });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path_str.clone(),
            source: e,
        })?;
        let config = Self::parse(&content, &path_str)?;

        info!(path = %path_str, "Loaded survey configuration");
        Ok(config)
    }

    /// Parses and validates TOML content; `path` names the origin in errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or fails validation.
    pub fn parse(content: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlError {
            path: path.to_string(),
            source: e,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first invalid key.
    pub fn validate(&self, path: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            path: path.to_string(),
            message,
        };

        if self.run.checkpoint_every == 0 {
            return Err(invalid("checkpoint-every must be at least 1".to_string()));
        }
        if self.run.concurrency == 0 {
            return Err(invalid("concurrency must be at least 1".to_string()));
        }
        for delimiter in std::iter::once(self.run.delimiter).chain(self.run.output_delimiter) {
            parse_delimiter(delimiter)
                .map_err(|c| invalid(format!("delimiter '{c}' is not a single ASCII character")))?;
        }
        if self.rate_limit.strategy == StrategyKind::Fixed && self.rate_limit.fixed_wait_secs == 0 {
            return Err(invalid("fixed-wait-secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Builds the retry policy from `[rate-limit]`.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let settings = &self.rate_limit;
        let fixed = Duration::from_secs(settings.fixed_wait_secs);
        let strategy = match settings.strategy {
            StrategyKind::Fixed => WaitStrategy::Fixed(fixed),
            StrategyKind::UntilReset => WaitStrategy::UntilReset {
                buffer: Duration::from_secs(settings.reset_buffer_secs),
                fallback: fixed,
            },
        };

        let policy = RetryPolicy::new(strategy);
        match settings.max_retries {
            Some(max) => policy.with_max_retries(max),
            None => policy,
        }
    }
}
