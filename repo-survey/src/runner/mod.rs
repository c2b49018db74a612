//! Drives probes and exports over CSV files.

mod config;
mod error;

pub use config::RunnerConfig;
pub use error::RunnerError;

use crate::export::{collect_record, exported_urls, JsonlWriter, COLLECTED_AT_FORMAT};
use crate::github::{GitHubApi, GuardedApi, OctocrabClient};
use crate::probes::{Probe, RowContext, HTML_URL};
use crate::rate_limit::{ensure_core_rate_limit, RateLimitGuard, RateLimitInfo, Sleeper, TokioSleeper};
use crate::repository::parse_github_url;
use crate::summary::{ProcessingResult, RunSummary};
use crate::table::{cell::NULL, Table, TableError};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// A row the runner will hand to the API.
struct PendingRow {
    position: usize,
    context: RowContext,
}

/// Runs probes against a [`GitHubApi`] and persists the results.
pub struct Runner<A> {
    config: RunnerConfig,
    api: A,
    sleeper: Arc<dyn Sleeper>,
}

impl Runner<GuardedApi<OctocrabClient>> {
    /// Builds a runner whose API calls go through the rate-limit loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_token(config: RunnerConfig, token: &str) -> Result<Self, RunnerError> {
        let client = OctocrabClient::from_token(token)?;
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let guard = RateLimitGuard::new(config.retry_policy(), Arc::clone(&sleeper));
        Ok(Self::new(config, GuardedApi::new(client, guard)).with_sleeper(sleeper))
    }
}

impl<A: GitHubApi> Runner<A> {
    /// Creates a runner over any API implementation.
    pub fn new(config: RunnerConfig, api: A) -> Self {
        Self {
            config,
            api,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the sleeper used by the quota precheck.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns the API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Reads the current core rate limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn rate_limit(&self) -> Result<RateLimitInfo, RunnerError> {
        Ok(self.api.rate_limit().await?)
    }

    /// Runs `probe` over every row of `input`, writing to `output`.
    ///
    /// An existing `output` is merged with the input by `html_url`; only
    /// rows of the current input are processed. Rows whose key column is
    /// filled are skipped unless forced. Rows the probe does not apply to,
    /// and rows that cannot be resolved, get null values and the run
    /// continues. The output is written every
    /// `checkpoint_every` repositories and once at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, lacks `html_url`, or an
    /// output write fails.
    pub async fn run_probe(
        &self,
        probe: &dyn Probe,
        input: &Path,
        output: &Path,
    ) -> Result<RunSummary, RunnerError> {
        let kind = probe.kind();
        let mut summary = RunSummary::new(kind.as_str());
        info!(probe = %kind, input = %input.display(), output = %output.display(), "Starting probe");

        let (mut table, rows) = self.load(input, output)?;
        summary.rows_total = rows.len();

        let url_column = table.ensure_column(HTML_URL);
        let columns: Vec<usize> = probe
            .columns()
            .iter()
            .map(|name| table.ensure_column(name))
            .collect();
        let key_column = table.ensure_column(probe.key_column());

        let mut pending = Vec::new();
        for position in rows {
            let url = table.cell(position, url_column).trim().to_string();
            if url.is_empty() {
                warn!(row = position, "Row has no html_url");
                clear(&mut table, position, &columns);
                summary.record_result(&ProcessingResult::MissingUrl);
                continue;
            }
            if !self.config.force() && !table.cell(position, key_column).trim().is_empty() {
                debug!(url = %url, "Already processed, skipping");
                summary.record_result(&ProcessingResult::Skipped { url });
                continue;
            }
            match parse_github_url(&url) {
                Some(repo) => {
                    let context = RowContext::from_table(&table, position, repo);
                    if probe.applies_to(&context) {
                        pending.push(PendingRow { position, context });
                    } else {
                        debug!(url = %url, "Out of scope for this probe");
                        clear(&mut table, position, &columns);
                        summary.record_result(&ProcessingResult::OutOfScope { url });
                    }
                }
                None => {
                    info!(url = %url, "URL not supported");
                    clear(&mut table, position, &columns);
                    summary.record_result(&ProcessingResult::Unsupported { url });
                }
            }
        }

        info!(probe = %kind, count = pending.len(), "Repositories to process");

        let api: &dyn GitHubApi = &self.api;
        let sleeper: &dyn Sleeper = self.sleeper.as_ref();
        let precheck = self.config.precheck_quota();

        let mut results = stream::iter(pending)
            .map(move |row| async move {
                if precheck {
                    if let Err(e) = ensure_core_rate_limit(api, sleeper).await {
                        warn!(error = %e, "Failed to check rate limit");
                    }
                }
                let span = info_span!("repository", repo = %row.context.repo);
                let result = probe.run(api, &row.context).instrument(span).await;
                (row.position, row.context.repo, result)
            })
            .buffer_unordered(self.config.concurrency());

        let mut since_checkpoint = 0;
        while let Some((position, repo, result)) = results.next().await {
            match result {
                Ok(values) => {
                    for (&column, value) in columns.iter().zip(values) {
                        table.set_cell(position, column, value);
                    }
                    debug!(repo = %repo, "Probe succeeded");
                    summary.record_result(&ProcessingResult::Success {
                        repository: repo.full_name(),
                    });
                }
                Err(e) => {
                    warn!(repo = %repo, error = %e, "Probe failed, leaving row unresolved");
                    clear(&mut table, position, &columns);
                    summary.record_result(&ProcessingResult::Failed {
                        repository: repo.full_name(),
                        error: e.to_string(),
                    });
                }
            }

            since_checkpoint += 1;
            if since_checkpoint >= self.config.checkpoint_every() {
                table.write(output, self.config.output_delimiter())?;
                since_checkpoint = 0;
            }
        }

        table.write(output, self.config.output_delimiter())?;
        info!(
            probe = %kind,
            processed = summary.processed,
            skipped = summary.skipped,
            out_of_scope = summary.out_of_scope,
            failed = summary.failed,
            unsupported = summary.unsupported,
            "Probe finished"
        );
        Ok(summary)
    }

    /// Appends one JSON line per GitHub row of `input` to `output`.
    ///
    /// Each record is written as soon as it is collected, in input order.
    /// URLs already present in `output` are skipped, so an interrupted
    /// export resumes where it stopped. Rows whose required data cannot be
    /// fetched are left out and logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, lacks `html_url`, or the
    /// output cannot be read or written.
    pub async fn run_export(&self, input: &Path, output: &Path) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new("export");
        let table = read_input(input, self.config.delimiter())?;
        summary.rows_total = table.len();

        let output_error = |source| RunnerError::Io {
            path: output.display().to_string(),
            source,
        };
        let done = exported_urls(output).map_err(output_error)?;

        let mut pending: Vec<RowContext> = Vec::new();
        for position in 0..table.len() {
            let Some(url) = table.get(position, HTML_URL) else {
                summary.record_result(&ProcessingResult::MissingUrl);
                continue;
            };
            if !self.config.force() && done.contains(url) {
                debug!(url = %url, "Already exported, skipping");
                summary.record_result(&ProcessingResult::Skipped {
                    url: url.to_string(),
                });
                continue;
            }
            match parse_github_url(url) {
                Some(repo) => pending.push(RowContext::from_table(&table, position, repo)),
                None => {
                    info!(url = %url, "URL not supported");
                    summary.record_result(&ProcessingResult::Unsupported {
                        url: url.to_string(),
                    });
                }
            }
        }

        info!(count = pending.len(), skipped = summary.skipped, "Repositories to export");

        let mut writer = JsonlWriter::open(output).map_err(output_error)?;
        let collected_at = chrono::Utc::now().format(COLLECTED_AT_FORMAT).to_string();
        let api: &dyn GitHubApi = &self.api;
        let collected_at = collected_at.as_str();

        let mut outcomes = stream::iter(pending)
            .map(move |row| async move {
                let span = info_span!("repository", repo = %row.repo);
                let record = collect_record(api, &row, collected_at).instrument(span).await;
                (row.repo, record)
            })
            .buffered(self.config.concurrency());

        let mut written = 0_usize;
        while let Some((repo, outcome)) = outcomes.next().await {
            match outcome {
                Ok(record) => {
                    writer.append(&record).map_err(output_error)?;
                    written += 1;
                    summary.record_result(&ProcessingResult::Success {
                        repository: repo.full_name(),
                    });
                }
                Err(e) => {
                    warn!(repo = %repo, error = %e, "Repository encountered issues, skipping");
                    summary.record_result(&ProcessingResult::Failed {
                        repository: repo.full_name(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(path = %output.display(), records = written, "Export written");
        Ok(summary)
    }

    /// Reads the input and merges it into an existing output.
    fn load(&self, input: &Path, output: &Path) -> Result<(Table, Vec<usize>), RunnerError> {
        let input_table = read_input(input, self.config.delimiter())?;

        if output != input && output.exists() {
            let existing = Table::read(output, self.config.output_delimiter())?;
            info!(path = %output.display(), rows = existing.len(), "Merging with existing output");
            return Ok(input_table.merge_into_existing(&existing, HTML_URL));
        }

        let rows = (0..input_table.len()).collect();
        Ok((input_table, rows))
    }
}

/// Reads an input CSV that must carry `html_url`.
fn read_input(path: &Path, delimiter: u8) -> Result<Table, TableError> {
    let table = Table::read(path, delimiter)?;
    if !table.has_column(HTML_URL) {
        return Err(TableError::MissingColumn {
            path: path.display().to_string(),
            column: HTML_URL.to_string(),
        });
    }
    Ok(table)
}

fn clear(table: &mut Table, position: usize, columns: &[usize]) {
    for &column in columns {
        table.set_cell(position, column, NULL);
    }
}
