#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod analysis;
pub mod annotate;
pub mod config;
pub mod export;
pub mod github;
pub mod probes;
pub mod rate_limit;
pub mod repository;
pub mod runner;
pub mod summary;
pub mod table;

pub use annotate::{
    annotate_file, annotate_readme, classify_contributors, classify_file, dlr_application_class,
};
pub use config::{ConfigError, Credentials, SurveyConfig};
pub use export::{collect_record, exported_urls, ExportRecord, JsonlWriter};
pub use github::{ApiError, GitHubApi, GuardedApi, OctocrabClient};
pub use probes::{Language, Probe, ProbeKind, RowContext, UnknownProbe};
pub use rate_limit::{
    ensure_core_rate_limit, wait_if_needed, RateLimitGuard, RateLimitInfo, RetryPolicy, Sleeper,
    TokioSleeper, WaitStrategy,
};
pub use repository::{is_github_url, parse_github_url, RepoRef};
pub use runner::{Runner, RunnerConfig, RunnerError};
pub use summary::{ProcessingResult, RunSummary};
pub use table::{parse_delimiter, Table, TableError};
