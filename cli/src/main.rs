//! CLI for repo-survey.
//!
//! Runs survey probes over CSV files of GitHub repositories, annotates
//! README text offline and exports dashboard records.

use clap::{Parser, Subcommand};
use repo_survey::{
    annotate_file, classify_file, parse_delimiter, Credentials, ProbeKind, RunSummary, Runner,
    RunnerConfig, RunnerError, SurveyConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// repo-survey - Survey development practices of GitHub research repositories.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Input CSV delimiter.
    #[arg(long, global = true, value_parser = delimiter_arg)]
    delimiter: Option<u8>,

    /// Output CSV delimiter (defaults to the input delimiter).
    #[arg(long, global = true, value_parser = delimiter_arg)]
    output_delimiter: Option<u8>,

    /// Environment file holding GITHUB_TOKEN.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Path to a survey.toml with rate-limit and run settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Process rows again even if their result columns are filled.
    #[arg(long, global = true)]
    force: bool,

    /// Repositories processed at once.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Exit with status 1 when any row stays unresolved.
    #[arg(long, global = true)]
    strict: bool,

    /// GitHub Personal Access Token.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one probe over a CSV of repository URLs.
    Probe {
        /// Probe to run.
        #[arg(value_parser = probe_arg)]
        kind: ProbeKind,

        /// Input CSV with an html_url column.
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV, merged with its existing content.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Add README keyword columns to a CSV in place.
    Annotate {
        /// CSV with a readme column.
        csv: PathBuf,
    },

    /// Add dlr_application_class from contributor_count.
    Classify {
        /// CSV with a contributor_count column.
        input: PathBuf,

        /// Output CSV (defaults to rewriting the input).
        output: Option<PathBuf>,
    },

    /// Write one JSON line per repository for dashboards.
    Export {
        /// Input CSV with an html_url column.
        #[arg(long)]
        input: PathBuf,

        /// Output JSON-lines file.
        #[arg(long)]
        output: PathBuf,
    },

    /// Show the remaining core API quota.
    Limits,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    let strict = args.strict;

    match run(args).await {
        Ok(Some(summary)) => {
            print_summary(&summary);

            if strict && summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            }
        }
        Ok(None) => ExitCode::from(0),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with a compact format and `RUST_LOG` filtering,
/// defaulting to "info".
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn delimiter_arg(value: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            parse_delimiter(c).map_err(|c| format!("'{c}' is not a single ASCII character"))
        }
        _ => Err(format!("'{value}' is not a single character")),
    }
}

fn probe_arg(value: &str) -> Result<ProbeKind, String> {
    value.parse().map_err(|e| {
        let names: Vec<&str> = ProbeKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("{e}; expected one of: {}", names.join(", "))
    })
}

/// Merges `survey.toml` settings with command-line overrides.
fn runner_config(args: &Args) -> Result<RunnerConfig, RunnerError> {
    let survey = match &args.config {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::default(),
    };
    let mut config = RunnerConfig::from_survey(&survey)?.with_force(args.force);

    if let Some(delimiter) = args.delimiter {
        config = config.with_delimiter(delimiter);
        if survey.run.output_delimiter.is_none() {
            config = config.with_output_delimiter(delimiter);
        }
    }
    if let Some(delimiter) = args.output_delimiter {
        config = config.with_output_delimiter(delimiter);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    Ok(config)
}

/// Builds an API-backed runner. Fails before any row is read if no token
/// is available.
fn api_runner(
    args: &Args,
    config: RunnerConfig,
) -> Result<Runner<repo_survey::GuardedApi<repo_survey::OctocrabClient>>, RunnerError> {
    let credentials = Credentials::load(args.env_file.as_deref(), args.token.clone())?;
    Runner::from_token(config, credentials.token())
}

/// Main execution logic. Offline commands return no summary.
async fn run(args: Args) -> Result<Option<RunSummary>, RunnerError> {
    let config = runner_config(&args)?;

    match &args.command {
        Command::Probe {
            kind,
            input,
            output,
        } => {
            let runner = api_runner(&args, config)?;
            let probe = kind.probe();
            Ok(Some(runner.run_probe(probe.as_ref(), input, output).await?))
        }
        Command::Annotate { csv } => {
            annotate_file(csv, config.delimiter(), config.output_delimiter())?;
            Ok(None)
        }
        Command::Classify { input, output } => {
            classify_file(
                input,
                output.as_deref(),
                config.delimiter(),
                config.output_delimiter(),
            )?;
            Ok(None)
        }
        Command::Export { input, output } => {
            let runner = api_runner(&args, config)?;
            Ok(Some(runner.run_export(input, output).await?))
        }
        Command::Limits => {
            let runner = api_runner(&args, config)?;
            let info = runner.rate_limit().await?;
            println!("Remaining: {}/{}", info.remaining, info.limit);
            println!("Resets at: {}", format_reset(info.reset));
            Ok(None)
        }
    }
}

fn format_reset(reset: u64) -> String {
    i64::try_from(reset)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map_or_else(|| reset.to_string(), |d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary ({}):", summary.label);
    println!("  Rows: {}", summary.rows_total);
    println!("  Processed: {}", summary.processed);
    println!("  Skipped (already done): {}", summary.skipped);
    println!("  Out of scope: {}", summary.out_of_scope);
    println!("  Unsupported URLs: {}", summary.unsupported);
    println!("  Missing URLs: {}", summary.missing_url);
    println!("  Failed: {}", summary.failed);

    if !summary.unresolved.is_empty() {
        println!("  Unresolved:");
        for entry in &summary.unresolved {
            println!("    {entry}");
        }
    }
}
