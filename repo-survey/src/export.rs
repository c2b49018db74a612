//! JSON-lines export for dashboards.
//!
//! One object per repository, combining a few CSV columns with fresh API
//! data: contributors, languages, topics, README text and the FAIR checks.

use crate::github::{ApiError, GitHubApi};
use crate::probes::{FairChecks, RowContext};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Date stamp written to `collected_at`.
pub const COLLECTED_AT_FORMAT: &str = "%Y-%m-%d";

/// One contributor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorRecord {
    pub contributor: String,
    pub contributions: u64,
}

/// One language entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRecord {
    pub language: String,
    pub num_chars: u64,
}

/// A line of the export file.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord {
    pub url: String,
    pub owner: String,
    pub repository_name: String,
    pub collected_at: String,
    pub description: Option<String>,
    pub contributors: Vec<ContributorRecord>,
    pub languages: Vec<LanguageRecord>,
    pub howfairis: FairChecks,
    pub topics: Vec<String>,
    pub readme: Option<String>,
}

/// Builds the export record for one row.
///
/// Contributors, metadata and the FAIR checks must succeed. Languages and
/// the README are best effort and left empty on failure.
///
/// # Errors
///
/// Returns the first error of a required call.
pub async fn collect_record(
    api: &dyn GitHubApi,
    row: &RowContext,
    collected_at: &str,
) -> Result<ExportRecord, ApiError> {
    let repo = &row.repo;
    let contributors = api.contributors(repo).await?;
    let meta = api.repository(repo).await?;
    let howfairis = FairChecks::collect(api, repo).await?;

    let languages = match api.languages(repo).await {
        Ok(languages) => languages,
        Err(e) if e.is_rate_limited() => return Err(e),
        Err(e) => {
            warn!(repo = %repo, error = %e, "Could not read languages");
            Vec::new()
        }
    };
    let readme = match api.readme(repo).await {
        Ok(readme) => readme,
        Err(e) if e.is_rate_limited() => return Err(e),
        Err(e) => {
            warn!(repo = %repo, error = %e, "Could not read README");
            None
        }
    };

    Ok(ExportRecord {
        url: row.get("html_url").map_or_else(|| repo.html_url(), str::to_string),
        owner: row.get("owner").unwrap_or(&repo.owner).to_string(),
        repository_name: row.get("name").unwrap_or(&repo.name).to_string(),
        collected_at: collected_at.to_string(),
        description: row
            .get("description")
            .map(str::to_string)
            .or(meta.description),
        contributors: contributors
            .into_iter()
            .map(|c| ContributorRecord {
                contributor: c.login,
                contributions: c.contributions,
            })
            .collect(),
        languages: languages
            .into_iter()
            .map(|l| LanguageRecord {
                language: l.language,
                num_chars: l.bytes,
            })
            .collect(),
        howfairis,
        topics: meta.topics,
        readme,
    })
}

/// Appends records to a JSON-lines file, one flushed line per record.
///
/// Records written before an interruption stay on disk, and
/// [`exported_urls`] lets a later run skip them.
#[derive(Debug)]
pub struct JsonlWriter {
    file: File,
}

impl JsonlWriter {
    /// Opens `path` for appending, creating it and its parent directories.
    /// A partial last line left by an interrupted run is terminated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let text = std::fs::read(path)?;
        if text.last().is_some_and(|&b| b != b'\n') {
            file.write_all(b"\n")?;
        }
        Ok(Self { file })
    }

    /// Writes one record as a line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn append(&mut self, record: &ExportRecord) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()
    }
}

#[derive(Deserialize)]
struct ExportedUrl {
    url: String,
}

/// URLs already present in an export file. A missing file has none; lines
/// that do not parse are ignored.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn exported_urls(path: &Path) -> std::io::Result<HashSet<String>> {
    let text = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e),
    };

    let mut urls = HashSet::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<ExportedUrl>(line) {
            Ok(exported) => {
                urls.insert(exported.url);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable export line"),
        }
    }
    Ok(urls)
}
