//! Per-repository probes.
//!
//! A probe fetches a few resources for one repository and classifies them
//! into one value per output column. Probes never write to the table
//! themselves; the runner applies their values.

mod ci;
mod ci_test_rule;
mod cmake;
mod comments;
mod community;
mod fair;
mod language;
mod metadata;
mod pre_commit;
mod readme;
mod requirements;
mod test_conventions;
mod test_dependency;
mod test_folder;

pub use ci::CiProbe;
pub use ci_test_rule::CiTestRuleProbe;
pub use cmake::CMakeProbe;
pub use comments::{comment_category, CommentsProbe};
pub use community::CommunityProbe;
pub use fair::{FairChecks, FairProbe};
pub use language::Language;
pub(crate) use language::row_in_scope;
pub use metadata::MetadataProbe;
pub use pre_commit::PreCommitProbe;
pub use readme::{sanitize_readme, ReadmeProbe};
pub use requirements::{LockFilesProbe, RequirementsProbe};
pub use test_conventions::TestConventionsProbe;
pub use test_dependency::TestDependencyProbe;
pub use test_folder::{choose_test_folder, TestFolderProbe};

use crate::github::{path_exists, ApiError, GitHubApi, RepoMetadata, TreeEntry};
use crate::repository::RepoRef;
use crate::table::{cell::NULL, Table};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Column holding the repository URL.
pub const HTML_URL: &str = "html_url";

/// Columns that may carry a repository's language.
const LANGUAGE_COLUMNS: [&str; 2] = ["Language", "language"];

/// Snapshot of one CSV row handed to a probe.
#[derive(Debug, Clone)]
pub struct RowContext {
    pub repo: RepoRef,
    cells: HashMap<String, String>,
}

impl RowContext {
    /// Creates a context from explicit cells.
    pub fn new(repo: RepoRef, cells: HashMap<String, String>) -> Self {
        Self { repo, cells }
    }

    /// Captures row `row` of `table`.
    pub fn from_table(table: &Table, row: usize, repo: RepoRef) -> Self {
        let cells = table
            .headers()
            .iter()
            .enumerate()
            .map(|(index, header)| (header.clone(), table.cell(row, index).to_string()))
            .collect();
        Self::new(repo, cells)
    }

    /// Non-null cell value.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Language recorded in the row, if any.
    pub fn language(&self) -> Option<&str> {
        LANGUAGE_COLUMNS.iter().find_map(|column| self.get(column))
    }
}

/// A survey step run once per repository.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Which probe this is.
    fn kind(&self) -> ProbeKind;

    /// Output columns, in the order `run` returns values.
    fn columns(&self) -> &'static [&'static str];

    /// Column whose presence marks a row as done.
    fn key_column(&self) -> &'static str {
        self.columns().first().copied().unwrap_or(HTML_URL)
    }

    /// Whether the row is worth any API call. Rows outside the probe's
    /// scope get null values without reaching `run`.
    fn applies_to(&self, _row: &RowContext) -> bool {
        true
    }

    /// Computes one value per column. Empty strings are nulls.
    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError>;
}

/// Unknown probe name.
#[derive(Debug, thiserror::Error)]
#[error("Unknown probe '{0}'")]
pub struct UnknownProbe(pub String);

/// Every available probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    Ci,
    TestFolder,
    Requirements,
    LockFiles,
    Community,
    PreCommit,
    Readme,
    TestConventions,
    TestDependency,
    CMake,
    CiTestRule,
    Comments,
    Fair,
    Metadata,
}

impl ProbeKind {
    /// All probes in documentation order.
    pub const ALL: [ProbeKind; 14] = [
        Self::Ci,
        Self::TestFolder,
        Self::Requirements,
        Self::LockFiles,
        Self::Community,
        Self::PreCommit,
        Self::Readme,
        Self::TestConventions,
        Self::TestDependency,
        Self::CMake,
        Self::CiTestRule,
        Self::Comments,
        Self::Fair,
        Self::Metadata,
    ];

    /// Command-line name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ci => "ci",
            Self::TestFolder => "test-folder",
            Self::Requirements => "requirements",
            Self::LockFiles => "lock-files",
            Self::Community => "community",
            Self::PreCommit => "pre-commit",
            Self::Readme => "readme",
            Self::TestConventions => "test-conventions",
            Self::TestDependency => "test-dependency",
            Self::CMake => "cmake",
            Self::CiTestRule => "ci-test-rule",
            Self::Comments => "comments",
            Self::Fair => "fair",
            Self::Metadata => "metadata",
        }
    }

    /// Builds the probe.
    #[must_use]
    pub fn probe(self) -> Box<dyn Probe> {
        match self {
            Self::Ci => Box::new(CiProbe),
            Self::TestFolder => Box::new(TestFolderProbe),
            Self::Requirements => Box::new(RequirementsProbe),
            Self::LockFiles => Box::new(LockFilesProbe),
            Self::Community => Box::new(CommunityProbe),
            Self::PreCommit => Box::new(PreCommitProbe),
            Self::Readme => Box::new(ReadmeProbe),
            Self::TestConventions => Box::new(TestConventionsProbe),
            Self::TestDependency => Box::new(TestDependencyProbe::default()),
            Self::CMake => Box::new(CMakeProbe::default()),
            Self::CiTestRule => Box::new(CiTestRuleProbe),
            Self::Comments => Box::new(CommentsProbe::default()),
            Self::Fair => Box::new(FairProbe),
            Self::Metadata => Box::new(MetadataProbe),
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = UnknownProbe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownProbe(s.to_string()))
    }
}

/// One null per column.
pub(crate) fn nulls(columns: &[&str]) -> Vec<String> {
    vec![NULL.to_string(); columns.len()]
}

/// Returns the first of `paths` that exists.
pub(crate) async fn first_existing<'a>(
    api: &dyn GitHubApi,
    repo: &RepoRef,
    paths: &[&'a str],
) -> Result<Option<&'a str>, ApiError> {
    for path in paths {
        if path_exists(api, repo, path).await? {
            return Ok(Some(*path));
        }
    }
    Ok(None)
}

/// Fetches repository metadata and the recursive tree of its default branch.
pub(crate) async fn metadata_and_tree(
    api: &dyn GitHubApi,
    repo: &RepoRef,
) -> Result<(RepoMetadata, Vec<TreeEntry>), ApiError> {
    let meta = api.repository(repo).await?;
    let tree = match api.tree(repo, meta.branch_or_head()).await {
        Ok(tree) => tree,
        // Empty repositories have no tree.
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e),
    };
    Ok((meta, tree))
}

/// Language from the row, asking the API only when the row has none.
pub(crate) async fn resolve_language(
    api: &dyn GitHubApi,
    row: &RowContext,
) -> Result<Option<Language>, ApiError> {
    if let Some(value) = row.language() {
        return Ok(Language::parse(value));
    }
    let meta = api.repository(&row.repo).await?;
    Ok(meta.language.as_deref().and_then(Language::parse))
}

#[cfg(test)]
pub(crate) fn test_row(cells: &[(&str, &str)]) -> RowContext {
    RowContext::new(
        RepoRef::new("owner", "repo"),
        cells
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    )
}
