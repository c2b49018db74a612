//! GitHub REST API access.
//!
//! Probes and the runner only see the [`GitHubApi`] trait. [`OctocrabClient`]
//! implements it over raw `octocrab` requests, and [`GuardedApi`] wraps any
//! implementation so that every call goes through the rate-limit loop.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod fake;
mod guarded;
mod types;

pub use client::{decode_content, OctocrabClient};
pub use error::{ApiError, RateLimitHeaders};
pub use guarded::GuardedApi;
pub use types::{
    ContentEntry, ContentKind, Contributor, LanguageShare, LicenseInfo, RepoMetadata, TreeEntry,
    TreeKind,
};

use crate::rate_limit::RateLimitInfo;
use crate::repository::RepoRef;
use async_trait::async_trait;

/// Operations the survey needs from GitHub.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Fetches repository metadata.
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata, ApiError>;

    /// Lists a directory. A file path yields a single entry; the root is `""`.
    async fn contents(&self, repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>, ApiError>;

    /// Fetches and decodes a file, `None` if it does not exist.
    async fn file_text(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, ApiError>;

    /// Fetches the README GitHub selects for the repository, `None` if absent.
    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, ApiError>;

    /// Lists all contributors.
    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, ApiError>;

    /// Lists languages sorted by bytes, largest first.
    async fn languages(&self, repo: &RepoRef) -> Result<Vec<LanguageShare>, ApiError>;

    /// Fetches the recursive git tree of `reference`.
    async fn tree(&self, repo: &RepoRef, reference: &str) -> Result<Vec<TreeEntry>, ApiError>;

    /// Sums download counts of all release assets.
    async fn releases_download_count(&self, repo: &RepoRef) -> Result<u64, ApiError>;

    /// Reads the core rate limit.
    async fn rate_limit(&self) -> Result<RateLimitInfo, ApiError>;
}

/// Returns whether `path` exists in the repository.
///
/// A 404 means absent; other errors propagate.
pub async fn path_exists(api: &dyn GitHubApi, repo: &RepoRef, path: &str) -> Result<bool, ApiError> {
    match api.contents(repo, path).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Returns whether `path` exists and is a directory.
///
/// A file answers as a single entry carrying its own path.
pub async fn dir_exists(api: &dyn GitHubApi, repo: &RepoRef, path: &str) -> Result<bool, ApiError> {
    match api.contents(repo, path).await {
        Ok(entries) => Ok(!entries.is_empty()
            && !matches!(entries.as_slice(), [entry] if entry.path == path && !entry.is_dir())),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lists a directory, treating a missing directory as empty.
pub async fn list_dir(
    api: &dyn GitHubApi,
    repo: &RepoRef,
    path: &str,
) -> Result<Vec<ContentEntry>, ApiError> {
    match api.contents(repo, path).await {
        Ok(entries) => Ok(entries),
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
