//! Rate-limit decorator for any [`GitHubApi`].

use super::{ApiError, ContentEntry, Contributor, GitHubApi, LanguageShare, RepoMetadata, TreeEntry};
use crate::rate_limit::{RateLimitGuard, RateLimitInfo};
use crate::repository::RepoRef;
use async_trait::async_trait;

/// Runs every call of the wrapped API through a [`RateLimitGuard`].
#[derive(Debug, Clone)]
pub struct GuardedApi<A> {
    inner: A,
    guard: RateLimitGuard,
}

impl<A: GitHubApi> GuardedApi<A> {
    /// Wraps `inner` with `guard`.
    pub fn new(inner: A, guard: RateLimitGuard) -> Self {
        Self { inner, guard }
    }

    /// Returns the wrapped API.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Returns the guard.
    pub fn guard(&self) -> &RateLimitGuard {
        &self.guard
    }
}

#[async_trait]
impl<A: GitHubApi> GitHubApi for GuardedApi<A> {
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata, ApiError> {
        self.guard
            .call("repository", || self.inner.repository(repo))
            .await
    }

    async fn contents(&self, repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>, ApiError> {
        self.guard
            .call("contents", || self.inner.contents(repo, path))
            .await
    }

    async fn file_text(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, ApiError> {
        self.guard
            .call("file_text", || self.inner.file_text(repo, path))
            .await
    }

    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, ApiError> {
        self.guard.call("readme", || self.inner.readme(repo)).await
    }

    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, ApiError> {
        self.guard
            .call("contributors", || self.inner.contributors(repo))
            .await
    }

    async fn languages(&self, repo: &RepoRef) -> Result<Vec<LanguageShare>, ApiError> {
        self.guard
            .call("languages", || self.inner.languages(repo))
            .await
    }

    async fn tree(&self, repo: &RepoRef, reference: &str) -> Result<Vec<TreeEntry>, ApiError> {
        self.guard
            .call("tree", || self.inner.tree(repo, reference))
            .await
    }

    async fn releases_download_count(&self, repo: &RepoRef) -> Result<u64, ApiError> {
        self.guard
            .call("releases", || self.inner.releases_download_count(repo))
            .await
    }

    async fn rate_limit(&self) -> Result<RateLimitInfo, ApiError> {
        self.guard.call("rate_limit", || self.inner.rate_limit()).await
    }
}
