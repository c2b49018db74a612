//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use repo_survey::github::{
    ApiError, ContentEntry, ContentKind, Contributor, GitHubApi, LanguageShare, RateLimitHeaders,
    RepoMetadata, TreeEntry,
};
use repo_survey::{RateLimitInfo, RepoRef, Sleeper};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn metadata(full_name: &str, language: Option<&str>) -> RepoMetadata {
    let name = full_name.rsplit('/').next().unwrap_or(full_name);
    RepoMetadata {
        name: name.to_string(),
        full_name: full_name.to_string(),
        description: None,
        stars: 1,
        forks: 0,
        open_issues: 0,
        watchers: 1,
        language: language.map(str::to_string),
        license: None,
        created_at: None,
        updated_at: None,
        pushed_at: None,
        default_branch: Some("main".to_string()),
        size: 10,
        topics: Vec::new(),
        archived: false,
    }
}

#[derive(Debug, Clone)]
struct FakeRepo {
    meta: RepoMetadata,
    files: BTreeMap<String, String>,
    contributors: Vec<Contributor>,
}

/// In-memory GitHub serving several repositories and counting every call.
///
/// Unknown repositories answer 404. The first `rate_limited` calls fail as a
/// 403 with an exhausted quota.
#[derive(Debug, Clone, Default)]
pub struct FakeGitHub {
    repos: HashMap<String, FakeRepo>,
    calls: Arc<AtomicUsize>,
    rate_limited: Arc<AtomicUsize>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, full_name: &str, language: Option<&str>) -> Self {
        self.repos.insert(
            full_name.to_string(),
            FakeRepo {
                meta: metadata(full_name, language),
                files: BTreeMap::new(),
                contributors: Vec::new(),
            },
        );
        self
    }

    pub fn with_file(mut self, full_name: &str, path: &str, content: &str) -> Self {
        if let Some(repo) = self.repos.get_mut(full_name) {
            repo.files.insert(path.to_string(), content.to_string());
        }
        self
    }

    pub fn with_contributors(mut self, full_name: &str, logins: &[&str]) -> Self {
        if let Some(repo) = self.repos.get_mut(full_name) {
            repo.contributors = logins
                .iter()
                .map(|login| Contributor {
                    login: (*login).to_string(),
                    contributions: 1,
                })
                .collect();
        }
        self
    }

    /// Makes the next `count` calls fail with an exhausted quota.
    pub fn rate_limited_for(self, count: usize) -> Self {
        self.rate_limited.store(count, Ordering::SeqCst);
        self
    }

    /// Number of API calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, repo: &RepoRef, path: &str) -> Result<&FakeRepo, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let limited = self
            .rate_limited
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if limited {
            let headers = RateLimitHeaders::from_values(Some("0"), None, None);
            return Err(ApiError::from_response(
                403,
                &headers,
                r#"{"message": "API rate limit exceeded"}"#,
                path,
            ));
        }

        self.repos
            .get(&repo.full_name())
            .ok_or_else(|| ApiError::NotFound {
                path: path.to_string(),
            })
    }
}

fn dirs_of(files: &BTreeMap<String, String>) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    for path in files.keys() {
        let mut current = path.as_str();
        while let Some((dir, _)) = current.rsplit_once('/') {
            dirs.insert(dir.to_string());
            current = dir;
        }
    }
    dirs
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn entry(path: &str, kind: ContentKind) -> ContentEntry {
    ContentEntry {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        kind,
        size: 0,
        content: None,
        encoding: None,
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata, ApiError> {
        Ok(self.enter(repo, "repos")?.meta.clone())
    }

    async fn contents(&self, repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>, ApiError> {
        let fake = self.enter(repo, path)?;
        if fake.files.contains_key(path) {
            return Ok(vec![entry(path, ContentKind::File)]);
        }

        let dirs = dirs_of(&fake.files);
        if !path.is_empty() && !dirs.contains(path) {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }

        let mut entries: Vec<ContentEntry> = dirs
            .iter()
            .filter(|d| parent_of(d) == path)
            .map(|d| entry(d, ContentKind::Dir))
            .collect();
        entries.extend(
            fake.files
                .keys()
                .filter(|f| parent_of(f) == path)
                .map(|f| entry(f, ContentKind::File)),
        );
        Ok(entries)
    }

    async fn file_text(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, ApiError> {
        Ok(self.enter(repo, path)?.files.get(path).cloned())
    }

    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, ApiError> {
        Ok(self.enter(repo, "readme")?.files.get("README.md").cloned())
    }

    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, ApiError> {
        Ok(self.enter(repo, "contributors")?.contributors.clone())
    }

    async fn languages(&self, repo: &RepoRef) -> Result<Vec<LanguageShare>, ApiError> {
        let fake = self.enter(repo, "languages")?;
        Ok(fake
            .meta
            .language
            .iter()
            .map(|language| LanguageShare {
                language: language.clone(),
                bytes: 100,
            })
            .collect())
    }

    async fn tree(&self, repo: &RepoRef, _reference: &str) -> Result<Vec<TreeEntry>, ApiError> {
        let fake = self.enter(repo, "git/trees")?;
        let mut tree: Vec<TreeEntry> = dirs_of(&fake.files)
            .iter()
            .map(|d| TreeEntry::dir(d.as_str()))
            .collect();
        tree.extend(fake.files.keys().map(|f| TreeEntry::blob(f.as_str())));
        Ok(tree)
    }

    async fn releases_download_count(&self, repo: &RepoRef) -> Result<u64, ApiError> {
        self.enter(repo, "releases")?;
        Ok(0)
    }

    async fn rate_limit(&self) -> Result<RateLimitInfo, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RateLimitInfo {
            remaining: 5000,
            reset: 0,
            limit: 5000,
        })
    }
}

/// Records requested sleeps instead of waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
