//! In-memory [`GitHubApi`] for unit tests.

use super::{ApiError, ContentEntry, ContentKind, Contributor, GitHubApi, LanguageShare, RepoMetadata, TreeEntry};
use crate::rate_limit::RateLimitInfo;
use crate::repository::RepoRef;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Serves one repository from maps of files and directories.
#[derive(Debug, Clone)]
pub(crate) struct FakeApi {
    meta: RepoMetadata,
    reachable: bool,
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    readme: Option<String>,
    contributors: Vec<Contributor>,
    languages: Vec<LanguageShare>,
    downloads: Option<u64>,
}

pub(crate) fn metadata(language: Option<&str>) -> RepoMetadata {
    RepoMetadata {
        name: "repo".to_string(),
        full_name: "owner/repo".to_string(),
        description: None,
        stars: 0,
        forks: 0,
        open_issues: 0,
        watchers: 0,
        language: language.map(str::to_string),
        license: None,
        created_at: None,
        updated_at: None,
        pushed_at: None,
        default_branch: Some("main".to_string()),
        size: 0,
        topics: Vec::new(),
        archived: false,
    }
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            meta: metadata(None),
            reachable: true,
            files: BTreeMap::new(),
            dirs: BTreeSet::new(),
            readme: None,
            contributors: Vec::new(),
            languages: Vec::new(),
            downloads: Some(0),
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    pub(crate) fn with_language(mut self, language: &str) -> Self {
        self.meta.language = Some(language.to_string());
        self
    }

    pub(crate) fn with_meta(mut self, meta: RepoMetadata) -> Self {
        self.meta = meta;
        self
    }

    pub(crate) fn with_file(mut self, path: &str, content: &str) -> Self {
        let mut parent = path;
        while let Some((dir, _)) = parent.rsplit_once('/') {
            self.dirs.insert(dir.to_string());
            parent = dir;
        }
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub(crate) fn with_dir(mut self, path: &str) -> Self {
        let mut current = path;
        loop {
            self.dirs.insert(current.to_string());
            match current.rsplit_once('/') {
                Some((dir, _)) => current = dir,
                None => break,
            }
        }
        self
    }

    pub(crate) fn with_readme(mut self, text: &str) -> Self {
        self.readme = Some(text.to_string());
        self
    }

    pub(crate) fn with_contributors(mut self, contributors: &[(&str, u64)]) -> Self {
        self.contributors = contributors
            .iter()
            .map(|(login, contributions)| Contributor {
                login: (*login).to_string(),
                contributions: *contributions,
            })
            .collect();
        self
    }

    pub(crate) fn with_downloads(mut self, downloads: Option<u64>) -> Self {
        self.downloads = downloads;
        self
    }

    fn not_found(path: &str) -> ApiError {
        ApiError::NotFound {
            path: path.to_string(),
        }
    }

    fn check(&self, path: &str) -> Result<(), ApiError> {
        if self.reachable {
            Ok(())
        } else {
            Err(Self::not_found(path))
        }
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
}

#[async_trait]
impl GitHubApi for FakeApi {
    async fn repository(&self, _repo: &RepoRef) -> Result<RepoMetadata, ApiError> {
        self.check("repos")?;
        Ok(self.meta.clone())
    }

    async fn contents(&self, _repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>, ApiError> {
        self.check(path)?;
        let path = path.trim_end_matches('/');
        if self.files.contains_key(path) {
            return Ok(vec![Self::entry(path, ContentKind::File)]);
        }
        if !path.is_empty() && !self.dirs.contains(path) {
            return Err(Self::not_found(path));
        }

        let dirs = self
            .dirs
            .iter()
            .filter(|d| Self::parent_of(d) == path && d.as_str() != path)
            .map(|d| Self::entry(d, ContentKind::Dir));
        let files = self
            .files
            .keys()
            .filter(|f| Self::parent_of(f) == path)
            .map(|f| Self::entry(f, ContentKind::File));
        Ok(dirs.chain(files).collect())
    }

    async fn file_text(&self, _repo: &RepoRef, path: &str) -> Result<Option<String>, ApiError> {
        self.check(path)?;
        Ok(self.files.get(path).cloned())
    }

    async fn readme(&self, _repo: &RepoRef) -> Result<Option<String>, ApiError> {
        self.check("readme")?;
        Ok(self.readme.clone())
    }

    async fn contributors(&self, _repo: &RepoRef) -> Result<Vec<Contributor>, ApiError> {
        self.check("contributors")?;
        Ok(self.contributors.clone())
    }

    async fn languages(&self, _repo: &RepoRef) -> Result<Vec<LanguageShare>, ApiError> {
        self.check("languages")?;
        Ok(self.languages.clone())
    }

    async fn tree(&self, _repo: &RepoRef, _reference: &str) -> Result<Vec<TreeEntry>, ApiError> {
        self.check("git/trees")?;
        let dirs = self.dirs.iter().map(|d| TreeEntry::dir(d.as_str()));
        let files = self.files.keys().map(|f| TreeEntry::blob(f.as_str()));
        Ok(dirs.chain(files).collect())
    }

    async fn releases_download_count(&self, _repo: &RepoRef) -> Result<u64, ApiError> {
        self.downloads.ok_or_else(|| ApiError::Http {
            status: 500,
            path: "releases".to_string(),
            message: "server error".to_string(),
        })
    }

    async fn rate_limit(&self) -> Result<RateLimitInfo, ApiError> {
        Ok(RateLimitInfo {
            remaining: 5000,
            reset: 0,
            limit: 5000,
        })
    }
}
