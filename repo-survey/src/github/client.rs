//! `octocrab`-backed implementation of [`GitHubApi`].

use super::error::{ApiError, RateLimitHeaders};
use super::types::{ContentEntry, ContentsResponse, Release, TreeResponse};
use super::{Contributor, GitHubApi, LanguageShare, RepoMetadata, TreeEntry};
use crate::rate_limit::RateLimitInfo;
use crate::repository::RepoRef;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use lazy_static::lazy_static;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::{Position, Url};

/// Items requested per page for paginated endpoints.
const PER_PAGE: usize = 100;

lazy_static! {
    static ref API_ROOT: Url = Url::parse("https://api.github.com/").expect("API_ROOT is a valid URL");
}

/// Builds a relative route with percent-encoded path and query.
fn route(path: &str, query: &[(&str, &str)]) -> String {
    let mut url = API_ROOT.clone();
    url.set_path(path);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url[Position::BeforePath..].to_string()
}

fn repo_path(repo: &RepoRef, rest: &str) -> String {
    let rest = rest.trim_matches('/');
    if rest.is_empty() {
        format!("repos/{}/{}", repo.owner, repo.name)
    } else {
        format!("repos/{}/{}/{}", repo.owner, repo.name, rest)
    }
}

/// Decodes the base64 payload of a file entry.
///
/// Returns `None` for directories and for files GitHub did not inline
/// (over 1 MB). Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] if the payload is not valid base64.
pub fn decode_content(entry: &ContentEntry) -> Result<Option<String>, ApiError> {
    if !entry.is_file() {
        return Ok(None);
    }

    let Some(content) = entry.content.as_deref() else {
        return Ok(None);
    };

    if entry.encoding.as_deref().is_some_and(|e| e != "base64") {
        warn!(path = %entry.path, encoding = ?entry.encoding, "File content not inlined");
        return Ok(None);
    }

    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned).map_err(|e| ApiError::Decode {
        path: entry.path.clone(),
        message: e.to_string(),
    })?;

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// GitHub client built on `octocrab`.
///
/// Requests go through `_get` so that status codes and rate-limit headers
/// stay visible for classification.
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    inner: Octocrab,
}

impl OctocrabClient {
    /// Wraps an existing `octocrab` instance.
    pub fn new(inner: Octocrab) -> Self {
        Self { inner }
    }

    /// Builds a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn from_token(token: &str) -> Result<Self, octocrab::Error> {
        let inner = Octocrab::builder()
            .personal_token(token.to_string())
            .build()?;
        Ok(Self::new(inner))
    }

    /// Performs a GET, returning the body on success and `None` for empty responses.
    async fn get_body(&self, route: &str) -> Result<Option<String>, ApiError> {
        let response = self.inner._get(route).await?;
        let status = response.status().as_u16();

        let headers = {
            let map = response.headers();
            let read = |name: &str| map.get(name).and_then(|v| v.to_str().ok());
            RateLimitHeaders::from_values(
                read("x-ratelimit-remaining"),
                read("x-ratelimit-reset"),
                read("retry-after"),
            )
        };

        let body = self.inner.body_to_string(response).await?;
        debug!(route, status, "GitHub response");

        if !(200..300).contains(&status) {
            return Err(ApiError::from_response(status, &headers, &body, route));
        }

        if status == 204 || body.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(body))
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<Option<T>, ApiError> {
        let Some(body) = self.get_body(route).await? else {
            return Ok(None);
        };

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ApiError::Decode {
                path: route.to_string(),
                message: e.to_string(),
            })
    }

    async fn get_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let per_page = PER_PAGE.to_string();
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let page_str = page.to_string();
            let route = route(path, &[("per_page", per_page.as_str()), ("page", page_str.as_str())]);
            let batch: Vec<T> = self.get_json(&route).await?.unwrap_or_default();
            let count = batch.len();
            items.extend(batch);

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl GitHubApi for OctocrabClient {
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata, ApiError> {
        let route = route(&repo_path(repo, ""), &[]);
        self.get_json(&route).await?.ok_or_else(|| ApiError::Decode {
            path: route,
            message: "empty repository response".to_string(),
        })
    }

    async fn contents(&self, repo: &RepoRef, path: &str) -> Result<Vec<ContentEntry>, ApiError> {
        let route = route(&repo_path(repo, &format!("contents/{path}")), &[]);
        Ok(self
            .get_json::<ContentsResponse>(&route)
            .await?
            .map(ContentsResponse::into_entries)
            .unwrap_or_default())
    }

    async fn file_text(&self, repo: &RepoRef, path: &str) -> Result<Option<String>, ApiError> {
        let entries = match self.contents(repo, path).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        match entries.as_slice() {
            [entry] => decode_content(entry),
            _ => Ok(None),
        }
    }

    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>, ApiError> {
        let route = route(&repo_path(repo, "readme"), &[]);
        match self.get_json::<ContentEntry>(&route).await {
            Ok(Some(entry)) => decode_content(&entry),
            Ok(None) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, ApiError> {
        self.get_pages(&repo_path(repo, "contributors")).await
    }

    async fn languages(&self, repo: &RepoRef) -> Result<Vec<LanguageShare>, ApiError> {
        let route = route(&repo_path(repo, "languages"), &[]);
        let map: BTreeMap<String, u64> = self.get_json(&route).await?.unwrap_or_default();

        let mut languages: Vec<LanguageShare> = map
            .into_iter()
            .map(|(language, bytes)| LanguageShare { language, bytes })
            .collect();
        languages.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
        Ok(languages)
    }

    async fn tree(&self, repo: &RepoRef, reference: &str) -> Result<Vec<TreeEntry>, ApiError> {
        let route = route(
            &repo_path(repo, &format!("git/trees/{reference}")),
            &[("recursive", "1")],
        );
        let Some(response) = self.get_json::<TreeResponse>(&route).await? else {
            return Ok(Vec::new());
        };

        if response.truncated {
            warn!(repo = %repo, "Git tree truncated, some files will be missed");
        }
        Ok(response.tree)
    }

    async fn releases_download_count(&self, repo: &RepoRef) -> Result<u64, ApiError> {
        let releases: Vec<Release> = self.get_pages(&repo_path(repo, "releases")).await?;
        Ok(releases
            .iter()
            .flat_map(|release| &release.assets)
            .map(|asset| asset.download_count)
            .sum())
    }

    async fn rate_limit(&self) -> Result<RateLimitInfo, ApiError> {
        let rate_limit = self.inner.ratelimit().get().await?;
        let core = &rate_limit.resources.core;

        Ok(RateLimitInfo {
            remaining: core.remaining as u32,
            reset: core.reset,
            limit: core.limit as u32,
        })
    }
}
