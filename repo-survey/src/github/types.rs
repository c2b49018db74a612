//! GitHub API data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// License attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// License key (e.g. `mit`).
    pub key: String,
    /// Human-readable license name.
    pub name: String,
    /// SPDX identifier, `NOASSERTION` for unrecognised licenses.
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// Repository metadata from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "stargazers_count")]
    pub stars: u64,
    #[serde(default, rename = "forks_count")]
    pub forks: u64,
    #[serde(default, rename = "open_issues_count")]
    pub open_issues: u64,
    #[serde(default, rename = "watchers_count")]
    pub watchers: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub license: Option<LicenseInfo>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub default_branch: Option<String>,
    /// Repository size in kilobytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub archived: bool,
}

impl RepoMetadata {
    /// Returns the branch to read trees from, falling back to `HEAD`.
    #[must_use]
    pub fn branch_or_head(&self) -> &str {
        self.default_branch.as_deref().unwrap_or("HEAD")
    }
}

/// Kind of an entry returned by the contents API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a contents API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub size: u64,
    /// Base64 payload, only present when a single file was requested.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl ContentEntry {
    /// Returns true for directories.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == ContentKind::Dir
    }

    /// Returns true for regular files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == ContentKind::File
    }
}

/// Contents API responses are an array for directories and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
    Many(Vec<ContentEntry>),
    One(Box<ContentEntry>),
}

impl ContentsResponse {
    pub(crate) fn into_entries(self) -> Vec<ContentEntry> {
        match self {
            Self::Many(entries) => entries,
            Self::One(entry) => vec![*entry],
        }
    }
}

/// A repository contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// GitHub login; empty for anonymous contributors.
    #[serde(default)]
    pub login: String,
    /// Number of commits attributed to the contributor.
    #[serde(default)]
    pub contributions: u64,
}

/// Bytes of code written in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
}

/// Kind of a git tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    Blob,
    Tree,
    Commit,
}

/// One entry of a recursive git tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: TreeKind,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    /// Creates a blob entry.
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeKind::Blob,
            size: None,
        }
    }

    /// Creates a directory entry.
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeKind::Tree,
            size: None,
        }
    }

    /// Returns true for files.
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == TreeKind::Blob
    }

    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseAsset {
    #[serde(default)]
    pub download_count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Release {
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}
