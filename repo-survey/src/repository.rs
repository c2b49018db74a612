//! GitHub repository references parsed from CSV URLs.

use serde::Serialize;
use std::fmt;
use url::Url;

/// Hosts accepted as GitHub.
const GITHUB_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// An `owner/name` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoRef {
    /// Repository owner (user or organization).
    pub owner: String,

    /// Repository name, without a trailing `.git`.
    pub name: String,
}

impl RepoRef {
    /// Creates a reference from its parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Full repository name in "owner/name" format.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Canonical web URL of the repository.
    #[must_use]
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parses a GitHub repository URL into a [`RepoRef`].
///
/// Accepts `http(s)://github.com/owner/repo`, the `www.` variant, and bare
/// `github.com/owner/repo` forms. Trailing slashes, a trailing `.git` and
/// extra path segments (`/tree/main`, `/issues`) are ignored.
///
/// Returns `None` for non-GitHub or malformed URLs.
pub fn parse_github_url(raw: &str) -> Option<RepoRef> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_ascii_lowercase();
    let with_scheme = if GITHUB_HOSTS
        .iter()
        .any(|host| lowered.starts_with(&format!("{host}/")))
    {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let url = Url::parse(&with_scheme).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !GITHUB_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?;
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }

    Some(RepoRef::new(owner, name))
}

/// Returns true if the URL points at a GitHub repository.
pub fn is_github_url(raw: &str) -> bool {
    parse_github_url(raw).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(raw: &str) -> Option<(String, String)> {
        parse_github_url(raw).map(|r| (r.owner, r.name))
    }

    #[test]
    fn parses_accepted_url_forms() {
        let expected = Some(("utrechtuniversity".to_string(), "swords-uu".to_string()));

        assert_eq!(pair("https://github.com/utrechtuniversity/swords-uu"), expected);
        assert_eq!(pair("http://github.com/utrechtuniversity/swords-uu"), expected);
        assert_eq!(pair("https://www.github.com/utrechtuniversity/swords-uu"), expected);
        assert_eq!(pair("https://github.com/utrechtuniversity/swords-uu.git"), expected);
        assert_eq!(pair("https://www.github.com/utrechtuniversity/swords-uu.git"), expected);
        assert_eq!(pair("github.com/utrechtuniversity/swords-uu"), expected);
        assert_eq!(pair("www.github.com/utrechtuniversity/swords-uu/"), expected);
        assert_eq!(pair("  https://github.com/utrechtuniversity/swords-uu/  "), expected);
    }

    #[test]
    fn ignores_extra_path_segments() {
        assert_eq!(
            pair("https://github.com/asreview/asreview/tree/master/tests"),
            Some(("asreview".to_string(), "asreview".to_string()))
        );
    }

    #[test]
    fn host_match_is_case_insensitive() {
        assert_eq!(
            pair("https://GitHub.com/Owner/Repo"),
            Some(("Owner".to_string(), "Repo".to_string()))
        );
    }

    #[test]
    fn rejects_non_github_urls() {
        assert_eq!(pair("https://gitlab.com/owner/repo"), None);
        assert_eq!(pair("https://bitbucket.org/owner/repo"), None);
        assert_eq!(pair("https://github.com.evil.org/owner/repo"), None);
        assert_eq!(pair("ftp://github.com/owner/repo"), None);
    }

    #[test]
    fn rejects_malformed_urls() {
        assert_eq!(pair(""), None);
        assert_eq!(pair("   "), None);
        assert_eq!(pair("not a url"), None);
        assert_eq!(pair("https://github.com/"), None);
        assert_eq!(pair("https://github.com/owner-only"), None);
        assert_eq!(pair("https://github.com/owner/.git"), None);
    }

    #[test]
    fn renders_full_name_and_url() {
        let repo = RepoRef::new("owner", "repo");
        assert_eq!(repo.full_name(), "owner/repo");
        assert_eq!(repo.html_url(), "https://github.com/owner/repo");
        assert_eq!(repo.to_string(), "owner/repo");
    }
}
