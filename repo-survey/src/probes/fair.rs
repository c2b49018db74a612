//! FAIR-software checklist.
//!
//! Five recommendations from fair-software.eu, checked against the GitHub
//! API: a public repository, a license, registration in a community
//! registry, citation metadata and a best-practices checklist badge.

use super::{Probe, ProbeKind, RowContext};
use crate::github::{list_dir, ApiError, GitHubApi};
use crate::repository::RepoRef;
use crate::table::cell::bool_cell;
use async_trait::async_trait;
use serde::Serialize;

const COLUMNS: &[&str] = &[
    "howfairis_repository",
    "howfairis_license",
    "howfairis_registry",
    "howfairis_citation",
    "howfairis_checklist",
];

const LICENSE_PREFIXES: [&str; 3] = ["license", "licence", "copying"];

const CITATION_FILES: [&str; 4] = ["citation.cff", "citation", ".zenodo.json", "codemeta.json"];

/// README fragments that point at a package registry.
const REGISTRY_MARKERS: [&str; 12] = [
    "pypi.org/project",
    "img.shields.io/pypi",
    "badge.fury.io/py",
    "anaconda.org",
    "img.shields.io/conda",
    "cran.r-project.org",
    "r-pkg.org/badges",
    "bioconductor.org/packages",
    "research-software-directory.org",
    "bio.tools",
    "conan.io/center",
    "vcpkg.io",
];

const CHECKLIST_MARKERS: [&str; 2] = ["bestpractices.coreinfrastructure.org", "bestpractices.dev"];

/// Outcome of the five checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FairChecks {
    #[serde(rename = "howfairis_repository")]
    pub repository: bool,
    #[serde(rename = "howfairis_license")]
    pub license: bool,
    #[serde(rename = "howfairis_registry")]
    pub registry: bool,
    #[serde(rename = "howfairis_citation")]
    pub citation: bool,
    #[serde(rename = "howfairis_checklist")]
    pub checklist: bool,
}

impl FairChecks {
    /// Runs all checks. A repository that does not exist fails every check.
    pub async fn collect(api: &dyn GitHubApi, repo: &RepoRef) -> Result<Self, ApiError> {
        let meta = match api.repository(repo).await {
            Ok(meta) => meta,
            Err(e) if e.is_not_found() => return Ok(Self::default()),
            Err(e) => return Err(e),
        };

        let root: Vec<String> = list_dir(api, repo, "")
            .await?
            .into_iter()
            .filter(|e| e.is_file())
            .map(|e| e.name.to_ascii_lowercase())
            .collect();

        let license = meta.license.is_some()
            || root
                .iter()
                .any(|name| LICENSE_PREFIXES.iter().any(|p| name.starts_with(p)));
        let citation = root
            .iter()
            .any(|name| CITATION_FILES.contains(&name.as_str()));

        let readme = api
            .readme(repo)
            .await?
            .map(|text| text.to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            repository: true,
            license,
            registry: REGISTRY_MARKERS.iter().any(|m| readme.contains(m)),
            citation,
            checklist: CHECKLIST_MARKERS.iter().any(|m| readme.contains(m)),
        })
    }

    /// One cell per check, in column order.
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        [
            self.repository,
            self.license,
            self.registry,
            self.citation,
            self.checklist,
        ]
        .into_iter()
        .map(bool_cell)
        .collect()
    }
}

/// Writes the FAIR checklist as `howfairis_*` columns.
pub struct FairProbe;

#[async_trait]
impl Probe for FairProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Fair
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        Ok(FairChecks::collect(api, &row.repo).await?.cells())
    }
}
