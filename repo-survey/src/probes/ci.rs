//! Continuous-integration presence.

use super::{Probe, ProbeKind, RowContext};
use crate::github::{dir_exists, path_exists, ApiError, GitHubApi};
use crate::repository::RepoRef;
use crate::table::cell::{bool_cell, NULL};
use async_trait::async_trait;

const COLUMNS: &[&str] = &["continuous_integration", "ci_tool"];

/// Checked in order; the first hit names the tool.
const CI_CONFIGS: [CiConfig; 5] = [
    CiConfig::dir(".github/workflows", "github_actions"),
    CiConfig::file(".travis.yml", "travis"),
    CiConfig::file(".circleci/config.yml", "circleci"),
    CiConfig::file("Jenkinsfile", "jenkins"),
    CiConfig::file("azure-pipelines.yml", "azure_pipelines"),
];

struct CiConfig {
    path: &'static str,
    tool: &'static str,
    is_dir: bool,
}

impl CiConfig {
    const fn dir(path: &'static str, tool: &'static str) -> Self {
        Self { path, tool, is_dir: true }
    }

    const fn file(path: &'static str, tool: &'static str) -> Self {
        Self { path, tool, is_dir: false }
    }

    async fn present(&self, api: &dyn GitHubApi, repo: &RepoRef) -> Result<bool, ApiError> {
        if self.is_dir {
            dir_exists(api, repo, self.path).await
        } else {
            path_exists(api, repo, self.path).await
        }
    }
}

/// Detects the first CI configuration present in the repository.
pub struct CiProbe;

#[async_trait]
impl Probe for CiProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ci
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let mut tool = None;
        for config in &CI_CONFIGS {
            if config.present(api, &row.repo).await? {
                tool = Some(config.tool);
                break;
            }
        }

        Ok(vec![
            bool_cell(tool.is_some()),
            tool.unwrap_or(NULL).to_string(),
        ])
    }
}
