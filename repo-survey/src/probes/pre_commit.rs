//! Pre-commit hook configuration.

use super::{Probe, ProbeKind, RowContext};
use crate::github::{path_exists, ApiError, GitHubApi};
use async_trait::async_trait;

const CONFIG_FILE: &str = ".pre-commit-config.yaml";

/// Reports whether `.pre-commit-config.yaml` exists in the root.
pub struct PreCommitProbe;

#[async_trait]
impl Probe for PreCommitProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::PreCommit
    }

    fn columns(&self) -> &'static [&'static str] {
        &["ci_hook"]
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let present = path_exists(api, &row.repo, CONFIG_FILE).await?;
        let value = if present { "Present" } else { "Not Present" };
        Ok(vec![value.to_string()])
    }
}
