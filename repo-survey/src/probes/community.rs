//! Contribution guidelines and code of conduct.

use super::{first_existing, Probe, ProbeKind, RowContext};
use crate::github::{ApiError, GitHubApi};
use crate::table::cell::bool_cell;
use async_trait::async_trait;

const COLUMNS: &[&str] = &["has_contributing", "has_code_of_conduct"];

const CONTRIBUTING: [&str; 3] = ["CONTRIBUTING.md", ".github/CONTRIBUTING.md", "docs/CONTRIBUTING.md"];
const CODE_OF_CONDUCT: [&str; 3] = [
    "CODE_OF_CONDUCT.md",
    ".github/CODE_OF_CONDUCT.md",
    "docs/CODE_OF_CONDUCT.md",
];

/// Looks for community health files in the root, `.github/` and `docs/`.
pub struct CommunityProbe;

#[async_trait]
impl Probe for CommunityProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Community
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let contributing = first_existing(api, &row.repo, &CONTRIBUTING).await?;
        let conduct = first_existing(api, &row.repo, &CODE_OF_CONDUCT).await?;
        Ok(vec![
            bool_cell(contributing.is_some()),
            bool_cell(conduct.is_some()),
        ])
    }
}
