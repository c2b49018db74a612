//! README text capture.

use super::{Probe, ProbeKind, RowContext};
use crate::github::{list_dir, ApiError, GitHubApi};
use crate::table::cell::NULL;
use async_trait::async_trait;

const README_NAMES: [&str; 3] = ["readme.md", "readme", "readme.rst"];

/// Stores the root README with cell-breaking characters flattened.
pub struct ReadmeProbe;

/// Replaces `,`, `;`, CR and LF with spaces so the text fits one CSV cell
/// under either delimiter.
#[must_use]
pub fn sanitize_readme(text: &str) -> String {
    text.replace([',', ';', '\r', '\n'], " ")
}

fn is_readme(name: &str) -> bool {
    README_NAMES.iter().any(|r| name.eq_ignore_ascii_case(r))
}

#[async_trait]
impl Probe for ReadmeProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Readme
    }

    fn columns(&self) -> &'static [&'static str] {
        &["readme"]
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let root = list_dir(api, &row.repo, "").await?;
        let Some(entry) = root.iter().find(|e| e.is_file() && is_readme(&e.name)) else {
            return Ok(vec![NULL.to_string()]);
        };

        let text = api.file_text(&row.repo, &entry.path).await?;
        Ok(vec![text.as_deref().map(sanitize_readme).unwrap_or_default()])
    }
}
