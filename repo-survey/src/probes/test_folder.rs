//! Root-level test folder detection.

use super::{Probe, ProbeKind, RowContext};
use crate::github::{list_dir, ApiError, GitHubApi};
use crate::table::cell::{bool_cell, NULL};
use async_trait::async_trait;

const COLUMNS: &[&str] = &["test_folder", "test_folder_name"];

/// Looks for a directory in the repository root whose name mentions `test`.
pub struct TestFolderProbe;

/// Picks the test folder among candidate names.
///
/// `tests` beats `test`; otherwise the longest name wins, ties broken
/// alphabetically ignoring case. Only names containing `test` (any case) qualify.
pub fn choose_test_folder<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    let mut candidates: Vec<&str> = names
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|n| n.to_ascii_lowercase().contains("test"))
        .collect();

    for preferred in ["tests", "test"] {
        if let Some(name) = candidates.iter().find(|n| n.eq_ignore_ascii_case(preferred)) {
            return Some(*name);
        }
    }

    candidates.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });
    candidates.first().copied()
}

#[async_trait]
impl Probe for TestFolderProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::TestFolder
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let dirs: Vec<String> = list_dir(api, &row.repo, "")
            .await?
            .into_iter()
            .filter(|entry| entry.is_dir())
            .map(|entry| entry.name)
            .collect();

        let chosen = choose_test_folder(&dirs);
        Ok(vec![
            bool_cell(chosen.is_some()),
            chosen.unwrap_or(NULL).to_string(),
        ])
    }
}
