//! Test-type naming conventions inside the test folder.

use super::{resolve_language, row_in_scope, Language, Probe, ProbeKind, RowContext};
use crate::github::{list_dir, ApiError, GitHubApi};
use crate::table::cell::list_cell;
use async_trait::async_trait;
use std::collections::BTreeSet;

const COLUMNS: &[&str] = &["test_type", "other_folders"];

/// Subfolder names that denote a kind of testing.
const TEST_CATEGORIES: [&str; 12] = [
    "unit",
    "integration",
    "system",
    "e2e",
    "performance",
    "regression",
    "functional",
    "acceptance",
    "security",
    "sanity",
    "mutation",
    "metamorphic",
];

/// Framework folders R packages nest their tests in.
const R_FRAMEWORK_DIRS: [&str; 2] = ["testthat", "tinytest"];

/// Sorts the subfolders of `test/` and `tests/` into known categories and others.
///
/// Only Python, R and C++ repositories are inspected; other rows stay null.
pub struct TestConventionsProbe;

#[derive(Debug, Default)]
struct Folders {
    categories: BTreeSet<String>,
    others: BTreeSet<String>,
}

impl Folders {
    fn add(&mut self, name: &str) {
        let lower = name.to_ascii_lowercase();
        if TEST_CATEGORIES.contains(&lower.as_str()) {
            self.categories.insert(lower);
        } else {
            self.others.insert(name.to_string());
        }
    }
}

#[async_trait]
impl Probe for TestConventionsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::TestConventions
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn applies_to(&self, row: &RowContext) -> bool {
        row_in_scope(row)
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let Some(language) = resolve_language(api, row).await? else {
            return Ok(super::nulls(COLUMNS));
        };

        let test_roots: Vec<String> = list_dir(api, &row.repo, "")
            .await?
            .into_iter()
            .filter(|e| e.is_dir() && matches!(e.name.as_str(), "test" | "tests"))
            .map(|e| e.path)
            .collect();

        let mut folders = Folders::default();
        for root in &test_roots {
            for entry in list_dir(api, &row.repo, root).await? {
                if !entry.is_dir() {
                    continue;
                }
                if language == Language::R && R_FRAMEWORK_DIRS.contains(&entry.name.as_str()) {
                    for nested in list_dir(api, &row.repo, &entry.path).await? {
                        if nested.is_dir() {
                            folders.add(&nested.name);
                        }
                    }
                    continue;
                }
                folders.add(&entry.name);
            }
        }

        Ok(vec![list_cell(&folders.categories), list_cell(&folders.others)])
    }
}
