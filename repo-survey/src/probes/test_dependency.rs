//! Test libraries declared in dependency files.

use super::{metadata_and_tree, row_in_scope, Language, Probe, ProbeKind, RowContext};
use crate::github::{ApiError, GitHubApi, TreeEntry};
use crate::table::cell::{bool_cell, list_cell};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

const COLUMNS: &[&str] = &[
    "dependencies_explicit",
    "which_dependencies_file",
    "test_dependency",
    "which_test_dependency",
];

/// Dependency files read per repository unless configured otherwise.
pub const MAX_DEPENDENCY_FILES: usize = 20;

fn test_libraries(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["pytest", "unittest", "nose"],
        Language::R => &["testthat", "tinytest"],
        Language::Cpp => &["gtest", "ctest", "catch2"],
    }
}

fn is_dependency_file(language: Language, file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    match language {
        Language::Python => {
            (lower.starts_with("requirements") && lower.ends_with(".txt"))
                || lower == "pyproject.toml"
                || lower.ends_with(".lock")
        }
        Language::R => file_name == "DESCRIPTION" || lower == "renv.lock",
        Language::Cpp => {
            file_name == "CMakeLists.txt"
                || file_name == "Makefile"
                || lower.ends_with(".make")
                || lower == "vcpkg.json"
        }
    }
}

/// Paths of dependency files anywhere in the tree, in tree order.
fn dependency_files(language: Language, tree: &[TreeEntry]) -> Vec<&str> {
    tree.iter()
        .filter(|e| e.is_blob() && is_dependency_file(language, e.file_name()))
        .map(|e| e.path.as_str())
        .collect()
}

/// Scans dependency files anywhere in the repository for test libraries.
///
/// Language comes from the row, falling back to the repository's primary
/// language; repositories in other languages are left null.
pub struct TestDependencyProbe {
    max_files: usize,
}

impl Default for TestDependencyProbe {
    fn default() -> Self {
        Self::new(MAX_DEPENDENCY_FILES)
    }
}

impl TestDependencyProbe {
    pub fn new(max_files: usize) -> Self {
        Self { max_files }
    }
}

#[async_trait]
impl Probe for TestDependencyProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::TestDependency
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn applies_to(&self, row: &RowContext) -> bool {
        row_in_scope(row)
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        if !row_in_scope(row) {
            return Ok(super::nulls(COLUMNS));
        }
        let (meta, tree) = metadata_and_tree(api, &row.repo).await?;
        let Some(language) = Language::for_row(row, &meta) else {
            return Ok(super::nulls(COLUMNS));
        };

        let files = dependency_files(language, &tree);
        if files.is_empty() {
            return Ok(vec![
                bool_cell(false),
                String::new(),
                bool_cell(false),
                String::new(),
            ]);
        }

        let mut text = String::new();
        for path in files.iter().take(self.max_files) {
            if let Some(content) = api.file_text(&row.repo, path).await? {
                text.push_str(&content.to_lowercase());
                text.push('\n');
            }
        }
        if files.len() > self.max_files {
            debug!(repo = %row.repo, files = files.len(), limit = self.max_files, "Dependency files truncated");
        }

        let found: BTreeSet<&str> = test_libraries(language)
            .iter()
            .copied()
            .filter(|library| text.contains(library))
            .collect();

        Ok(vec![
            bool_cell(true),
            list_cell(&files),
            bool_cell(!found.is_empty()),
            list_cell(&found),
        ])
    }
}
