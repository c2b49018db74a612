//! CMake dependency survey.

use super::{metadata_and_tree, Probe, ProbeKind, RowContext};
use crate::analysis::{is_cmake_file, CMakeReport};
use crate::github::{ApiError, GitHubApi};
use crate::table::cell::{bool_cell, list_cell};
use async_trait::async_trait;
use tracing::{debug, warn};

const COLUMNS: &[&str] = &[
    "has_cmakelists",
    "cmake_languages",
    "dependencies_found",
    "pinned_required_dependencies",
    "pinned_optional_dependencies",
    "tests_found",
    "uses_gtest",
    "cmake_dependencies",
];

/// CMake files read per repository unless configured otherwise.
pub const MAX_CMAKE_FILES: usize = 200;

/// Fetches every CMake file in the tree and aggregates a [`CMakeReport`].
pub struct CMakeProbe {
    max_files: usize,
}

impl Default for CMakeProbe {
    fn default() -> Self {
        Self::new(MAX_CMAKE_FILES)
    }
}

impl CMakeProbe {
    pub fn new(max_files: usize) -> Self {
        Self { max_files }
    }
}

fn report_cells(report: &CMakeReport) -> Vec<String> {
    vec![
        bool_cell(report.has_cmakelists),
        list_cell(&report.languages),
        bool_cell(report.dependencies_found()),
        bool_cell(report.pinned_required()),
        bool_cell(report.pinned_optional()),
        bool_cell(report.tests_found),
        bool_cell(report.uses_gtest),
        report.dependencies_json(),
    ]
}

#[async_trait]
impl Probe for CMakeProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::CMake
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let (_, tree) = metadata_and_tree(api, &row.repo).await?;
        let paths: Vec<&str> = tree
            .iter()
            .filter(|e| e.is_blob() && is_cmake_file(e.file_name()))
            .map(|e| e.path.as_str())
            .collect();

        if paths.len() > self.max_files {
            warn!(
                repo = %row.repo,
                files = paths.len(),
                limit = self.max_files,
                "Too many CMake files, reading the first ones only"
            );
        }

        let mut report = CMakeReport::default();
        for path in paths.iter().take(self.max_files) {
            match api.file_text(&row.repo, path).await? {
                Some(content) => report.add_file(&content),
                None => debug!(repo = %row.repo, path, "CMake file vanished"),
            }
        }

        Ok(report_cells(&report))
    }
}
