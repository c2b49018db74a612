//! Test steps inside CI configuration.

use super::{metadata_and_tree, row_in_scope, Language, Probe, ProbeKind, RowContext};
use crate::github::{ApiError, GitHubApi, TreeEntry};
use crate::table::cell::{bool_cell, list_cell, parse_bool_cell};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

const COLUMNS: &[&str] = &[
    "ci_tool_detected",
    "test_rule_in_ci",
    "file_ci_test_rule_found",
    "ci_test_keyword_found",
];

/// A CI system recognised in the tree.
struct CiTool {
    name: &'static str,
    /// Files or directories whose presence marks the tool.
    detectors: &'static [&'static str],
    /// Exact YAML paths read for keywords.
    files: &'static [&'static str],
    /// Directories whose `.yml`/`.yaml` children are read for keywords.
    yaml_dirs: &'static [&'static str],
}

const CI_TOOLS: [CiTool; 5] = [
    CiTool {
        name: "github_actions",
        detectors: &[".github/workflows"],
        files: &[],
        yaml_dirs: &[".github/workflows"],
    },
    CiTool {
        name: "travis_ci",
        detectors: &[".travis.yml", ".travis.yaml"],
        files: &[".travis.yml", ".travis.yaml"],
        yaml_dirs: &[],
    },
    CiTool {
        name: "circle_ci",
        detectors: &[".circleci"],
        files: &[".circleci/config.yml", ".circleci/config.yaml"],
        yaml_dirs: &[],
    },
    CiTool {
        name: "azure_pipelines",
        detectors: &["azure-pipelines.yml", "azure-pipelines.yaml", "azure-pipelines"],
        files: &["azure-pipelines.yml", "azure-pipelines.yaml"],
        yaml_dirs: &["azure-pipelines"],
    },
    // Jenkins pipelines are Groovy; only presence is recorded.
    CiTool {
        name: "jenkins",
        detectors: &["Jenkinsfile", "jenkinsfile"],
        files: &[],
        yaml_dirs: &[],
    },
];

lazy_static! {
    static ref PYTHON_KEYWORDS: Vec<(&'static str, Regex)> = compile(&[
        ("pytest", r"\bpytest\b"),
        ("unittest", r"\bunittest\b|\bunit\s*test\b"),
        ("nose", r"\bnose\b"),
    ]);
    static ref R_KEYWORDS: Vec<(&'static str, Regex)> = compile(&[
        ("testthat", r"\btestthat\b"),
        ("tinytest", r"\btinytest\b"),
    ]);
    static ref CPP_KEYWORDS: Vec<(&'static str, Regex)> = compile(&[
        ("ctest", r"\bctest\b"),
        ("gtest", r"\bgtest\b|\bgoogle\s*test\b"),
        ("catch2", r"\bcatch2\b|\bcatch\s*2\b"),
    ]);
}

fn compile(patterns: &[(&'static str, &str)]) -> Vec<(&'static str, Regex)> {
    patterns
        .iter()
        .map(|(name, pattern)| {
            let regex = Regex::new(&format!("(?i){pattern}")).expect("CI keyword regex is valid");
            (*name, regex)
        })
        .collect()
}

fn keywords(language: Language) -> &'static [(&'static str, Regex)] {
    match language {
        Language::Python => &PYTHON_KEYWORDS,
        Language::R => &R_KEYWORDS,
        Language::Cpp => &CPP_KEYWORDS,
    }
}

fn is_yaml(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".yml") || lower.ends_with(".yaml")
}

/// Detected tools and the YAML files to scan, deduplicated in detection order.
fn detect(tree: &[TreeEntry]) -> (Vec<&'static str>, Vec<&str>) {
    let present = |path: &str| {
        tree.iter().any(|e| {
            e.path == path
                || e
                    .path
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    };

    let mut tools = Vec::new();
    let mut files: Vec<&str> = Vec::new();
    for tool in &CI_TOOLS {
        if !tool.detectors.iter().any(|d| present(*d)) {
            continue;
        }
        tools.push(tool.name);

        let candidates = tree.iter().filter(|e| e.is_blob()).filter(|e| {
            tool.files.contains(&e.path.as_str())
                || tool.yaml_dirs.iter().any(|dir| {
                    e.path
                        .strip_prefix(dir)
                        .and_then(|rest| rest.strip_prefix('/'))
                        .is_some_and(|name| !name.contains('/') && is_yaml(name))
                })
        });
        for entry in candidates {
            if !files.contains(&entry.path.as_str()) {
                files.push(&entry.path);
            }
        }
    }
    (tools, files)
}

/// Detects CI tools and searches their YAML for language-specific test runners.
///
/// Rows are considered only when their language is Python, R or C++ and a
/// `continuous_integration` column, if present, is not false.
pub struct CiTestRuleProbe;

#[async_trait]
impl Probe for CiTestRuleProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::CiTestRule
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn applies_to(&self, row: &RowContext) -> bool {
        let ci_disabled = row
            .get("continuous_integration")
            .and_then(parse_bool_cell)
            == Some(false);
        !ci_disabled && row_in_scope(row)
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        if !self.applies_to(row) {
            return Ok(super::nulls(COLUMNS));
        }

        let (meta, tree) = metadata_and_tree(api, &row.repo).await?;
        let Some(language) = Language::for_row(row, &meta) else {
            return Ok(super::nulls(COLUMNS));
        };

        let (tools, files) = detect(&tree);
        if tools.is_empty() {
            return Ok(vec![
                String::new(),
                bool_cell(false),
                String::new(),
                String::new(),
            ]);
        }

        let mut matched_files = Vec::new();
        let mut matched_keywords: Vec<&str> = Vec::new();
        for path in files {
            let Some(text) = api.file_text(&row.repo, path).await? else {
                continue;
            };
            let mut hit = false;
            for (name, regex) in keywords(language) {
                if regex.is_match(&text) {
                    hit = true;
                    if !matched_keywords.contains(name) {
                        matched_keywords.push(*name);
                    }
                }
            }
            if hit {
                matched_files.push(path);
            }
        }

        Ok(vec![
            list_cell(&tools),
            bool_cell(!matched_files.is_empty()),
            list_cell(&matched_files),
            list_cell(&matched_keywords),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::FakeApi;
    use crate::probes::test_row;

    #[tokio::test]
    async fn finds_pytest_in_workflow() {
        let api = FakeApi::new()
            .with_file(".github/workflows/tests.yml", "run: python -m PyTest -q")
            .with_file(".github/workflows/docs.yaml", "run: mkdocs build")
            .with_file(".github/workflows/scripts/helper.yml", "run: pytest")
            .with_file(".travis.yml", "script: python -m unittest discover");
        let row = test_row(&[("Language", "Python"), ("continuous_integration", "True")]);

        let values = CiTestRuleProbe.run(&api, &row).await.unwrap();
        assert_eq!(
            values,
            vec![
                "github_actions|travis_ci",
                "True",
                ".github/workflows/tests.yml|.travis.yml",
                "pytest|unittest"
            ]
        );
    }

    #[tokio::test]
    async fn jenkins_is_detected_without_keywords() {
        let api = FakeApi::new().with_file("Jenkinsfile", "pipeline { sh 'ctest' }");
        let row = test_row(&[("Language", "C++")]);

        let values = CiTestRuleProbe.run(&api, &row).await.unwrap();
        assert_eq!(values, vec!["jenkins", "False", "", ""]);
    }

    #[tokio::test]
    async fn no_ci_tool() {
        let api = FakeApi::new().with_file("README.md", "");
        let row = test_row(&[("Language", "R")]);

        let values = CiTestRuleProbe.run(&api, &row).await.unwrap();
        assert_eq!(values, vec!["", "False", "", ""]);
    }

    #[tokio::test]
    async fn rows_without_ci_are_skipped() {
        let api = FakeApi::unreachable();
        let row = test_row(&[("Language", "Python"), ("continuous_integration", "False")]);

        let values = CiTestRuleProbe.run(&api, &row).await.unwrap();
        assert_eq!(values, vec!["", "", "", ""]);
    }
}
