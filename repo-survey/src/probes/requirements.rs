//! Dependency declarations, extracted dependency names and lock files.

use super::{
    first_existing, metadata_and_tree, resolve_language, row_in_scope, Language, Probe, ProbeKind,
    RowContext,
};
use crate::analysis::{requirements_includes, Manifest};
use crate::github::{ApiError, GitHubApi, TreeEntry};
use crate::repository::RepoRef;
use crate::table::cell::bool_cell;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

const REQUIREMENTS_COLUMNS: &[&str] = &["requirements_defined", "dependency_names"];

/// Manifests read per repository.
pub const MAX_MANIFEST_FILES: usize = 20;

fn requirement_files(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["requirements.txt", "Pipfile", "pyproject.toml", "setup.py"],
        Language::R => &["DESCRIPTION", "renv.lock", "packrat/packrat.lock"],
        Language::Cpp => &["CMakeLists.txt", "conanfile.txt", "vcpkg.json"],
    }
}

fn lock_files(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["Pipfile.lock", "poetry.lock", "requirement.lock"],
        Language::R => &["renv.lock", "packrat.lock"],
        Language::Cpp => &["vcpkg.lock", "conan.lock", "CMakeCache.txt"],
    }
}

fn manifests(language: Language) -> &'static [Manifest] {
    match language {
        Language::Python => &[
            Manifest::Requirements,
            Manifest::PyProject,
            Manifest::PipfileLock,
            Manifest::PackageLock,
        ],
        Language::R => &[Manifest::Description, Manifest::RenvLock],
        Language::Cpp => &[Manifest::CMakeLists, Manifest::Makefile, Manifest::Vcpkg],
    }
}

/// Manifests of `language` in the root and its immediate subfolders.
fn manifest_files(language: Language, tree: &[TreeEntry]) -> Vec<(&str, Manifest)> {
    tree.iter()
        .filter(|e| e.is_blob() && e.path.matches('/').count() <= 1)
        .filter_map(|e| {
            Manifest::from_file_name(e.file_name())
                .filter(|m| manifests(language).contains(m))
                .map(|m| (e.path.as_str(), m))
        })
        .collect()
}

/// Reads manifests and collects their dependency names. `-r` includes of
/// requirements files are followed one level, relative to the including file.
async fn dependency_names(
    api: &dyn GitHubApi,
    repo: &RepoRef,
    files: &[(&str, Manifest)],
) -> Result<BTreeSet<String>, ApiError> {
    let mut names = BTreeSet::new();
    for &(path, manifest) in files.iter().take(MAX_MANIFEST_FILES) {
        let Some(text) = api.file_text(repo, path).await? else {
            continue;
        };
        names.extend(manifest.dependency_names(&text));

        if manifest != Manifest::Requirements {
            continue;
        }
        let base = path.rsplit_once('/').map(|(dir, _)| dir);
        for include in requirements_includes(&text) {
            let include = match base {
                Some(dir) => format!("{dir}/{include}"),
                None => include,
            };
            if files.iter().any(|(p, _)| *p == include) {
                continue;
            }
            if let Some(text) = api.file_text(repo, &include).await? {
                names.extend(Manifest::Requirements.dependency_names(&text));
            }
        }
    }
    if files.len() > MAX_MANIFEST_FILES {
        debug!(repo = %repo, files = files.len(), limit = MAX_MANIFEST_FILES, "Manifests truncated");
    }
    Ok(names)
}

fn names_cell(names: &BTreeSet<String>) -> String {
    serde_json::to_string(names).unwrap_or_else(|_| "[]".to_string())
}

/// Checks the root for any of `files(language)`. Other languages are `False`.
async fn any_present(
    api: &dyn GitHubApi,
    row: &RowContext,
    files: fn(Language) -> &'static [&'static str],
) -> Result<String, ApiError> {
    let Some(language) = resolve_language(api, row).await? else {
        return Ok(bool_cell(false));
    };

    let found = first_existing(api, &row.repo, files(language)).await?;
    if let Some(path) = found {
        debug!(repo = %row.repo, language = %language, file = path, "Found dependency file");
    }
    Ok(bool_cell(found.is_some()))
}

/// Whether the repository declares its dependencies, and which.
///
/// `requirements_defined` looks for a declaration file in the root.
/// `dependency_names` is a JSON list of names read from the language's
/// manifests in the root and its immediate subfolders. Other languages get
/// `False` and an empty list.
pub struct RequirementsProbe;

#[async_trait]
impl Probe for RequirementsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Requirements
    }

    fn columns(&self) -> &'static [&'static str] {
        REQUIREMENTS_COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let nothing = || vec![bool_cell(false), names_cell(&BTreeSet::new())];
        if !row_in_scope(row) {
            return Ok(nothing());
        }

        let (meta, tree) = metadata_and_tree(api, &row.repo).await?;
        let Some(language) = Language::for_row(row, &meta) else {
            return Ok(nothing());
        };

        let defined = requirement_files(language)
            .iter()
            .any(|file| tree.iter().any(|e| e.is_blob() && e.path == *file));

        let files = manifest_files(language, &tree);
        let names = dependency_names(api, &row.repo, &files).await?;
        debug!(repo = %row.repo, files = files.len(), names = names.len(), "Read manifests");

        Ok(vec![bool_cell(defined), names_cell(&names)])
    }
}

/// Whether the repository pins dependencies with a lock file.
pub struct LockFilesProbe;

#[async_trait]
impl Probe for LockFilesProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::LockFiles
    }

    fn columns(&self) -> &'static [&'static str] {
        &["dependency_lock_files"]
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        Ok(vec![any_present(api, row, lock_files).await?])
    }
}
