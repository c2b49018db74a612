//! Dependency names from package manifests and lock files.
//!
//! Each [`Manifest`] kind has its own reader. Structured formats (TOML and
//! JSON) go through `serde`; requirements files, R `DESCRIPTION` files,
//! CMake and Makefiles are scanned line by line. A file that fails to parse
//! yields no names.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

lazy_static! {
    /// A PEP 508 project name followed by something that may end it.
    static ref REQUIREMENT_NAME: Regex = Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)(?:$|[\s\[;<>=!~@,(])")
        .expect("REQUIREMENT_NAME regex is valid");
    static ref DCF_FIELD: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)\s*:(.*)$").expect("DCF_FIELD regex is valid");
    static ref VERSION_CONSTRAINT: Regex =
        Regex::new(r"\s*\(.*?\)").expect("VERSION_CONSTRAINT regex is valid");
    static ref FIND_PACKAGE: Regex =
        Regex::new(r"(?i)\bfind_package\s*\(\s*([A-Za-z0-9_+-]+)").expect("FIND_PACKAGE regex is valid");
    static ref TARGET_LINK_LIBRARIES: Regex = Regex::new(r"(?is)\btarget_link_libraries\s*\(([^)]*)\)")
        .expect("TARGET_LINK_LIBRARIES regex is valid");
    static ref ADD_SUBDIRECTORY: Regex = Regex::new(r#"(?i)\badd_subdirectory\s*\(\s*"?([^)\s"]+)"#)
        .expect("ADD_SUBDIRECTORY regex is valid");
    static ref LIBRARY_TOKEN: Regex =
        Regex::new(r"^[A-Za-z0-9_+.-]+$").expect("LIBRARY_TOKEN regex is valid");
    static ref PKG_CONFIG_LIBS: Regex = Regex::new(r"pkg-config\s+--libs\s+([A-Za-z0-9_.+-]+)")
        .expect("PKG_CONFIG_LIBS regex is valid");
    static ref LINK_FLAG: Regex =
        Regex::new(r"(?m)(?:^|\s)-l([A-Za-z0-9_.+-]+)").expect("LINK_FLAG regex is valid");
}

/// `DESCRIPTION` fields that list packages.
const DESCRIPTION_FIELDS: [&str; 4] = ["Depends", "Imports", "Suggests", "LinkingTo"];

/// Words in `target_link_libraries` that are not libraries.
const LINK_KEYWORDS: [&str; 6] = ["private", "public", "interface", "optimized", "debug", "general"];

/// Requirement-file options that take no package.
const SKIPPED_REQUIREMENT_PREFIXES: [&str; 5] = ["-e ", "git+", "hg+", "svn+", "bzr+"];

/// A file format that declares dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manifest {
    /// `requirements*.txt` and `constraints.txt`.
    Requirements,
    PyProject,
    PipfileLock,
    /// `poetry.lock` and `uv.lock`, both lists of `[[package]]` tables.
    PackageLock,
    /// R package `DESCRIPTION`.
    Description,
    RenvLock,
    Vcpkg,
    CMakeLists,
    /// `Makefile` and `*.make`.
    Makefile,
}

impl Manifest {
    /// Recognises a manifest by its file name.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        let manifest = match lower.as_str() {
            "constraints.txt" => Self::Requirements,
            "pyproject.toml" => Self::PyProject,
            "pipfile.lock" => Self::PipfileLock,
            "poetry.lock" | "uv.lock" => Self::PackageLock,
            "renv.lock" => Self::RenvLock,
            "vcpkg.json" => Self::Vcpkg,
            "cmakelists.txt" => Self::CMakeLists,
            "makefile" => Self::Makefile,
            _ if file_name == "DESCRIPTION" => Self::Description,
            _ if lower.starts_with("requirements") && lower.ends_with(".txt") => Self::Requirements,
            _ if lower.ends_with(".make") => Self::Makefile,
            _ => return None,
        };
        Some(manifest)
    }

    /// Sorted, deduplicated dependency names declared in `text`.
    #[must_use]
    pub fn dependency_names(self, text: &str) -> Vec<String> {
        let names = match self {
            Self::Requirements => parse_requirements(text).0,
            Self::PyProject => pyproject_names(text),
            Self::PipfileLock => pipfile_lock_names(text),
            Self::PackageLock => package_lock_names(text),
            Self::Description => description_names(text),
            Self::RenvLock => renv_lock_names(text),
            Self::Vcpkg => vcpkg_names(text),
            Self::CMakeLists => cmake_names(text),
            Self::Makefile => makefile_names(text),
        };
        names.into_iter().collect()
    }
}

/// Files named by `-r` lines of a requirements file, relative to it.
#[must_use]
pub fn requirements_includes(text: &str) -> Vec<String> {
    parse_requirements(text).1
}

/// Project name at the start of a PEP 508 requirement.
fn requirement_name(spec: &str) -> Option<&str> {
    REQUIREMENT_NAME
        .captures(spec.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_requirements(text: &str) -> (BTreeSet<String>, Vec<String>) {
    let mut names = BTreeSet::new();
    let mut includes = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if SKIPPED_REQUIREMENT_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }
        if let Some(include) = line.strip_prefix("-r ") {
            let include = include.trim();
            if !include.is_empty() {
                includes.push(include.to_string());
            }
            continue;
        }
        if line.starts_with('-') {
            continue;
        }
        if let Some(name) = requirement_name(line) {
            names.insert(name.to_string());
        }
    }
    (names, includes)
}

fn insert_spec_names(names: &mut BTreeSet<String>, specs: &[String]) {
    names.extend(
        specs
            .iter()
            .filter_map(|spec| requirement_name(spec))
            .map(str::to_string),
    );
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    project: PyProjectTable,
    #[serde(default)]
    tool: ToolTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PyProjectTable {
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    optional_dependencies: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    #[serde(default)]
    poetry: PoetryTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PoetryTable {
    #[serde(default)]
    dependencies: BTreeMap<String, IgnoredAny>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, IgnoredAny>,
    #[serde(default)]
    group: BTreeMap<String, PoetryGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct PoetryGroup {
    #[serde(default)]
    dependencies: BTreeMap<String, IgnoredAny>,
}

fn pyproject_names(text: &str) -> BTreeSet<String> {
    let pyproject: PyProject = match toml::from_str(text) {
        Ok(pyproject) => pyproject,
        Err(e) => {
            debug!(error = %e, "Unreadable pyproject.toml");
            return BTreeSet::new();
        }
    };

    let mut names = BTreeSet::new();
    insert_spec_names(&mut names, &pyproject.project.dependencies);
    for specs in pyproject.project.optional_dependencies.values() {
        insert_spec_names(&mut names, specs);
    }

    let poetry = &pyproject.tool.poetry;
    names.extend(
        poetry
            .dependencies
            .keys()
            .chain(poetry.dev_dependencies.keys())
            .chain(poetry.group.values().flat_map(|g| g.dependencies.keys()))
            // The interpreter constraint is not a package.
            .filter(|name| !name.eq_ignore_ascii_case("python"))
            .cloned(),
    );
    names
}

#[derive(Debug, Deserialize)]
struct PipfileLock {
    #[serde(default)]
    default: BTreeMap<String, IgnoredAny>,
    #[serde(default)]
    develop: BTreeMap<String, IgnoredAny>,
}

fn pipfile_lock_names(text: &str) -> BTreeSet<String> {
    match serde_json::from_str::<PipfileLock>(text) {
        Ok(lock) => lock.default.into_keys().chain(lock.develop.into_keys()).collect(),
        Err(e) => {
            debug!(error = %e, "Unreadable Pipfile.lock");
            BTreeSet::new()
        }
    }
}

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
}

fn package_lock_names(text: &str) -> BTreeSet<String> {
    match toml::from_str::<PackageLock>(text) {
        Ok(lock) => lock.package.into_iter().map(|p| p.name).collect(),
        Err(e) => {
            debug!(error = %e, "Unreadable package lock");
            BTreeSet::new()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RenvLock {
    #[serde(rename = "Packages", default)]
    packages: BTreeMap<String, IgnoredAny>,
}

fn renv_lock_names(text: &str) -> BTreeSet<String> {
    match serde_json::from_str::<RenvLock>(text) {
        Ok(lock) => lock.packages.into_keys().collect(),
        Err(e) => {
            debug!(error = %e, "Unreadable renv.lock");
            BTreeSet::new()
        }
    }
}

/// Fields of a Debian control file, with continuation lines folded in.
fn dcf_fields(text: &str) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;

    for raw in text.lines() {
        if let Some(caps) = DCF_FIELD.captures(raw) {
            let key = caps[1].to_string();
            fields.insert(key.clone(), caps[2].trim().to_string());
            current = Some(key);
        } else if raw.starts_with([' ', '\t']) {
            if let Some(value) = current.as_ref().and_then(|key| fields.get_mut(key)) {
                value.push(' ');
                value.push_str(raw.trim());
            }
        } else {
            current = None;
        }
    }
    fields
}

fn description_names(text: &str) -> BTreeSet<String> {
    let fields = dcf_fields(text);
    DESCRIPTION_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field))
        .flat_map(|value| value.split(','))
        .map(|part| VERSION_CONSTRAINT.replace_all(part, "").trim().to_string())
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("r"))
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VcpkgDependency {
    Name(String),
    Detailed { name: String },
}

impl VcpkgDependency {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Detailed { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VcpkgManifest {
    #[serde(default)]
    dependencies: Vec<VcpkgDependency>,
    #[serde(default)]
    features: BTreeMap<String, VcpkgFeature>,
}

#[derive(Debug, Deserialize)]
struct VcpkgFeature {
    #[serde(default)]
    dependencies: Vec<VcpkgDependency>,
}

fn vcpkg_names(text: &str) -> BTreeSet<String> {
    match serde_json::from_str::<VcpkgManifest>(text) {
        Ok(manifest) => manifest
            .dependencies
            .into_iter()
            .chain(manifest.features.into_values().flat_map(|f| f.dependencies))
            .map(VcpkgDependency::into_name)
            .filter(|name| !name.is_empty())
            .collect(),
        Err(e) => {
            debug!(error = %e, "Unreadable vcpkg.json");
            BTreeSet::new()
        }
    }
}

/// Packages found with `find_package`, libraries linked with
/// `target_link_libraries` (namespaces for `Ns::Target`), and the leaf
/// directory of each `add_subdirectory`.
fn cmake_names(text: &str) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = FIND_PACKAGE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();

    for caps in TARGET_LINK_LIBRARIES.captures_iter(text) {
        // The first argument is the target being linked.
        for token in caps[1].split_whitespace().skip(1) {
            let token = token.trim_matches('"');
            if LINK_KEYWORDS.iter().any(|k| token.eq_ignore_ascii_case(k)) {
                continue;
            }
            let library = token.split_once("::").map_or(token, |(namespace, _)| namespace);
            if LIBRARY_TOKEN.is_match(library) {
                names.insert(library.to_string());
            }
        }
    }

    for caps in ADD_SUBDIRECTORY.captures_iter(text) {
        let path = caps[1].trim_end_matches('/');
        let leaf = path.rsplit('/').next().unwrap_or(path);
        if LIBRARY_TOKEN.is_match(leaf) {
            names.insert(leaf.to_string());
        }
    }
    names
}

fn makefile_names(text: &str) -> BTreeSet<String> {
    PKG_CONFIG_LIBS
        .captures_iter(text)
        .chain(LINK_FLAG.captures_iter(text))
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_manifest_names() {
        assert_eq!(Manifest::from_file_name("requirements-dev.txt"), Some(Manifest::Requirements));
        assert_eq!(Manifest::from_file_name("constraints.txt"), Some(Manifest::Requirements));
        assert_eq!(Manifest::from_file_name("uv.lock"), Some(Manifest::PackageLock));
        assert_eq!(Manifest::from_file_name("Pipfile.lock"), Some(Manifest::PipfileLock));
        assert_eq!(Manifest::from_file_name("DESCRIPTION"), Some(Manifest::Description));
        assert_eq!(Manifest::from_file_name("description"), None);
        assert_eq!(Manifest::from_file_name("rules.make"), Some(Manifest::Makefile));
        assert_eq!(Manifest::from_file_name("setup.py"), None);
    }

    #[test]
    fn requirements_skip_options_and_follow_includes() {
        let text = "\
# pinned
numpy==1.26
pandas >= 2.0 ; python_version > '3.8'
requests[socks]~=2.31
-r requirements-test.txt
-e git+https://github.com/a/b.git#egg=b
--index-url https://pypi.org/simple
git+https://github.com/c/d.git
https://example.org/pkg.tar.gz
torch @ https://download.pytorch.org/torch.whl
";
        assert_eq!(
            Manifest::Requirements.dependency_names(text),
            vec!["numpy", "pandas", "requests", "torch"]
        );
        assert_eq!(requirements_includes(text), vec!["requirements-test.txt"]);
    }

    #[test]
    fn pyproject_project_and_poetry_tables() {
        let text = r#"
[project]
name = "tool"
dependencies = ["click>=8", "rich"]

[project.optional-dependencies]
test = ["pytest; extra == 'test'"]

[tool.poetry.dependencies]
python = "^3.10"
scipy = "^1.11"

[tool.poetry.group.dev.dependencies]
black = "*"
"#;
        assert_eq!(
            Manifest::PyProject.dependency_names(text),
            vec!["black", "click", "pytest", "rich", "scipy"]
        );
    }

    #[test]
    fn lock_files() {
        let poetry = "[[package]]\nname = \"numpy\"\nversion = \"1.26.0\"\n\n[[package]]\nname = \"attrs\"\nversion = \"23.1\"\n";
        assert_eq!(Manifest::PackageLock.dependency_names(poetry), vec!["attrs", "numpy"]);

        let pipfile = r#"{"_meta": {}, "default": {"flask": {}}, "develop": {"pytest": {}}}"#;
        assert_eq!(Manifest::PipfileLock.dependency_names(pipfile), vec!["flask", "pytest"]);

        let renv = r#"{"R": {"Version": "4.3.1"}, "Packages": {"dplyr": {}, "testthat": {}}}"#;
        assert_eq!(Manifest::RenvLock.dependency_names(renv), vec!["dplyr", "testthat"]);

        assert!(Manifest::RenvLock.dependency_names("not json").is_empty());
    }

    #[test]
    fn description_fields_with_continuations() {
        let text = "\
Package: survey
Depends: R (>= 4.0),
    methods
Imports: dplyr (>= 1.0.0), ggplot2,
\trlang
Suggests: testthat (>= 3.0.0)
Description: Not a dependency list, stats
";
        assert_eq!(
            Manifest::Description.dependency_names(text),
            vec!["dplyr", "ggplot2", "methods", "rlang", "testthat"]
        );
    }

    #[test]
    fn vcpkg_dependencies_and_features() {
        let text = r#"{
            "name": "app",
            "dependencies": ["fmt", {"name": "boost-asio", "version>=": "1.83"}],
            "features": {"tests": {"description": "", "dependencies": ["gtest"]}}
        }"#;
        assert_eq!(
            Manifest::Vcpkg.dependency_names(text),
            vec!["boost-asio", "fmt", "gtest"]
        );
    }

    #[test]
    fn cmake_packages_links_and_subdirectories() {
        let text = "\
find_package(Eigen3 3.4 REQUIRED)
add_subdirectory(third_party/pybind11)
target_link_libraries(solver
    PRIVATE fmt::fmt Threads::Threads
    PUBLIC m ${EXTRA_LIBS})
";
        assert_eq!(
            Manifest::CMakeLists.dependency_names(text),
            vec!["Eigen3", "Threads", "fmt", "m", "pybind11"]
        );
    }

    #[test]
    fn makefile_link_flags() {
        let text = "LDLIBS = -lm -lpthread $(shell pkg-config --libs gsl)\nCFLAGS = -O2\n";
        assert_eq!(
            Manifest::Makefile.dependency_names(text),
            vec!["gsl", "m", "pthread"]
        );
    }
}
