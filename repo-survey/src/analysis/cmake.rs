//! CMake build-file analysis.
//!
//! Extracts declared project languages, `find_package` dependencies and
//! `add_test` usage from `CMakeLists.txt` and `*.cmake` files. This is a
//! line-oriented scan, not a CMake interpreter: variables are not expanded.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Version reported for unpinned dependencies.
pub const ANY_VERSION: &str = "Any";

/// Keywords that end the `LANGUAGES` list of a `project()` call.
const PROJECT_STOP_WORDS: [&str; 4] = ["VERSION", "COMPAT_VERSION", "DESCRIPTION", "HOMEPAGE_URL"];

lazy_static! {
    static ref PROJECT_CALL: Regex =
        Regex::new(r"(?i)\bproject\s*\(([^)]*)\)").expect("PROJECT_CALL regex is valid");
    static ref ADD_TEST_CALL: Regex =
        Regex::new(r"(?i)\badd_test\s*\([^)]+\)").expect("ADD_TEST_CALL regex is valid");
    static ref FIND_PACKAGE_CALL: Regex =
        Regex::new(r"(?i)\bfind_package\s*\(([^)]*)").expect("FIND_PACKAGE_CALL regex is valid");
    static ref VERSION: Regex = Regex::new(r"^[0-9][0-9.]*$").expect("VERSION regex is valid");
}

/// A dependency declared with `find_package`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Requested version, or [`ANY_VERSION`].
    pub version: String,
    pub required: bool,
}

impl Dependency {
    /// Returns true if a specific version is requested.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.version != ANY_VERSION
    }

    /// Renders the dependency as a requirements line.
    #[must_use]
    pub fn requirement_line(&self) -> String {
        if self.is_pinned() {
            format!("{}=={} [Required={}]", self.name, self.version, self.required)
        } else {
            format!("{} [Required={}]", self.name, self.required)
        }
    }
}

/// Aggregated findings over all CMake files of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CMakeReport {
    pub has_cmakelists: bool,
    pub languages: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub uses_gtest: bool,
    pub tests_found: bool,
}

impl CMakeReport {
    /// Parses a set of file contents.
    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = Self::default();
        for content in files {
            report.add_file(content.as_ref());
        }
        report
    }

    /// Folds one file into the report.
    pub fn add_file(&mut self, content: &str) {
        self.has_cmakelists = true;

        let code: Vec<&str> = content.lines().map(strip_comment).collect();
        let joined = code.join(" ");

        if let Some(caps) = PROJECT_CALL.captures(&joined) {
            for language in project_languages(&caps[1]) {
                if !self.languages.contains(&language) {
                    self.languages.push(language);
                }
            }
        }

        if ADD_TEST_CALL.is_match(&joined) {
            self.tests_found = true;
        }

        for line in code {
            let Some(dependency) = parse_find_package(line) else {
                continue;
            };
            if dependency.name.eq_ignore_ascii_case("gtest") {
                self.uses_gtest = true;
            }
            if !self.dependencies.contains(&dependency) {
                self.dependencies.push(dependency);
            }
        }
    }

    /// Returns true if any dependency was declared.
    #[must_use]
    pub fn dependencies_found(&self) -> bool {
        !self.dependencies.is_empty()
    }

    /// Returns true if a required dependency requests a specific version.
    #[must_use]
    pub fn pinned_required(&self) -> bool {
        self.dependencies.iter().any(|d| d.required && d.is_pinned())
    }

    /// Returns true if an optional dependency requests a specific version.
    #[must_use]
    pub fn pinned_optional(&self) -> bool {
        self.dependencies.iter().any(|d| !d.required && d.is_pinned())
    }

    /// Dependencies as a JSON array.
    #[must_use]
    pub fn dependencies_json(&self) -> String {
        serde_json::to_string(&self.dependencies).unwrap_or_else(|_| "[]".to_string())
    }

    /// One requirements line per dependency.
    #[must_use]
    pub fn requirements_lines(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .map(Dependency::requirement_line)
            .collect()
    }
}

/// Returns true for file names the analysis reads.
#[must_use]
pub fn is_cmake_file(file_name: &str) -> bool {
    matches!(file_name, "CMakeLists.txt" | "CMakeLists.txt.in")
        || file_name.ends_with(".cmake")
        || file_name.ends_with(".cmake.in")
}

/// Removes a trailing `#` comment. Quoted `#` characters are kept.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..index],
            _ => {}
        }
    }
    line
}

fn project_languages(arguments: &str) -> Vec<String> {
    let mut tokens = arguments.split_whitespace();
    if !tokens.any(|t| t.eq_ignore_ascii_case("LANGUAGES")) {
        return Vec::new();
    }

    tokens
        .take_while(|t| {
            !PROJECT_STOP_WORDS
                .iter()
                .any(|stop| t.eq_ignore_ascii_case(stop))
        })
        .map(str::to_string)
        .collect()
}

fn parse_find_package(line: &str) -> Option<Dependency> {
    let caps = FIND_PACKAGE_CALL.captures(line)?;
    let tokens: Vec<&str> = caps[1].split_whitespace().collect();
    let name = tokens.first()?;

    let version = tokens
        .get(1)
        .filter(|t| VERSION.is_match(t))
        .map_or_else(|| ANY_VERSION.to_string(), |t| (*t).to_string());

    Some(Dependency {
        name: (*name).to_string(),
        version,
        required: tokens.contains(&"REQUIRED"),
    })
}
