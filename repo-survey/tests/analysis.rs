mod common;

use common::{fixtures_root, FakeGitHub};
use repo_survey::analysis::cmake::ANY_VERSION;
use repo_survey::analysis::{CMakeReport, KeywordSet};
use repo_survey::annotate::annotate_file;
use repo_survey::probes::{CMakeProbe, RequirementsProbe};
use repo_survey::{Runner, RunnerConfig, Table};
use tempfile::TempDir;

fn cmake_fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_root().join("cmake").join(name)).unwrap()
}

#[test]
fn cmake_fixture_report() {
    let report = CMakeReport::from_files([
        cmake_fixture("CMakeLists.txt"),
        cmake_fixture("Dependencies.cmake"),
    ]);

    assert!(report.has_cmakelists);
    assert_eq!(report.languages, vec!["CXX", "C"]);
    assert!(report.tests_found);
    assert!(report.uses_gtest);
    assert!(report.pinned_required());
    assert!(report.pinned_optional());

    let names: Vec<&str> = report.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Eigen3", "OpenMP", "Boost", "GTest", "fmt"]);

    let gtest = &report.dependencies[3];
    assert!(gtest.required);
    assert_eq!(gtest.version, ANY_VERSION);

    assert_eq!(
        report.requirements_lines()[0],
        "Eigen3==3.4 [Required=true]"
    );
}

#[test]
fn find_package_gtest_required() {
    let report = CMakeReport::from_files(["find_package(GTest REQUIRED)"]);

    assert!(report.uses_gtest);
    assert_eq!(report.dependencies.len(), 1);
    assert_eq!(report.dependencies[0].name, "GTest");
    assert!(report.dependencies[0].required);
}

#[test]
fn keyword_search_respects_word_starts() {
    let keywords = KeywordSet::new(["test"]).unwrap();

    assert!(keywords.any_in("Testing the solver"));
    assert!(!keywords.any_in("We attest to this"));
}

#[tokio::test]
async fn cmake_probe_over_runner() {
    let api = FakeGitHub::new()
        .with_repo("alpha/tool", Some("C++"))
        .with_file("alpha/tool", "CMakeLists.txt", &cmake_fixture("CMakeLists.txt"))
        .with_file("alpha/tool", "cmake/Dependencies.cmake", &cmake_fixture("Dependencies.cmake"))
        .with_file("alpha/tool", "src/main.cpp", "int main() {}")
        .with_repo("beta/lib", Some("R"));

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("repos_cmake.csv");
    Runner::new(RunnerConfig::new(), api)
        .run_probe(&CMakeProbe::default(), &fixtures_root().join("repos.csv"), &output)
        .await
        .unwrap();

    let table = Table::read(&output, b',').unwrap();
    assert_eq!(table.get(0, "has_cmakelists"), Some("True"));
    assert_eq!(table.get(0, "cmake_languages"), Some("CXX|C"));
    assert_eq!(table.get(0, "uses_gtest"), Some("True"));

    let deps: serde_json::Value =
        serde_json::from_str(table.get(0, "cmake_dependencies").unwrap()).unwrap();
    assert_eq!(deps.as_array().unwrap().len(), 5);
    assert_eq!(deps[0]["version"], "3.4");

    assert_eq!(table.get(1, "has_cmakelists"), Some("False"));
    assert_eq!(table.get(1, "cmake_dependencies"), Some("[]"));
    assert_eq!(table.get(4, "has_cmakelists"), None);
}

#[tokio::test]
async fn requirements_run_lists_dependency_names() {
    let api = FakeGitHub::new()
        .with_repo("alpha/tool", Some("Python"))
        .with_file("alpha/tool", "requirements.txt", "numpy>=1.26\n-r requirements-dev.txt\n")
        .with_file("alpha/tool", "requirements-dev.txt", "pytest\n")
        .with_repo("beta/lib", Some("R"))
        .with_file("beta/lib", "pkg/DESCRIPTION", "Imports: dplyr (>= 1.0.0),\n    rlang\n");

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("repos_requirements.csv");
    Runner::new(RunnerConfig::new(), api)
        .run_probe(&RequirementsProbe, &fixtures_root().join("repos.csv"), &output)
        .await
        .unwrap();

    let table = Table::read(&output, b',').unwrap();
    assert_eq!(table.get(0, "requirements_defined"), Some("True"));
    assert_eq!(table.get(0, "dependency_names"), Some(r#"["numpy","pytest"]"#));

    // DESCRIPTION one level down is read but does not count as declared.
    assert_eq!(table.get(1, "requirements_defined"), Some("False"));
    assert_eq!(table.get(1, "dependency_names"), Some(r#"["dplyr","rlang"]"#));
}

#[test]
fn annotate_semicolon_fixture() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("repos.csv");
    std::fs::copy(fixtures_root().join("repos_semicolon.csv"), &path).unwrap();

    annotate_file(&path, b';', b';').unwrap();

    let table = Table::read(&path, b';').unwrap();
    assert_eq!(table.len(), 3);

    assert_eq!(table.get(0, "installation_keywords"), Some("getting started"));
    assert_eq!(table.get(0, "usage_keywords"), Some("usage|examples"));
    assert_eq!(table.get(0, "reproduce"), Some("True"));
    assert_eq!(table.get(0, "Language"), Some("Python"));

    assert_eq!(table.get(1, "installation"), None);
    assert_eq!(table.get(1, "Language"), Some("R"));

    assert_eq!(table.get(2, "security"), Some("True"));
    assert_eq!(table.get(2, "installation"), Some("False"));
    assert_eq!(table.get(2, "reproduce"), Some("False"));
    assert_eq!(table.get(2, "Language"), Some("Other"));
}
