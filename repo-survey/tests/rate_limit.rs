mod common;

use common::{fixtures_root, FakeGitHub, RecordingSleeper};
use repo_survey::probes::CiProbe;
use repo_survey::{
    GitHubApi, GuardedApi, RateLimitGuard, RepoRef, RetryPolicy, Runner, RunnerConfig,
    WaitStrategy,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(20 * 60);

fn guarded(api: FakeGitHub, policy: RetryPolicy, sleeper: &Arc<RecordingSleeper>) -> GuardedApi<FakeGitHub> {
    GuardedApi::new(api, RateLimitGuard::new(policy, sleeper.clone()))
}

#[tokio::test]
async fn exhausted_quota_sleeps_once_then_succeeds() {
    let api = FakeGitHub::new()
        .with_repo("alpha/tool", Some("Python"))
        .rate_limited_for(1);
    let sleeper = Arc::new(RecordingSleeper::default());
    let guarded = guarded(api.clone(), RetryPolicy::new(WaitStrategy::Fixed(WAIT)), &sleeper);

    let meta = guarded
        .repository(&RepoRef::new("alpha", "tool"))
        .await
        .unwrap();

    assert_eq!(meta.full_name, "alpha/tool");
    assert_eq!(sleeper.sleeps(), vec![WAIT]);
    assert_eq!(api.calls(), 2);
}

#[tokio::test]
async fn not_found_is_returned_without_sleeping() {
    let api = FakeGitHub::new();
    let sleeper = Arc::new(RecordingSleeper::default());
    let guarded = guarded(api.clone(), RetryPolicy::default(), &sleeper);

    let err = guarded
        .repository(&RepoRef::new("nobody", "nothing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(sleeper.sleeps().is_empty());
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn bounded_retries_give_up_with_the_rate_limit_error() {
    let api = FakeGitHub::new()
        .with_repo("alpha/tool", None)
        .rate_limited_for(10);
    let sleeper = Arc::new(RecordingSleeper::default());
    let policy = RetryPolicy::new(WaitStrategy::Fixed(WAIT)).with_max_retries(2);
    let guarded = guarded(api.clone(), policy, &sleeper);

    let err = guarded
        .repository(&RepoRef::new("alpha", "tool"))
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert_eq!(sleeper.sleeps().len(), 2);
    assert_eq!(api.calls(), 3);
}

#[tokio::test]
async fn runner_recovers_from_exhausted_quota_mid_run() {
    let api = FakeGitHub::new()
        .with_repo("alpha/tool", Some("Python"))
        .with_file("alpha/tool", "Jenkinsfile", "pipeline {}")
        .with_repo("beta/lib", Some("R"))
        .rate_limited_for(1);
    let sleeper = Arc::new(RecordingSleeper::default());
    let guarded = guarded(api, RetryPolicy::new(WaitStrategy::Fixed(WAIT)), &sleeper);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("repos_ci.csv");
    let runner = Runner::new(RunnerConfig::new(), guarded);

    let summary = runner
        .run_probe(&CiProbe, &fixtures_root().join("repos.csv"), &output)
        .await
        .unwrap();

    assert_eq!(sleeper.sleeps().len(), 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.processed, 3);

    let table = repo_survey::Table::read(&output, b',').unwrap();
    assert_eq!(table.get(0, "ci_tool"), Some("jenkins"));
}
