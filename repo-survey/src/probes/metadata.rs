//! Repository metadata enrichment.

use super::{Probe, ProbeKind, RowContext};
use crate::github::{ApiError, Contributor, GitHubApi};
use crate::table::cell::{list_cell, opt_cell};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

const COLUMNS: &[&str] = &[
    "stars",
    "forks",
    "open_issues",
    "watchers",
    "language",
    "license",
    "created_at",
    "updated_at",
    "pushed_at",
    "default_branch",
    "size",
    "contributors",
    "contributor_count",
    "total_downloads",
];

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn date_cell(value: Option<DateTime<Utc>>) -> String {
    opt_cell(value.map(|d| d.format(DATE_FORMAT)))
}

fn contributor_label(contributor: &Contributor) -> String {
    format!(
        "{} ({} contributions)",
        contributor.login, contributor.contributions
    )
}

/// Stars, dates, license, contributors and release downloads.
pub struct MetadataProbe;

#[async_trait]
impl Probe for MetadataProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Metadata
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    async fn run(&self, api: &dyn GitHubApi, row: &RowContext) -> Result<Vec<String>, ApiError> {
        let meta = api.repository(&row.repo).await?;
        let contributors = api.contributors(&row.repo).await?;

        let downloads = match api.releases_download_count(&row.repo).await {
            Ok(count) => Some(count),
            Err(e) if e.is_rate_limited() => return Err(e),
            Err(e) => {
                warn!(repo = %row.repo, error = %e, "Could not read release downloads");
                None
            }
        };

        Ok(vec![
            meta.stars.to_string(),
            meta.forks.to_string(),
            meta.open_issues.to_string(),
            meta.watchers.to_string(),
            opt_cell(meta.language),
            opt_cell(meta.license.map(|l| l.name)),
            date_cell(meta.created_at),
            date_cell(meta.updated_at),
            date_cell(meta.pushed_at),
            opt_cell(meta.default_branch),
            meta.size.to_string(),
            list_cell(contributors.iter().map(contributor_label)),
            contributors.len().to_string(),
            opt_cell(downloads),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::{metadata, FakeApi};
    use crate::probes::test_row;
    use chrono::TimeZone;

    #[tokio::test]
    async fn renders_metadata_cells() {
        let mut meta = metadata(Some("C++"));
        meta.stars = 42;
        meta.created_at = Some(Utc.with_ymd_and_hms(2020, 5, 17, 8, 30, 0).unwrap());
        let api = FakeApi::new()
            .with_meta(meta)
            .with_contributors(&[("alice", 120), ("bob", 3)])
            .with_downloads(Some(17));

        let values = MetadataProbe.run(&api, &test_row(&[])).await.unwrap();
        assert_eq!(values.len(), COLUMNS.len());
        assert_eq!(values[0], "42");
        assert_eq!(values[4], "C++");
        assert_eq!(values[5], "");
        assert_eq!(values[6], "2020-05-17T08:30:00Z");
        assert_eq!(values[7], "");
        assert_eq!(values[9], "main");
        assert_eq!(
            values[11],
            "alice (120 contributions)|bob (3 contributions)"
        );
        assert_eq!(values[12], "2");
        assert_eq!(values[13], "17");
    }

    #[tokio::test]
    async fn download_failure_leaves_null() {
        let api = FakeApi::new().with_downloads(None);
        let values = MetadataProbe.run(&api, &test_row(&[])).await.unwrap();
        assert_eq!(values[13], "");
    }

    #[tokio::test]
    async fn missing_repository_is_an_error() {
        let api = FakeApi::unreachable();
        let err = MetadataProbe.run(&api, &test_row(&[])).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
