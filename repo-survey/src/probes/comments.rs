//! Leading comments in source files.

use super::{metadata_and_tree, row_in_scope, Language, Probe, ProbeKind, RowContext};
use crate::github::{ApiError, GitHubApi};
use async_trait::async_trait;
use tracing::debug;

const COLUMNS: &[&str] = &["comment_percentage", "comment_category"];

/// Source files read per repository unless configured otherwise.
pub const MAX_COMMENT_FILES: usize = 100;

const SOURCE_EXTENSIONS: [&str; 3] = [".py", ".R", ".cpp"];
const COMMENT_PREFIXES: [&str; 6] = ["#", "//", "/*", "'''", "\"", "#'"];

/// Maps a percentage of commented files to a category.
#[must_use]
pub fn comment_category(percentage: f64) -> &'static str {
    if percentage > 75.0 {
        "most"
    } else if percentage > 50.0 {
        "more"
    } else if percentage > 25.0 {
        "some"
    } else {
        "none"
    }
}

fn starts_with_comment(content: &str) -> bool {
    let first = content.lines().next().unwrap_or_default().trim();
    COMMENT_PREFIXES.iter().any(|p| first.starts_with(p))
}

/// Share of `.py`, `.R` and `.cpp` files whose first line is a comment.
pub struct CommentsProbe {
    max_files: usize,
}

impl Default for CommentsProbe {
    fn default() -> Self {
        Self::new(MAX_COMMENT_FILES)
    }
}

impl CommentsProbe {
    pub fn new(max_files: usize) -> Self {
        Self { max_files }
    }
}

#[async_trait]
impl Probe for CommentsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Comments
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
        if Language::for_row(row, &meta).is_none() {
            return Ok(super::nulls(COLUMNS));
        }

        let sources: Vec<&str> = tree
            .iter()
            .filter(|e| e.is_blob() && SOURCE_EXTENSIONS.iter().any(|ext| e.path.ends_with(ext)))
            .map(|e| e.path.as_str())
            .take(self.max_files)
            .collect();

        let mut total = 0_u32;
        let mut commented = 0_u32;
        for path in sources {
            if let Some(content) = api.file_text(&row.repo, path).await? {
                total += 1;
                if starts_with_comment(&content) {
                    commented += 1;
                }
            }
        }

        let percentage = if total == 0 {
            0.0
        } else {
            f64::from(commented) / f64::from(total) * 100.0
        };
        debug!(repo = %row.repo, total, commented, "Checked leading comments");

        Ok(vec![
            format!("{percentage:.2}"),
            comment_category(percentage).to_string(),
        ])
    }
}
