//! Target languages of the survey.

use super::RowContext;
use crate::github::RepoMetadata;
use std::fmt;

/// Languages that language-specific probes understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    R,
    Cpp,
}

impl Language {
    /// Parses a language name; anything outside the targets is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "python" => Some(Self::Python),
            "r" => Some(Self::R),
            "c++" | "cpp" => Some(Self::Cpp),
            _ => None,
        }
    }

    /// Canonical spelling used in CSV files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::R => "R",
            Self::Cpp => "C++",
        }
    }

    /// Maps any language name to a target spelling or `Other`.
    #[must_use]
    pub fn normalize(value: &str) -> &'static str {
        Self::parse(value).map_or("Other", Self::as_str)
    }

    /// Language from the row, falling back to the repository's primary language.
    pub fn for_row(row: &RowContext, meta: &RepoMetadata) -> Option<Self> {
        match row.language() {
            Some(value) => Self::parse(value),
            None => meta.language.as_deref().and_then(Self::parse),
        }
    }
}

/// False when the row names a language outside the targets. Rows without
/// a language stay in scope until the API is asked.
pub fn row_in_scope(row: &RowContext) -> bool {
    row.language().map_or(true, |value| Language::parse(value).is_some())
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::test_row;

    #[test]
    fn parses_target_languages() {
        assert_eq!(Language::parse("Python"), Some(Language::Python));
        assert_eq!(Language::parse(" r "), Some(Language::R));
        assert_eq!(Language::parse("C++"), Some(Language::Cpp));
        assert_eq!(Language::parse("Rust"), None);
        assert_eq!(Language::parse("Ruby"), None);
    }

    #[test]
    fn rows_naming_other_languages_are_out_of_scope() {
        assert!(row_in_scope(&test_row(&[("Language", "R")])));
        assert!(row_in_scope(&test_row(&[])));
        assert!(!row_in_scope(&test_row(&[("Language", "Rust")])));
    }

    #[test]
    fn normalizes_to_other() {
        assert_eq!(Language::normalize("python"), "Python");
        assert_eq!(Language::normalize("JavaScript"), "Other");
        assert_eq!(Language::normalize(""), "Other");
    }
}
