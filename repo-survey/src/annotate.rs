//! Offline CSV annotation: README keywords and contributor classes.

use crate::analysis::keywords::{INSTALLATION, REPRODUCIBILITY, SECURITY, USAGE};
use crate::probes::Language;
use crate::table::cell::{bool_cell, list_cell, NULL};
use crate::table::{Table, TableError};
use std::path::Path;
use tracing::info;

/// Column holding README text.
pub const README_COLUMN: &str = "readme";

/// Column holding the number of contributors.
pub const CONTRIBUTOR_COUNT_COLUMN: &str = "contributor_count";

/// Column written by [`classify_contributors`].
pub const DLR_CLASS_COLUMN: &str = "dlr_application_class";

const LANGUAGE_COLUMN: &str = "Language";

fn require(table: &Table, column: &str, source: &str) -> Result<(), TableError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(TableError::MissingColumn {
            path: source.to_string(),
            column: column.to_string(),
        })
    }
}

/// Adds README keyword columns and normalises `Language`.
///
/// Rows without README text get null keyword columns.
///
/// # Errors
///
/// Returns an error if the table has no `readme` column.
pub fn annotate_readme(table: &mut Table, source: &str) -> Result<(), TableError> {
    require(table, README_COLUMN, source)?;

    for row in 0..table.len() {
        let Some(readme) = table.get(row, README_COLUMN).map(str::to_string) else {
            for column in [
                "installation_keywords",
                "usage_keywords",
                "installation",
                "usage",
                "reproduce",
                "security",
            ] {
                table.set(row, column, NULL);
            }
            continue;
        };

        let installation = INSTALLATION.find_in(&readme);
        let usage = USAGE.find_in(&readme);
        table.set(row, "installation_keywords", list_cell(&installation));
        table.set(row, "usage_keywords", list_cell(&usage));
        table.set(row, "installation", bool_cell(!installation.is_empty()));
        table.set(row, "usage", bool_cell(!usage.is_empty()));
        table.set(row, "reproduce", bool_cell(REPRODUCIBILITY.any_in(&readme)));
        table.set(row, "security", bool_cell(SECURITY.any_in(&readme)));
    }

    if let Some(column) = table.column_index(LANGUAGE_COLUMN) {
        for row in 0..table.len() {
            let normalized = Language::normalize(table.cell(row, column));
            table.set_cell(row, column, normalized);
        }
    }
    Ok(())
}

/// Maps a contributor count to a DLR application class.
///
/// One contributor is class 0, two or three class 1, four or more class 2.
/// Counts pandas wrote as floats (`3.0`) are accepted.
#[must_use]
pub fn dlr_application_class(contributor_count: &str) -> Option<u8> {
    let count: f64 = contributor_count.trim().parse().ok()?;
    if count.fract() != 0.0 {
        return None;
    }
    match count {
        c if c >= 4.0 => Some(2),
        c if c >= 2.0 => Some(1),
        c if c >= 1.0 => Some(0),
        _ => None,
    }
}

/// Adds `dlr_application_class` from `contributor_count`.
///
/// # Errors
///
/// Returns an error if the table has no `contributor_count` column.
pub fn classify_contributors(table: &mut Table, source: &str) -> Result<(), TableError> {
    require(table, CONTRIBUTOR_COUNT_COLUMN, source)?;

    for row in 0..table.len() {
        let class = table
            .get(row, CONTRIBUTOR_COUNT_COLUMN)
            .and_then(dlr_application_class);
        table.set(row, DLR_CLASS_COLUMN, class.map(|c| c.to_string()).unwrap_or_default());
    }
    Ok(())
}

/// Annotates a CSV file in place.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks `readme`, or cannot
/// be written.
pub fn annotate_file(path: &Path, delimiter: u8, output_delimiter: u8) -> Result<(), TableError> {
    let source = path.display().to_string();
    let mut table = Table::read(path, delimiter)?;
    annotate_readme(&mut table, &source)?;
    table.write(path, output_delimiter)?;
    info!(path = %source, rows = table.len(), "Annotated README keywords");
    Ok(())
}

/// Classifies contributors of `input`, writing to `output` or back to `input`.
///
/// # Errors
///
/// Returns an error if the input cannot be read, lacks `contributor_count`,
/// or the output cannot be written.
pub fn classify_file(
    input: &Path,
    output: Option<&Path>,
    delimiter: u8,
    output_delimiter: u8,
) -> Result<(), TableError> {
    let source = input.display().to_string();
    let mut table = Table::read(input, delimiter)?;
    classify_contributors(&mut table, &source)?;

    let output = output.unwrap_or(input);
    table.write(output, output_delimiter)?;
    info!(path = %output.display(), rows = table.len(), "Classified contributors");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(csv: &str) -> Table {
        Table::from_bytes(csv.as_bytes(), b',', "test").unwrap()
    }

    #[test]
    fn annotates_keywords() {
        let mut t = table(
            "html_url,Language,readme\n\
             https://github.com/a/b,python,## Installation  pip install b  ## Usage examples\n\
             https://github.com/a/c,Julia,\n",
        );

        annotate_readme(&mut t, "test").unwrap();

        assert_eq!(t.get(0, "installation_keywords"), Some("installation"));
        assert_eq!(t.get(0, "usage_keywords"), Some("usage|examples"));
        assert_eq!(t.get(0, "installation"), Some("True"));
        assert_eq!(t.get(0, "reproduce"), Some("True"));
        assert_eq!(t.get(0, "security"), Some("False"));
        assert_eq!(t.get(0, "Language"), Some("Python"));

        assert_eq!(t.get(1, "installation"), None);
        assert_eq!(t.get(1, "Language"), Some("Other"));
    }

    #[test]
    fn annotate_requires_readme() {
        let mut t = table("html_url\nhttps://github.com/a/b\n");
        let err = annotate_readme(&mut t, "test").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { .. }));
    }

    #[test]
    fn dlr_classes() {
        assert_eq!(dlr_application_class("1"), Some(0));
        assert_eq!(dlr_application_class("2"), Some(1));
        assert_eq!(dlr_application_class("3.0"), Some(1));
        assert_eq!(dlr_application_class("4"), Some(2));
        assert_eq!(dlr_application_class("120"), Some(2));
        assert_eq!(dlr_application_class("0"), None);
        assert_eq!(dlr_application_class("-3"), None);
        assert_eq!(dlr_application_class("2.5"), None);
        assert_eq!(dlr_application_class("many"), None);
    }

    #[test]
    fn classify_file_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "html_url;contributor_count\nx;1\ny;\nz;7\n").unwrap();

        classify_file(&input, Some(&output), b';', b',').unwrap();

        let written = Table::read(&output, b',').unwrap();
        assert_eq!(written.get(0, DLR_CLASS_COLUMN), Some("0"));
        assert_eq!(written.get(1, DLR_CLASS_COLUMN), None);
        assert_eq!(written.get(2, DLR_CLASS_COLUMN), Some("2"));
        // The input is untouched.
        assert!(!Table::read(&input, b';').unwrap().has_column(DLR_CLASS_COLUMN));
    }
}
