//! Cell value conventions.
//!
//! Empty cells are null. Booleans use the `True`/`False` spelling pandas
//! writes so existing datasets stay readable. Lists join with `|`.

/// Value written for a null cell.
pub const NULL: &str = "";

/// Separator for list-valued cells.
pub const LIST_SEPARATOR: &str = "|";

/// Renders a boolean cell.
#[must_use]
pub fn bool_cell(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Parses a boolean cell, accepting the common spellings.
#[must_use]
pub fn parse_bool_cell(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Joins list items into one cell.
#[must_use]
pub fn list_cell<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Renders an optional value, `None` becoming null.
#[must_use]
pub fn opt_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
