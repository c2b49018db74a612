//! In-memory CSV tables.
//!
//! A [`Table`] is read once, augmented column by column, and written back
//! atomically. Every cell is a string; see [`cell`] for value conventions.

pub mod cell;
mod error;

pub use error::TableError;

use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// UTF-8 byte-order mark.
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given headers.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Reads a delimited file.
    ///
    /// The file is decoded as UTF-8, falling back to ISO-8859-1. Short rows
    /// are padded; rows with more fields than the header are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(path: &Path, delimiter: u8) -> Result<Self, TableError> {
        let bytes = std::fs::read(path).map_err(|e| TableError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_bytes(&bytes, delimiter, &path.display().to_string())
    }

    /// Parses CSV bytes; `source` names the origin in errors and logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid CSV.
    pub fn from_bytes(bytes: &[u8], delimiter: u8, source: &str) -> Result<Self, TableError> {
        let text = decode_text(bytes, source);
        let csv_error = |e: csv::Error| TableError::Csv {
            path: source.to_string(),
            source: e,
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Self::new(headers);
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;
            if record.len() > table.headers.len() {
                warn!(
                    source,
                    line = line + 2,
                    fields = record.len(),
                    "Skipping row with more fields than header"
                );
                continue;
            }
            table.push_row(record.iter().map(str::to_string).collect());
        }

        debug!(source, rows = table.len(), "Read table");
        Ok(table)
    }

    /// Returns the header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of the first column matching any of `names`.
    pub fn find_column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.column_index(name))
    }

    /// Returns true if the column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Adds a column of nulls if absent, returning its position.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Appends a row, padding it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Raw cell by position, empty string if out of range.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Non-null cell value by column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        let value = self.cell(row, index);
        (!value.trim().is_empty()).then_some(value)
    }

    /// Sets a cell by position. Out-of-range rows are ignored.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Sets a cell by column name, adding the column if needed.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        let index = self.ensure_column(column);
        self.set_cell(row, index, value);
    }

    /// Iterates over data rows.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Merges a previous output into this input by `key`.
    ///
    /// The result keeps every existing row in order, fills columns only the
    /// input has, and appends input rows that are new. Existing non-null
    /// values win over input values. Rows sharing a key, blank keys included,
    /// are paired in order. Also returns the positions of the rows that came
    /// from the input.
    pub fn merge_into_existing(&self, existing: &Table, key: &str) -> (Table, Vec<usize>) {
        let mut merged = existing.clone();
        let column_map: Vec<usize> = self
            .headers
            .iter()
            .map(|h| merged.ensure_column(h))
            .collect();

        let mut by_key: HashMap<String, VecDeque<usize>> = HashMap::new();
        if let Some(key_index) = merged.column_index(key) {
            for (position, row) in merged.rows.iter().enumerate() {
                by_key
                    .entry(row[key_index].trim().to_string())
                    .or_default()
                    .push_back(position);
            }
        }

        let input_key = self.column_index(key);

        let mut current = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let value = input_key.map_or("", |k| row[k].trim());
            let matched = by_key.get_mut(value).and_then(VecDeque::pop_front);

            let position = match matched {
                Some(position) => {
                    for (value, &target) in row.iter().zip(&column_map) {
                        if merged.cell(position, target).trim().is_empty() {
                            merged.set_cell(position, target, value.clone());
                        }
                    }
                    position
                }
                None => {
                    let mut new_row = vec![String::new(); merged.headers.len()];
                    for (value, &target) in row.iter().zip(&column_map) {
                        new_row[target] = value.clone();
                    }
                    merged.rows.push(new_row);
                    merged.rows.len() - 1
                }
            };
            current.push(position);
        }

        (merged, current)
    }

    /// Writes the table as CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the writer fails.
    pub fn to_writer<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), csv::Error> {
        let mut csv = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
        csv.write_record(&self.headers)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Writes the table to `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or moved.
    pub fn write(&self, path: &Path, delimiter: u8) -> Result<(), TableError> {
        let path_str = path.display().to_string();
        let io_error = |e: std::io::Error| TableError::Io {
            path: path_str.clone(),
            source: e,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(io_error)?;

        let mut temp = NamedTempFile::new_in(parent).map_err(io_error)?;
        self.to_writer(temp.as_file_mut(), delimiter)
            .map_err(|e| TableError::Csv {
                path: path_str.clone(),
                source: e,
            })?;

        temp.persist(path).map_err(|e| TableError::Persist {
            path: path_str.clone(),
            source: e,
        })?;

        debug!(path = %path_str, rows = self.len(), "Wrote table");
        Ok(())
    }
}

/// Decodes file bytes as UTF-8 without BOM, falling back to ISO-8859-1.
fn decode_text(bytes: &[u8], source: &str) -> String {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!(source, "Input is not valid UTF-8, reading as ISO-8859-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

/// Parses a delimiter flag value.
///
/// # Errors
///
/// Returns the offending character if it is not a single ASCII byte.
pub fn parse_delimiter(value: char) -> Result<u8, char> {
    u8::try_from(value)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(value)
}
