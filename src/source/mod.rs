// src/source/mod.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{collections::HashMap, fs::File, io::Read, path::Path};
use tracing::{debug, info};

use crate::error::RowError;

/// Cell contents spreadsheet exports use to mean "nothing here".
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One data row, keyed by normalized column name.
/// A `None` cell is missing (blank or a missing-value marker); a column absent
/// from the map was never in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    cells: HashMap<String, Option<String>>,
}

impl SourceRow {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cells = HashMap::new();
        for (k, v) in pairs {
            cells
                .entry(normalize_header(k.as_ref()))
                .or_insert_with(|| clean_cell(v.as_ref()));
        }
        Self { cells }
    }

    /// Cell of a column the row cannot do without. Errors when the column is
    /// not in the file at all; a blank cell is still `Ok(None)`.
    pub fn required(&self, column: &'static str) -> Result<Option<&str>, RowError> {
        self.cells
            .get(column)
            .map(Option::as_deref)
            .ok_or(RowError::MissingColumn(column))
    }

    /// Cell of an optional column; missing column and blank cell look the same.
    pub fn optional(&self, column: &str) -> Option<&str> {
        self.cells.get(column).and_then(Option::as_deref)
    }
}

/// The whole input file, loaded up front and never mutated.
#[derive(Debug, Default)]
pub struct SourceTable {
    /// Normalized header names in file order.
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trim, lower-case and drop a leading BOM.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Trim and map blanks and missing-value markers to `None`.
fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Open `path` and read it as a delimited table with a header row.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<SourceTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open source file: {:?}", path.as_ref()))?;
    let table = read_table(file, delimiter)
        .with_context(|| format!("Failed to read source file: {:?}", path.as_ref()))?;
    info!(
        rows = table.len(),
        columns = table.headers.len(),
        "loaded source table"
    );
    Ok(table)
}

/// Parse a delimited table from any reader. Short rows get missing trailing
/// cells; extra cells beyond the header are ignored.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<SourceTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("CSV header row could not be read")?
        .iter()
        .map(normalize_header)
        .collect();
    debug!(?headers, "normalized headers");

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        let row = SourceRow::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.as_str(), record.get(i).unwrap_or(""))),
        );
        rows.push(row);
    }

    Ok(SourceTable { headers, rows })
}
