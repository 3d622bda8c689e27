//! In-memory delimited table
//!
//! Uploaded and reference CSV files are held as a header row plus string
//! cells so that columns the pipeline does not know about survive scoring
//! untouched and are written back out verbatim.

use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::{Error, Result};

/// Cell values treated as missing, in addition to empty/whitespace cells
pub const NULL_MARKERS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Header plus rows of string cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BatchTable {
    /// Create a table, padding short rows with empty cells
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Parse CSV text with a header row.
    ///
    /// Rows may be shorter than the header (missing trailing cells read as
    /// empty); rows longer than the header are a parse error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(Error::InvalidInput("CSV has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > columns.len() {
                return Err(Error::InvalidInput(format!(
                    "row {} has {} cells but the header has {} columns",
                    line + 1,
                    record.len(),
                    columns.len()
                )));
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(columns, rows))
    }

    /// Parse CSV bytes (e.g. an uploaded file)
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        // Excel exports often start with a UTF-8 byte order mark
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        Self::from_reader(bytes)
    }

    /// Load a CSV file from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_csv_bytes(&bytes)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// First `n` rows as a new table
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Numeric values of a column; `None` for missing or non-numeric cells
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).and_then(|cell| parse_number(cell)))
                .collect(),
        )
    }

    /// Copy of this table with one column appended
    pub fn with_column(&self, name: &str, values: Vec<String>) -> Result<Self> {
        if self.column_index(name).is_some() {
            return Err(Error::InvalidInput(format!("column '{}' already exists", name)));
        }
        if values.len() != self.rows.len() {
            return Err(Error::InvalidInput(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push(value);
                row
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Serialize back to CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_csv(&mut out)?;
        Ok(out)
    }
}

/// True for empty cells and conventional null markers
pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || NULL_MARKERS.contains(&cell)
}

/// Parse a finite number from a cell, `None` if missing or not numeric
pub fn parse_number(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
