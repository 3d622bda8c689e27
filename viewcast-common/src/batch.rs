//! Batch scoring of uploaded tables
//!
//! Validation happens in full before any scoring: schema first, then data
//! quality. A table either comes back with exactly one new
//! [`PREDICTION_COLUMN`] or not at all; the input is never modified.

use tracing::{info, warn};

use crate::features::{FeatureVector, FEATURE_COLUMNS};
use crate::model::ModelArtifact;
use crate::table::{is_missing, BatchTable};
use crate::{Error, Result};

/// Column appended to scored tables
pub const PREDICTION_COLUMN: &str = "Predicted_Views";

/// Offending cells listed per error before the message is cut short
const MAX_REPORTED_CELLS: usize = 10;

/// Check that every required column exists.
///
/// Returns [`Error::Schema`] naming every missing column, in the order given.
pub fn check_schema(table: &BatchTable, required_columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = required_columns
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema { missing })
    }
}

/// Check that required columns have no missing values.
///
/// Assumes [`check_schema`] passed.
pub fn check_missing_values(table: &BatchTable, required_columns: &[&str]) -> Result<()> {
    let mut issues = Vec::new();

    for column in required_columns {
        let Some(idx) = table.column_index(column) else {
            continue;
        };
        let rows: Vec<usize> = (0..table.row_count())
            .filter(|&row| table.cell(row, idx).map_or(true, is_missing))
            .map(|row| row + 1)
            .collect();

        if !rows.is_empty() {
            issues.push(format!(
                "column '{}' has {} missing value(s) at row(s) {}",
                column,
                rows.len(),
                summarize_rows(&rows)
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::DataQuality { issues })
    }
}

/// Build one feature vector per row, in row order.
///
/// Cell problems from every row are collected (up to a cap) and reported in
/// one [`Error::DataQuality`].
pub fn feature_rows(table: &BatchTable) -> Result<Vec<FeatureVector>> {
    let mut features = Vec::with_capacity(table.row_count());
    let mut issues = Vec::new();

    for row in 0..table.row_count() {
        match FeatureVector::from_row(table, row) {
            Ok(vector) => features.push(vector),
            Err(Error::DataQuality { issues: row_issues }) => {
                let room = MAX_REPORTED_CELLS.saturating_sub(issues.len());
                issues.extend(row_issues.into_iter().take(room));
            }
            Err(e) => return Err(e),
        }
    }

    if issues.is_empty() {
        Ok(features)
    } else {
        Err(Error::DataQuality { issues })
    }
}

/// Validate and score a table, returning a copy with [`PREDICTION_COLUMN`].
///
/// `required_columns` adds to the always-required feature columns. Predictions
/// stay real-valued here; only the single-prediction path truncates.
pub fn score(
    table: &BatchTable,
    required_columns: &[&str],
    model: &ModelArtifact,
) -> Result<BatchTable> {
    let mut required: Vec<&str> = FEATURE_COLUMNS.to_vec();
    for &column in required_columns {
        if !required.contains(&column) {
            required.push(column);
        }
    }

    if let Err(e) = check_schema(table, &required) {
        warn!(error = %e, "Rejected table: schema");
        return Err(e);
    }
    if let Err(e) = check_missing_values(table, &required) {
        warn!(error = %e, "Rejected table: missing values");
        return Err(e);
    }
    if table.column_index(PREDICTION_COLUMN).is_some() {
        return Err(Error::InvalidInput(format!(
            "table already has a '{}' column",
            PREDICTION_COLUMN
        )));
    }

    let features = feature_rows(table)?;
    let predictions = model.predict_batch(&features);
    let scored = table.with_column(
        PREDICTION_COLUMN,
        predictions.iter().map(|p| p.to_string()).collect(),
    )?;

    info!(
        rows = scored.row_count(),
        columns = scored.columns().len(),
        model = model.display_name(),
        "Scored table"
    );

    Ok(scored)
}

fn summarize_rows(rows: &[usize]) -> String {
    let shown: Vec<String> = rows
        .iter()
        .take(MAX_REPORTED_CELLS)
        .map(|r| r.to_string())
        .collect();
    if rows.len() > MAX_REPORTED_CELLS {
        format!("{}, ...", shown.join(", "))
    } else {
        shown.join(", ")
    }
}
