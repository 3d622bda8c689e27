//! Feature vector construction
//!
//! The model consumes a fixed-order tuple
//! `(likes, comments, duration_minutes, upload_hour)`. The order here must
//! match the order the artifact was trained on; [`crate::model`] checks the
//! artifact's declared feature names against [`FEATURE_COLUMNS`] at load time.
//!
//! The builder performs no range validation. Callers collecting manual input
//! enforce bounds themselves (see [`FeatureVector::check_ranges`]).

use serde::{Deserialize, Serialize};

use crate::table::{parse_number, BatchTable};
use crate::{Error, Result};

/// Column names in model feature order
pub const FEATURE_COLUMNS: [&str; 4] = ["likes", "comments", "duration_minutes", "upload_hour"];

/// Number of model input features
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Highest valid upload hour (24h clock)
pub const MAX_UPLOAD_HOUR: u32 = 23;

/// Model input for a single video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub likes: u64,
    pub comments: u64,
    pub duration_minutes: f64,
    pub upload_hour: u32,
}

impl FeatureVector {
    /// Pure construction; values are taken as given
    pub fn build(likes: u64, comments: u64, duration_minutes: f64, upload_hour: u32) -> Self {
        Self {
            likes,
            comments,
            duration_minutes,
            upload_hour,
        }
    }

    /// Values in [`FEATURE_COLUMNS`] order
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.likes as f64,
            self.comments as f64,
            self.duration_minutes,
            self.upload_hour as f64,
        ]
    }

    /// Range check for manually entered values.
    ///
    /// Not called by [`FeatureVector::build`]; input surfaces call it the way
    /// a bounded widget would.
    pub fn check_ranges(&self) -> Result<()> {
        if !self.duration_minutes.is_finite() || self.duration_minutes < 0.0 {
            return Err(Error::InvalidInput(format!(
                "duration_minutes must be a non-negative number, got {}",
                self.duration_minutes
            )));
        }
        if self.upload_hour > MAX_UPLOAD_HOUR {
            return Err(Error::InvalidInput(format!(
                "upload_hour must be between 0 and {}, got {}",
                MAX_UPLOAD_HOUR, self.upload_hour
            )));
        }
        Ok(())
    }

    /// Build from one row of a table using the named feature columns.
    ///
    /// Cells are taken as written: counts must be whole non-negative numbers
    /// (`100.0` is fine, `7.9` or `-5` is not) and the hour a whole number.
    /// No range check happens here; every offending cell in the row is
    /// reported in one [`Error::DataQuality`].
    pub fn from_row(table: &BatchTable, row: usize) -> Result<Self> {
        let mut issues = Vec::new();
        let mut cell_value = |column: &str, whole: Option<f64>| -> Result<Option<f64>> {
            let idx = table.column_index(column).ok_or_else(|| Error::Schema {
                missing: vec![column.to_string()],
            })?;
            let cell = table.cell(row, idx).unwrap_or("");
            let Some(value) = parse_number(cell) else {
                issues.push(format!(
                    "column '{}' row {}: {:?} is not a number",
                    column,
                    row + 1,
                    cell
                ));
                return Ok(None);
            };
            if let Some(max) = whole {
                if value < 0.0 || value.fract() != 0.0 || value > max {
                    issues.push(format!(
                        "column '{}' row {}: {} is not a whole non-negative number",
                        column,
                        row + 1,
                        value
                    ));
                    return Ok(None);
                }
            }
            Ok(Some(value))
        };

        let likes = cell_value("likes", Some(u64::MAX as f64))?;
        let comments = cell_value("comments", Some(u64::MAX as f64))?;
        let duration_minutes = cell_value("duration_minutes", None)?;
        let upload_hour = cell_value("upload_hour", Some(u32::MAX as f64))?;

        match (likes, comments, duration_minutes, upload_hour) {
            (Some(likes), Some(comments), Some(duration_minutes), Some(upload_hour)) => {
                Ok(Self::build(
                    likes as u64,
                    comments as u64,
                    duration_minutes,
                    upload_hour as u32,
                ))
            }
            _ => Err(Error::DataQuality { issues }),
        }
    }
}
