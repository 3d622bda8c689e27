//! Reference dataset and exploratory views
//!
//! The reference CSV (`likes`, `views`, plus the feature columns) backs the
//! dashboard's likes-vs-views scatter, the actual-vs-predicted comparison and
//! the sample preview.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::batch::feature_rows;
use crate::model::ModelArtifact;
use crate::table::BatchTable;
use crate::{Error, Result};

/// Column holding observed view counts
pub const VIEWS_COLUMN: &str = "views";

/// Rows shown by default in a preview
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Scatter point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Actual-vs-predicted comparison over the reference dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// `x` = actual views, `y` = predicted views
    pub points: Vec<Point>,
    pub mae: f64,
    pub rmse: f64,
    /// Coefficient of determination; `None` when actual views are constant
    pub r2: Option<f64>,
    /// Endpoints of the identity line
    pub actual_min: f64,
    pub actual_max: f64,
}

/// Loaded reference dataset
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    table: BatchTable,
}

impl ReferenceDataset {
    pub fn new(table: BatchTable) -> Self {
        Self { table }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("dataset {}", path.display())));
        }
        let table = BatchTable::from_path(path)?;
        info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.columns().len(),
            "Loaded reference dataset"
        );
        Ok(Self { table })
    }

    pub fn table(&self) -> &BatchTable {
        &self.table
    }

    /// First `rows` rows
    pub fn preview(&self, rows: usize) -> BatchTable {
        self.table.head(rows)
    }

    /// `(likes, views)` points; rows missing either value are skipped
    pub fn likes_vs_views(&self) -> Result<Vec<Point>> {
        let likes = self.required_numeric("likes")?;
        let views = self.required_numeric(VIEWS_COLUMN)?;
        Ok(likes
            .into_iter()
            .zip(views)
            .filter_map(|(x, y)| Some(Point { x: x?, y: y? }))
            .collect())
    }

    /// Score every row and compare against observed views.
    ///
    /// Rows with a missing or non-numeric view count are left out of the
    /// comparison; feature cells must all be valid (see
    /// [`crate::features::FeatureVector::from_row`]).
    pub fn performance(&self, model: &ModelArtifact) -> Result<PerformanceReport> {
        let views = self.required_numeric(VIEWS_COLUMN)?;
        let features = feature_rows(&self.table)?;
        let predicted = model.predict_batch(&features);

        let points: Vec<Point> = views
            .into_iter()
            .zip(predicted)
            .filter_map(|(actual, predicted)| Some(Point { x: actual?, y: predicted }))
            .collect();

        if points.is_empty() {
            return Err(Error::DataQuality {
                issues: vec!["dataset has no rows with observed views".to_string()],
            });
        }

        Ok(performance_report(points))
    }

    fn required_numeric(&self, column: &str) -> Result<Vec<Option<f64>>> {
        self.table.numeric_column(column).ok_or_else(|| Error::Schema {
            missing: vec![column.to_string()],
        })
    }
}

fn performance_report(points: Vec<Point>) -> PerformanceReport {
    let n = points.len() as f64;
    let mean_actual = points.iter().map(|p| p.x).sum::<f64>() / n;
    let abs_error = points.iter().map(|p| (p.x - p.y).abs()).sum::<f64>();
    let sq_error = points.iter().map(|p| (p.x - p.y).powi(2)).sum::<f64>();
    let total_var = points.iter().map(|p| (p.x - mean_actual).powi(2)).sum::<f64>();

    let actual_min = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let actual_max = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);

    PerformanceReport {
        mae: abs_error / n,
        rmse: (sq_error / n).sqrt(),
        r2: (total_var > 0.0).then(|| 1.0 - sq_error / total_var),
        actual_min,
        actual_max,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Estimator;

    const DATA: &str = "\
likes,comments,duration_minutes,upload_hour,views
10,1,5,12,100
20,2,5,12,200
,3,5,12,300
40,4,5,12,
";

    fn dataset() -> ReferenceDataset {
        ReferenceDataset::new(BatchTable::from_reader(DATA.as_bytes()).unwrap())
    }

    fn tenfold() -> ModelArtifact {
        ModelArtifact::new(
            None,
            Estimator::Linear {
                intercept: 0.0,
                coefficients: vec![10.0, 0.0, 0.0, 0.0],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_likes_vs_views_skips_incomplete_rows() {
        let points = dataset().likes_vs_views().unwrap();
        assert_eq!(
            points,
            vec![Point { x: 10.0, y: 100.0 }, Point { x: 20.0, y: 200.0 }]
        );
    }

    #[test]
    fn test_performance_requires_numeric_features() {
        // Row 3 has no likes
        assert!(matches!(
            dataset().performance(&tenfold()),
            Err(Error::DataQuality { .. })
        ));
    }

    #[test]
    fn test_perfect_model_report() {
        let table = BatchTable::from_reader(
            "likes,comments,duration_minutes,upload_hour,views\n10,1,5,12,100\n30,2,5,12,300\n4,2,5,12,\n"
                .as_bytes(),
        )
        .unwrap();
        let report = ReferenceDataset::new(table).performance(&tenfold()).unwrap();
        assert_eq!(report.points.len(), 2);
        assert_eq!(report.mae, 0.0);
        assert_eq!(report.rmse, 0.0);
        assert_eq!(report.r2, Some(1.0));
        assert_eq!((report.actual_min, report.actual_max), (100.0, 300.0));
    }

    #[test]
    fn test_report_metrics() {
        let report = performance_report(vec![
            Point { x: 100.0, y: 110.0 },
            Point { x: 200.0, y: 190.0 },
        ]);
        assert_eq!(report.mae, 10.0);
        assert_eq!(report.rmse, 10.0);
        // total variance 2 * 50^2 = 5000, squared error 200
        assert_eq!(report.r2, Some(1.0 - 200.0 / 5000.0));
    }

    #[test]
    fn test_constant_actuals_have_no_r2() {
        let report = performance_report(vec![Point { x: 5.0, y: 4.0 }, Point { x: 5.0, y: 6.0 }]);
        assert_eq!(report.r2, None);
    }

    #[test]
    fn test_missing_views_column() {
        let table = BatchTable::from_reader("likes\n1\n".as_bytes()).unwrap();
        assert!(matches!(
            ReferenceDataset::new(table).likes_vs_views(),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_preview() {
        assert_eq!(dataset().preview(2).row_count(), 2);
        assert_eq!(dataset().preview(50).row_count(), 4);
    }
}
