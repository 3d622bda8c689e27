//! End-to-end pipeline tests: artifact on disk → features → predictions
//!
//! Covers model loading failures, determinism of single predictions, and
//! batch scoring over CSV files (validation order, row order, output shape).

use std::io::Write;
use std::path::Path;

use viewcast_common::batch::{self, PREDICTION_COLUMN};
use viewcast_common::dataset::ReferenceDataset;
use viewcast_common::{duration, BatchTable, Error, FeatureVector, ModelArtifact};

const LINEAR_MODEL: &str = r#"{
  "format_version": 1,
  "name": "linear-test",
  "feature_names": ["likes", "comments", "duration_minutes", "upload_hour"],
  "estimator": {"kind": "linear", "intercept": 1200.0, "coefficients": [18.5, 42.0, 35.0, 10.0]}
}"#;

const FOREST_MODEL: &str = r#"{
  "format_version": 1,
  "name": "forest-test",
  "feature_names": ["likes", "comments", "duration_minutes", "upload_hour"],
  "estimator": {
    "kind": "random_forest",
    "trees": [
      {"split": {"feature": 0, "threshold": 500.0,
                 "left": {"leaf": {"value": 1000.0}},
                 "right": {"leaf": {"value": 9000.0}}}},
      {"split": {"feature": 3, "threshold": 11.0,
                 "left": {"leaf": {"value": 2000.0}},
                 "right": {"leaf": {"value": 4000.0}}}}
    ]
  }
}"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn load(contents: &str) -> ModelArtifact {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "model.json", contents);
    ModelArtifact::load(&path).unwrap()
}

// =============================================================================
// Model loading
// =============================================================================

#[test]
fn test_missing_model_is_model_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    match ModelArtifact::load(&path) {
        Err(Error::ModelNotFound(p)) => assert_eq!(p, path),
        other => panic!("expected ModelNotFound, got {:?}", other),
    }
}

#[test]
fn test_garbage_model_is_model_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "model.json", "not json at all");

    assert!(matches!(ModelArtifact::load(&path), Err(Error::ModelCorrupt(_))));
}

#[test]
fn test_wrong_feature_order_is_model_corrupt() {
    let reordered = LINEAR_MODEL.replace(
        r#"["likes", "comments", "duration_minutes", "upload_hour"]"#,
        r#"["comments", "likes", "duration_minutes", "upload_hour"]"#,
    );
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "model.json", &reordered);

    assert!(matches!(ModelArtifact::load(&path), Err(Error::ModelCorrupt(_))));
}

#[test]
fn test_workspace_demo_model_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../model.json");
    let model = ModelArtifact::load(&path).unwrap();
    assert_eq!(model.display_name(), "views-linear-demo");
}

// =============================================================================
// Single prediction
// =============================================================================

#[test]
fn test_single_prediction_is_deterministic() {
    let model = load(LINEAR_MODEL);
    let features = FeatureVector::build(100, 10, 10.0, 12);

    let first = model.predict_views(&features);
    for _ in 0..10 {
        assert_eq!(model.predict_views(&features), first);
    }
    // 1200 + 18.5*100 + 42*10 + 35*10 + 10*12
    assert_eq!(first.views(), 3940);
}

#[test]
fn test_single_prediction_truncates() {
    let model = load(LINEAR_MODEL);
    // extra half minute adds 17.5 → raw 3957.5
    let features = FeatureVector::build(100, 10, 10.5, 12);

    assert_eq!(model.predict(&features), 3957.5);
    assert_eq!(model.predict_views(&features).views(), 3957);
}

#[test]
fn test_forest_averages_trees() {
    let model = load(FOREST_MODEL);

    // likes > 500 → 9000; hour > 11 → 4000
    let high = FeatureVector::build(1000, 0, 5.0, 12);
    assert_eq!(model.predict(&high), 6500.0);

    // threshold is inclusive on the left
    let boundary = FeatureVector::build(500, 0, 5.0, 11);
    assert_eq!(model.predict(&boundary), 1500.0);
}

#[test]
fn test_duration_feeds_feature_vector() {
    let model = load(LINEAR_MODEL);
    let minutes = duration::normalize("PT10M").unwrap();
    let features = FeatureVector::build(100, 10, minutes, 12);

    assert_eq!(model.predict_views(&features).views(), 3940);
}

// =============================================================================
// Batch scoring
// =============================================================================

#[test]
fn test_batch_preserves_row_order_and_count() {
    let model = load(LINEAR_MODEL);
    let table = BatchTable::from_csv_bytes(
        b"title,likes,comments,duration_minutes,upload_hour\n\
          a,100,10,10,12\n\
          b,0,0,0,0\n\
          c,200,20,5,23\n",
    )
    .unwrap();

    let scored = batch::score(&table, &[], &model).unwrap();

    assert_eq!(scored.row_count(), 3);
    assert_eq!(scored.columns().last().map(String::as_str), Some(PREDICTION_COLUMN));
    let col = scored.column_index(PREDICTION_COLUMN).unwrap();
    let predictions: Vec<f64> = (0..3)
        .map(|r| scored.cell(r, col).unwrap().parse().unwrap())
        .collect();
    assert_eq!(predictions, vec![3940.0, 1200.0, 6145.0]);
    assert_eq!(scored.cell(1, 0), Some("b"));

    // input untouched
    assert_eq!(table.columns().len(), 5);
}

#[test]
fn test_batch_keeps_fractional_predictions() {
    let model = load(LINEAR_MODEL);
    let table =
        BatchTable::from_csv_bytes(b"likes,comments,duration_minutes,upload_hour\n100,10,10.5,12\n")
            .unwrap();

    let scored = batch::score(&table, &[], &model).unwrap();
    let col = scored.column_index(PREDICTION_COLUMN).unwrap();
    assert_eq!(scored.cell(0, col), Some("3957.5"));
}

#[test]
fn test_batch_schema_error_names_missing_column() {
    let model = load(LINEAR_MODEL);
    let table =
        BatchTable::from_csv_bytes(b"likes,comments,duration_minutes\n100,10,10\n").unwrap();

    match batch::score(&table, &[], &model) {
        Err(Error::Schema { missing }) => assert_eq!(missing, vec!["upload_hour".to_string()]),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_batch_schema_checked_before_missing_values() {
    let model = load(LINEAR_MODEL);
    // both a missing column and an empty cell: schema wins
    let table = BatchTable::from_csv_bytes(b"likes,comments,duration_minutes\n,10,10\n").unwrap();

    assert!(matches!(
        batch::score(&table, &[], &model),
        Err(Error::Schema { .. })
    ));
}

#[test]
fn test_batch_missing_value_is_data_quality_error() {
    let model = load(LINEAR_MODEL);
    let table = BatchTable::from_csv_bytes(
        b"likes,comments,duration_minutes,upload_hour\n100,,10,12\n100,10,10,12\n",
    )
    .unwrap();

    assert!(matches!(
        batch::score(&table, &[], &model),
        Err(Error::DataQuality { .. })
    ));
}

#[test]
fn test_batch_extra_required_column() {
    let model = load(LINEAR_MODEL);
    let table =
        BatchTable::from_csv_bytes(b"likes,comments,duration_minutes,upload_hour\n1,1,1,1\n")
            .unwrap();

    match batch::score(&table, &["video_id"], &model) {
        Err(Error::Schema { missing }) => assert_eq!(missing, vec!["video_id".to_string()]),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_scored_csv_round_trips_through_file() {
    let model = load(LINEAR_MODEL);
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(
        dir.path(),
        "in.csv",
        "likes,comments,duration_minutes,upload_hour\n100,10,10,12\n",
    );

    let table = BatchTable::from_path(&input).unwrap();
    let scored = batch::score(&table, &[], &model).unwrap();
    let output = dir.path().join("out.csv");
    scored.write_csv(std::fs::File::create(&output).unwrap()).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        text,
        "likes,comments,duration_minutes,upload_hour,Predicted_Views\n100,10,10,12,3940\n"
    );
}

// =============================================================================
// Reference dataset
// =============================================================================

#[test]
fn test_workspace_dataset_supports_exploration() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let model = ModelArtifact::load(&root.join("model.json")).unwrap();
    let dataset = ReferenceDataset::load(&root.join("data/youtube_dataset.csv")).unwrap();

    let rows = dataset.table().row_count();
    assert!(rows > 0);
    assert_eq!(dataset.preview(5).row_count(), 5.min(rows));
    assert_eq!(dataset.likes_vs_views().unwrap().len(), rows);

    let report = dataset.performance(&model).unwrap();
    assert_eq!(report.points.len(), rows);
    assert!(report.actual_min <= report.actual_max);
    assert!(report.mae >= 0.0);
}

#[test]
fn test_missing_dataset_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ReferenceDataset::load(&dir.path().join("none.csv")),
        Err(Error::NotFound(_))
    ));
}
