//! Pre-trained regression artifact
//!
//! The artifact is a JSON document produced by the training side. It is
//! loaded once at startup, validated structurally, and then shared read-only
//! (`Arc<ModelArtifact>`) by everything that scores. Nothing here mutates
//! after [`ModelArtifact::load`] returns, so predictions are deterministic.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "views-linear-v3",
//!   "feature_names": ["likes", "comments", "duration_minutes", "upload_hour"],
//!   "estimator": { "kind": "linear", "intercept": 1200.0,
//!                  "coefficients": [18.5, 42.0, 35.0, 10.0] }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::features::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::{Error, Result};

/// Artifact format understood by this build
pub const FORMAT_VERSION: u32 = 1;

/// Decision tree node (go left when `x[feature] <= threshold`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    fn validate(&self, path: &str) -> Result<()> {
        match self {
            TreeNode::Leaf { value } => check_finite(*value, path),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(Error::ModelCorrupt(format!(
                        "{}: feature index {} out of range (model has {} features)",
                        path, feature, FEATURE_COUNT
                    )));
                }
                check_finite(*threshold, path)?;
                left.validate(&format!("{}.left", path))?;
                right.validate(&format!("{}.right", path))
            }
        }
    }
}

/// Regression estimator families the artifact may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// `intercept + Σ coefficients[i] * x[i]`
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// Mean of the trees' outputs
    RandomForest { trees: Vec<TreeNode> },
    /// `base_score + learning_rate * Σ tree(x)`
    GradientBoosting {
        base_score: f64,
        learning_rate: f64,
        trees: Vec<TreeNode>,
    },
}

impl Estimator {
    fn kind(&self) -> &'static str {
        match self {
            Estimator::Linear { .. } => "linear",
            Estimator::RandomForest { .. } => "random_forest",
            Estimator::GradientBoosting { .. } => "gradient_boosting",
        }
    }

    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
            Estimator::RandomForest { trees } => {
                trees.iter().map(|t| t.predict(x)).sum::<f64>() / trees.len() as f64
            }
            Estimator::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => base_score + learning_rate * trees.iter().map(|t| t.predict(x)).sum::<f64>(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(Error::ModelCorrupt(format!(
                        "linear model has {} coefficients, expected {}",
                        coefficients.len(),
                        FEATURE_COUNT
                    )));
                }
                check_finite(*intercept, "intercept")?;
                for (i, c) in coefficients.iter().enumerate() {
                    check_finite(*c, &format!("coefficients[{}]", i))?;
                }
                Ok(())
            }
            Estimator::RandomForest { trees } => validate_trees(trees),
            Estimator::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => {
                check_finite(*base_score, "base_score")?;
                check_finite(*learning_rate, "learning_rate")?;
                validate_trees(trees)
            }
        }
    }
}

fn validate_trees(trees: &[TreeNode]) -> Result<()> {
    if trees.is_empty() {
        return Err(Error::ModelCorrupt("ensemble has no trees".to_string()));
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(&format!("trees[{}]", i))?;
    }
    Ok(())
}

fn check_finite(value: f64, what: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::ModelCorrupt(format!("{} is not a finite number", what)))
    }
}

/// Loaded, validated predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub feature_names: Vec<String>,
    pub estimator: Estimator,
}

impl ModelArtifact {
    /// Load and validate an artifact from disk.
    ///
    /// # Errors
    ///
    /// - [`Error::ModelNotFound`] when `path` does not exist
    /// - [`Error::ModelCorrupt`] when it cannot be read, parsed, or validated
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ModelNotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| Error::ModelCorrupt(format!("{}: {}", path.display(), e)))?;
        let artifact = Self::from_json_slice(&bytes)?;

        info!(
            path = %path.display(),
            name = artifact.display_name(),
            kind = artifact.estimator.kind(),
            "Loaded model artifact"
        );

        Ok(artifact)
    }

    /// Parse and validate an artifact from JSON bytes
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::ModelCorrupt(e.to_string()))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Build an artifact in memory (validated like a loaded one)
    pub fn new(name: Option<String>, estimator: Estimator) -> Result<Self> {
        let artifact = Self {
            format_version: FORMAT_VERSION,
            name,
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            estimator,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::ModelCorrupt(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.feature_names != FEATURE_COLUMNS {
            return Err(Error::ModelCorrupt(format!(
                "feature_names {:?} do not match expected order {:?}",
                self.feature_names, FEATURE_COLUMNS
            )));
        }
        self.estimator.validate()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Raw real-valued prediction for one feature row
    pub fn predict_row(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.estimator.predict(x)
    }

    /// Raw real-valued prediction for one vector
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.predict_row(&features.as_array())
    }

    /// Raw real-valued predictions, in input order
    pub fn predict_batch(&self, features: &[FeatureVector]) -> Vec<f64> {
        debug!(rows = features.len(), "Scoring batch");
        features.iter().map(|f| self.predict(f)).collect()
    }

    /// Single-prediction path: raw output truncated to whole views
    pub fn predict_views(&self, features: &FeatureVector) -> PredictionResult {
        PredictionResult::from_raw(self.predict(features))
    }
}

/// Whole-view estimate shown for a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PredictionResult(pub u64);

impl PredictionResult {
    /// Truncate toward zero; negative or NaN outputs saturate at 0
    pub fn from_raw(raw: f64) -> Self {
        Self(raw.trunc() as u64)
    }

    pub fn views(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: f64) -> Box<TreeNode> {
        Box::new(TreeNode::Leaf { value })
    }

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left: leaf(left),
            right: leaf(right),
        }
    }

    fn linear() -> ModelArtifact {
        ModelArtifact::new(
            Some("test".to_string()),
            Estimator::Linear {
                intercept: 100.0,
                coefficients: vec![10.0, 5.0, 2.5, -1.0],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_linear_prediction() {
        let v = FeatureVector::build(100, 10, 10.0, 12);
        // 100 + 1000 + 50 + 25 - 12
        assert_eq!(linear().predict(&v), 1163.0);
    }

    #[test]
    fn test_forest_is_mean_of_trees() {
        let model = ModelArtifact::new(
            None,
            Estimator::RandomForest {
                trees: vec![stump(0, 50.0, 1.0, 3.0), stump(3, 12.0, 10.0, 20.0)],
            },
        )
        .unwrap();
        let v = FeatureVector::build(100, 0, 0.0, 12);
        // tree 1 goes right (3.0), tree 2 goes left (10.0, equal goes left)
        assert_eq!(model.predict(&v), 6.5);
    }

    #[test]
    fn test_gradient_boosting() {
        let model = ModelArtifact::new(
            None,
            Estimator::GradientBoosting {
                base_score: 1000.0,
                learning_rate: 0.5,
                trees: vec![stump(1, 5.0, -100.0, 100.0), stump(2, 8.0, 40.0, 60.0)],
            },
        )
        .unwrap();
        let v = FeatureVector::build(0, 10, 5.0, 0);
        assert_eq!(model.predict(&v), 1000.0 + 0.5 * (100.0 + 40.0));
    }

    #[test]
    fn test_truncation_not_rounding() {
        assert_eq!(PredictionResult::from_raw(1234.99).views(), 1234);
        assert_eq!(PredictionResult::from_raw(0.4).views(), 0);
        assert_eq!(PredictionResult::from_raw(-12.7).views(), 0);
        assert_eq!(PredictionResult::from_raw(f64::NAN).views(), 0);
    }

    #[test]
    fn test_batch_keeps_real_values_and_order() {
        let model = linear();
        let features = [
            FeatureVector::build(1, 0, 0.0, 0),
            FeatureVector::build(0, 0, 0.1, 0),
        ];
        assert_eq!(model.predict_batch(&features), vec![110.0, 100.25]);
    }

    #[test]
    fn test_wrong_feature_order_is_corrupt() {
        let json = r#"{"format_version":1,
            "feature_names":["comments","likes","duration_minutes","upload_hour"],
            "estimator":{"kind":"linear","intercept":0,"coefficients":[1,1,1,1]}}"#;
        assert!(matches!(
            ModelArtifact::from_json_slice(json.as_bytes()),
            Err(Error::ModelCorrupt(_))
        ));
    }

    #[test]
    fn test_structural_errors_are_corrupt() {
        let bad = [
            Estimator::Linear {
                intercept: 0.0,
                coefficients: vec![1.0, 2.0],
            },
            Estimator::RandomForest { trees: vec![] },
            Estimator::RandomForest {
                trees: vec![stump(4, 0.0, 1.0, 2.0)],
            },
            Estimator::GradientBoosting {
                base_score: f64::INFINITY,
                learning_rate: 0.1,
                trees: vec![stump(0, 0.0, 1.0, 2.0)],
            },
        ];
        for estimator in bad {
            assert!(matches!(
                ModelArtifact::new(None, estimator),
                Err(Error::ModelCorrupt(_))
            ));
        }
    }

    #[test]
    fn test_tree_json_shape() {
        let json = r#"{"format_version":1,
            "feature_names":["likes","comments","duration_minutes","upload_hour"],
            "estimator":{"kind":"random_forest","trees":[
                {"split":{"feature":0,"threshold":10,"left":{"leaf":{"value":1}},"right":{"leaf":{"value":2}}}}
            ]}}"#;
        let model = ModelArtifact::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(model.predict_row(&[11.0, 0.0, 0.0, 0.0]), 2.0);
        assert_eq!(model.display_name(), "unnamed");
    }
}
