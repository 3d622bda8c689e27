//! # viewcast common library
//!
//! The prediction pipeline shared by the dashboard service and the offline
//! scorer:
//! - Duration normalization (ISO-8601 → minutes)
//! - Feature vector construction
//! - Model artifact loading and scoring
//! - Table parsing, batch scoring, and CSV output
//! - Video identifier extraction
//! - Reference dataset views
//! - Configuration loading

pub mod batch;
pub mod config;
pub mod dataset;
pub mod duration;
pub mod error;
pub mod features;
pub mod model;
pub mod table;
pub mod video_id;

pub use error::{Error, Result};
pub use features::FeatureVector;
pub use model::{ModelArtifact, PredictionResult};
pub use table::BatchTable;
