//! viewcast-score - offline batch scoring
//!
//! Reads a CSV with the feature columns, appends `Predicted_Views`, and
//! writes the result to a file or stdout. Same validation as `/api/batch`.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use viewcast_common::config::DEFAULT_MODEL_PATH;
use viewcast_common::{batch, BatchTable, ModelArtifact};

#[derive(Parser, Debug)]
#[command(name = "viewcast-score")]
#[command(about = "Score a CSV of video features with the view-count model")]
#[command(version)]
struct Args {
    /// Input CSV
    input: PathBuf,

    /// Output CSV (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model artifact (JSON)
    #[arg(short, long, env = "VIEWCAST_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Extra columns that must be present
    #[arg(long = "require", value_name = "COLUMN")]
    required: Vec<String>,
}

fn main() -> Result<()> {
    // stdout may carry the CSV, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viewcast_common=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let model = ModelArtifact::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;
    let table = BatchTable::from_path(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let required: Vec<&str> = args.required.iter().map(String::as_str).collect();
    let scored = batch::score(&table, &required, &model)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            scored.write_csv(BufWriter::new(file))?;
            info!(rows = scored.row_count(), output = %path.display(), "Wrote predictions");
        }
        None => scored.write_csv(io::stdout().lock())?,
    }

    Ok(())
}
