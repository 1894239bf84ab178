//! `gma-worker`: alignment/preparation stage runner.
//!
//! Loads the three back-ends' raw per-frame tables, runs normalization,
//! window assignment, and cross-source alignment, and writes the aligned
//! handoff artifacts for the model-serving side.
//!
//! # Environment variables
//!
//! | Variable       | Required | Default | Description                                  |
//! |----------------|----------|---------|----------------------------------------------|
//! | `GMA_DATA_DIR` | yes      | --      | Directory holding the three raw tables       |
//! | `GMA_OUT_DIR`  | no       | `out`   | Directory the aligned artifacts are written to |

use std::path::{Path, PathBuf};

use gma_core::source::SourceSet;
use gma_pipeline::{artifacts, run, PipelineError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gma_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("GMA_DATA_DIR").unwrap_or_else(|_| {
        tracing::error!("GMA_DATA_DIR environment variable is required");
        std::process::exit(1);
    });
    let out_dir = std::env::var("GMA_OUT_DIR").unwrap_or_else(|_| "out".into());

    if let Err(error) = prepare(Path::new(&data_dir), Path::new(&out_dir)) {
        tracing::error!(error = %error, "Preparation run failed");
        std::process::exit(1);
    }
}

/// Load the raw tables, align them, and persist the artifacts.
fn prepare(data_dir: &Path, out_dir: &Path) -> Result<(), PipelineError> {
    let paths: SourceSet<PathBuf> =
        SourceSet::from_fn(|source| data_dir.join(artifacts::raw_table_name(source)));
    let raw = paths.try_map(|_, path| artifacts::read_raw_table(path))?;

    let aligned = run::prepare_streams(&raw)?;
    artifacts::write_aligned_artifacts(out_dir, &aligned)?;

    tracing::info!(
        rows = aligned.len(),
        out_dir = %out_dir.display(),
        "Aligned artifacts written"
    );
    Ok(())
}
