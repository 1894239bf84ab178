//! Pipeline error type.

use thiserror::Error;

use gma_core::CoreError;

/// Errors surfaced by pipeline orchestration. Core errors pass through
/// unchanged so callers can still distinguish configuration, alignment,
/// and integrity failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A back-end extractor or predictive model failed.
    #[error("Model error: {0}")]
    Model(String),
}
