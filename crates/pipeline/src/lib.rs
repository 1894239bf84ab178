//! Pipeline orchestration for the GMA pose-ensemble system.
//!
//! Wires the core stages (normalize, window, align, sequence, predict,
//! fuse, deduplicate) end to end around caller-owned extractor and model
//! implementations, and persists the file-based handoff artifacts.

pub mod artifacts;
pub mod error;
pub mod extract;
pub mod model;
pub mod run;

pub use error::PipelineError;
pub use run::{run_pipeline, EnsembleConfig, PipelineOutput};
