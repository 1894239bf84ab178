//! Error type shared across the core modules.

use thiserror::Error;

/// Errors produced by the alignment / windowing / fusion core.
///
/// `Config` and `Alignment`/`Integrity` conditions are fatal for the
/// affected run; data-quality conditions (missing joints, absent frames)
/// are handled locally by omission and never surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown source identifier, invalid weights, unsupported vote mode.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input data: unparsable table cell, mismatched batch
    /// lengths, a canonical feature column missing from an aligned row.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Cross-source alignment failure, e.g. an empty key intersection.
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// A record's stored window id disagrees with the recomputed value.
    #[error("Data integrity error: {0}")]
    Integrity(String),
}
