//! The pose-extraction seam.
//!
//! The three detection back-ends are external collaborators; the pipeline
//! only depends on this trait. One implementation per back-end variant
//! (YOLO, MoveNet, MediaPipe) absorbs that detector's invocation details,
//! while the Schema Normalizer absorbs its naming differences.

use std::path::Path;

use gma_core::record::RawRecord;
use gma_core::source::Source;

use crate::error::PipelineError;

/// Produce ordered per-frame keypoint records from a video.
///
/// Records must come back in strictly increasing frame order per video;
/// frames with no detected skeleton are simply omitted, not null-filled.
pub trait PoseExtractor {
    /// Which back-end this extractor is.
    fn source(&self) -> Source;

    /// Run detection over one video file.
    fn extract(&mut self, video: &Path) -> Result<Vec<RawRecord>, PipelineError>;
}
