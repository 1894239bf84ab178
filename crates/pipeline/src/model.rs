//! The predictive-model seam.

use gma_core::fusion::ModelPrediction;
use gma_core::sequence::SequenceBatch;

use crate::error::PipelineError;

/// One source's trained regressor/classifier, treated as a black box:
/// fixed-length sequences of normalized keypoint features in, one
/// continuous movement score and two categorical class indices out.
///
/// Instances are constructed once by the caller and passed in, never held
/// as process-wide singletons, so test doubles can be substituted freely.
pub trait SequenceModel {
    /// Predict one [`ModelPrediction`] per sequence in the batch, in
    /// batch order. The returned vector must have exactly `batch.len()`
    /// entries.
    fn predict(&self, batch: &SequenceBatch) -> Result<Vec<ModelPrediction>, PipelineError>;
}
