//! End-to-end pipeline orchestration.
//!
//! Batch, not streaming: each stage fully consumes its input before the
//! next begins, because the aligner needs a complete view of all three
//! key sets. The three model invocations run sequentially; fusion is
//! associative and commutative in the sources, so ordering between them
//! carries no meaning.

use gma_core::alignment::{self, AlignedStreams};
use gma_core::dedup::{self, FusedRow};
use gma_core::fusion::{self, ClassWeights, ModelPrediction, VoteType};
use gma_core::record::RawRecord;
use gma_core::schema;
use gma_core::sequence::{self, SequenceBatch, STEP, TIMESTEPS};
use gma_core::source::{Source, SourceSet};
use gma_core::windowing;
use gma_core::CoreError;

use crate::error::PipelineError;
use crate::model::SequenceModel;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Fusion configuration. RMSE values are fixed, externally supplied
/// per-source error estimates, never re-estimated at run time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnsembleConfig {
    pub rmse: SourceSet<f64>,
    pub vote: VoteType,
    /// Required when `vote` is [`VoteType::Weighted`].
    pub class_weights: Option<SourceSet<ClassWeights>>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            rmse: SourceSet::from_fn(Source::default_rmse),
            vote: VoteType::Majority,
            class_weights: None,
        }
    }
}

impl EnsembleConfig {
    /// Reject configurations that could only fail mid-run. Checked before
    /// any model is invoked so that no partial output is produced.
    fn validate(&self) -> Result<(), CoreError> {
        if self.vote == VoteType::Weighted && self.class_weights.is_none() {
            return Err(CoreError::Config(
                "class weights are required for weighted voting".into(),
            ));
        }
        fusion::fusion_weights(&self.rmse).map(|_| ())
    }
}

/// The final fused table plus dedup observability.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub rows: Vec<FusedRow>,
    pub duplicates_discarded: usize,
}

// ---------------------------------------------------------------------------
// Preparation stages
// ---------------------------------------------------------------------------

/// Normalize, window-assign, and cross-source-align the three raw record
/// streams. This is everything up to (but excluding) model inference, and
/// is what the worker binary runs on its own.
pub fn prepare_streams(
    raw: &SourceSet<Vec<RawRecord>>,
) -> Result<AlignedStreams, PipelineError> {
    let normalized = raw.try_map(|source, records| {
        let normalized = schema::normalize_stream(source, records);
        let assigned = windowing::assign_windows(normalized)?;

        let windows = windowing::accumulate_windows(&assigned);
        tracing::info!(
            source = %source,
            rows = assigned.len(),
            windows = windows.len(),
            "Normalized source stream"
        );
        Ok::<_, CoreError>(assigned)
    })?;

    let aligned = alignment::align(&normalized)?;
    tracing::info!(rows = aligned.len(), "Cross-source alignment complete");
    Ok(aligned)
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

/// Run the whole pipeline for one batch of raw streams: normalize →
/// window → align → sequence → predict → fuse → deduplicate.
///
/// Models are owned by the caller; the pipeline holds no state across
/// calls. Any fatal condition aborts the run before partial rows are
/// emitted.
pub fn run_pipeline(
    raw: &SourceSet<Vec<RawRecord>>,
    models: &SourceSet<&dyn SequenceModel>,
    config: &EnsembleConfig,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;

    let aligned = prepare_streams(raw)?;

    let batches = aligned.streams.try_map(|_, records| {
        let matrix = sequence::feature_matrix(records)?;
        Ok::<_, CoreError>(SequenceBatch::build(&matrix, TIMESTEPS, STEP))
    })?;
    tracing::info!(sequences = batches.yolo.len(), "Built sequence batches");

    let predictions = batches.try_map(|source, batch| {
        let predictions = models.get(source).predict(batch)?;
        if predictions.len() != batch.len() {
            return Err(PipelineError::Model(format!(
                "{source} model returned {} predictions for {} sequences",
                predictions.len(),
                batch.len()
            )));
        }
        tracing::info!(source = %source, predictions = predictions.len(), "Model inference done");
        Ok::<Vec<ModelPrediction>, PipelineError>(predictions)
    })?;

    let weights = fusion::fusion_weights(&config.rmse)?;
    let fused = fusion::fuse_predictions(
        &predictions,
        &weights,
        config.vote,
        config.class_weights.as_ref(),
    )?;

    let outcome = dedup::reattach_keys(&aligned.keys, &fused, TIMESTEPS, STEP)?;
    tracing::info!(
        rows = outcome.rows.len(),
        duplicates_discarded = outcome.duplicates_discarded,
        "Fusion complete"
    );

    Ok(PipelineOutput {
        rows: outcome.rows,
        duplicates_discarded: outcome.duplicates_discarded,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
