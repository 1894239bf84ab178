//! Ensemble Fusion Engine: combine the three models' per-sequence outputs
//! into one result per sequence index.
//!
//! The continuous movement score is fused by inverse-RMSE weighted
//! averaging; the categorical knee/elbow labels by majority or weighted
//! voting. All rules are deterministic and the engine holds no state;
//! models are owned by the caller and passed in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::source::SourceSet;

// ---------------------------------------------------------------------------
// Prediction types
// ---------------------------------------------------------------------------

/// One model's output for one sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    /// Continuous movement score.
    pub movement: f64,
    /// Predicted knee-state class index.
    pub knee: i64,
    /// Predicted elbow-state class index.
    pub elbow: i64,
}

/// The fused result for one sequence index, before key reattachment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleOutput {
    pub movement: f64,
    pub knee: i64,
    pub elbow: i64,
}

// ---------------------------------------------------------------------------
// Voting configuration
// ---------------------------------------------------------------------------

/// Voting mode for the categorical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    /// Mode across the three sources' class indices, ties broken by the
    /// lowest class index.
    Majority,
    /// Weighted average of 0/1 source votes, fused label 1 iff > 0.5.
    /// Requires per-source [`ClassWeights`].
    Weighted,
}

/// Per-source voting weights for the two categorical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub knee: f64,
    pub elbow: f64,
}

// ---------------------------------------------------------------------------
// Continuous-output weights
// ---------------------------------------------------------------------------

/// Normalized inverse-error weights for the continuous output:
/// `w_s = (1/rmse_s) / Σ(1/rmse_k)`. Sources with lower historical error
/// dominate the fused estimate. The weights sum to 1.
pub fn fusion_weights(rmse: &SourceSet<f64>) -> Result<SourceSet<f64>, CoreError> {
    let inverse = rmse.try_map(|source, &value| {
        if value > 0.0 {
            Ok(1.0 / value)
        } else {
            Err(CoreError::Config(format!(
                "RMSE for {source} must be positive, got {value}"
            )))
        }
    })?;
    let total: f64 = inverse.as_array().iter().copied().sum();
    Ok(inverse.map(|_, &inv| inv / total))
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

/// Mode of the three class votes, ties broken deterministically by the
/// lowest class index. With all three votes distinct every class occurs
/// once, so the lowest index wins outright.
pub fn majority_vote(votes: [i64; 3]) -> i64 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for vote in votes {
        *counts.entry(vote).or_insert(0) += 1;
    }
    // Iterating in ascending key order and requiring a strictly greater
    // count makes the lowest class index win on ties.
    let mut winner = votes[0];
    let mut best = 0usize;
    for (class, count) in counts {
        if count > best {
            winner = class;
            best = count;
        }
    }
    winner
}

/// Weighted vote over 0/1 class votes: fused label is 1 iff the weighted
/// average exceeds 0.5.
pub fn weighted_vote(votes: [i64; 3], weights: [f64; 3]) -> Result<i64, CoreError> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(CoreError::Config(format!(
            "class weights must have a positive sum, got {total}"
        )));
    }
    let weighted: f64 = votes
        .iter()
        .zip(weights)
        .map(|(&vote, weight)| vote as f64 * weight)
        .sum::<f64>()
        / total;
    Ok(if weighted > 0.5 { 1 } else { 0 })
}

// ---------------------------------------------------------------------------
// Fusion
// ---------------------------------------------------------------------------

/// Fuse the three sources' prediction batches, per sequence index.
///
/// `weights` are the normalized continuous-output weights from
/// [`fusion_weights`]. Weighted voting without `class_weights` is a
/// configuration error. All three batches must have the same length.
pub fn fuse_predictions(
    predictions: &SourceSet<Vec<ModelPrediction>>,
    weights: &SourceSet<f64>,
    vote: VoteType,
    class_weights: Option<&SourceSet<ClassWeights>>,
) -> Result<Vec<EnsembleOutput>, CoreError> {
    let len = predictions.yolo.len();
    if predictions.movenet.len() != len || predictions.mediapipe.len() != len {
        return Err(CoreError::Validation(format!(
            "prediction batches differ in length: yolo={}, movenet={}, mediapipe={}",
            predictions.yolo.len(),
            predictions.movenet.len(),
            predictions.mediapipe.len()
        )));
    }

    let class_weights = match (vote, class_weights) {
        (VoteType::Weighted, None) => {
            return Err(CoreError::Config(
                "class weights are required for weighted voting".into(),
            ));
        }
        (VoteType::Weighted, Some(weights)) => Some(weights),
        (VoteType::Majority, _) => None,
    };

    let mut fused = Vec::with_capacity(len);
    for i in 0..len {
        let per_source = [
            predictions.yolo[i],
            predictions.movenet[i],
            predictions.mediapipe[i],
        ];

        let movement = per_source
            .iter()
            .zip(weights.as_array())
            .map(|(prediction, &weight)| prediction.movement * weight)
            .sum();

        let knee_votes = [per_source[0].knee, per_source[1].knee, per_source[2].knee];
        let elbow_votes = [
            per_source[0].elbow,
            per_source[1].elbow,
            per_source[2].elbow,
        ];

        let (knee, elbow) = match class_weights {
            None => (majority_vote(knee_votes), majority_vote(elbow_votes)),
            Some(cw) => {
                let knee_weights = [cw.yolo.knee, cw.movenet.knee, cw.mediapipe.knee];
                let elbow_weights = [cw.yolo.elbow, cw.movenet.elbow, cw.mediapipe.elbow];
                (
                    weighted_vote(knee_votes, knee_weights)?,
                    weighted_vote(elbow_votes, elbow_weights)?,
                )
            }
        };

        fused.push(EnsembleOutput {
            movement,
            knee,
            elbow,
        });
    }

    Ok(fused)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
