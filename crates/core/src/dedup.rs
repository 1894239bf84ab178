//! Result Deduplicator / Key Reattacher: map each fused sequence result
//! back to its `(video_id, window_id)` key and keep one row per key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fusion::EnsembleOutput;
use crate::record::AlignedKey;

// ---------------------------------------------------------------------------
// FusedRow
// ---------------------------------------------------------------------------

/// One row of the final fused table. Window-level granularity only; the
/// `frame` column is dropped from the final projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedRow {
    pub video_id: i64,
    pub window_id: i64,
    pub movement_prediction: f64,
    pub knee_prediction: i64,
    pub elbow_prediction: i64,
}

/// Surviving rows plus the number of duplicate-key rows discarded,
/// surfaced for observability rather than treated as a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    pub rows: Vec<FusedRow>,
    pub duplicates_discarded: usize,
}

// ---------------------------------------------------------------------------
// Key reattachment
// ---------------------------------------------------------------------------

/// Attach each fused output at sequence index `i` to the key of the last
/// aligned row that sequence consumed, i.e. row `i*step + timesteps - 1`,
/// then deduplicate on `(video_id, window_id)`.
///
/// With `step == timesteps` at most one sequence normally maps to a given
/// window, but when a window's row count is not an exact multiple of
/// `timesteps` two adjacent sequences can end in the same window; the
/// first occurrence in sequence order is retained.
pub fn reattach_keys(
    keys: &[AlignedKey],
    outputs: &[EnsembleOutput],
    timesteps: usize,
    step: usize,
) -> Result<DedupOutcome, CoreError> {
    let mut rows = Vec::with_capacity(outputs.len());

    for (i, output) in outputs.iter().enumerate() {
        let row_index = i * step + timesteps - 1;
        let key = keys.get(row_index).ok_or_else(|| {
            CoreError::Validation(format!(
                "sequence {i} ends at row {row_index} but the aligned stream has only {} rows",
                keys.len()
            ))
        })?;
        rows.push(FusedRow {
            video_id: key.video_id,
            window_id: key.window_id,
            movement_prediction: output.movement,
            knee_prediction: output.knee,
            elbow_prediction: output.elbow,
        });
    }

    Ok(dedup_rows(rows))
}

/// Drop rows whose `(video_id, window_id)` key was already seen, keeping
/// the first occurrence, and order the survivors ascending by key.
/// Idempotent: a second pass removes nothing.
pub fn dedup_rows(rows: Vec<FusedRow>) -> DedupOutcome {
    let mut seen: BTreeSet<(i64, i64)> = BTreeSet::new();
    let before = rows.len();

    let mut surviving: Vec<FusedRow> = rows
        .into_iter()
        .filter(|row| seen.insert((row.video_id, row.window_id)))
        .collect();
    surviving.sort_by_key(|row| (row.video_id, row.window_id));

    DedupOutcome {
        duplicates_discarded: before - surviving.len(),
        rows: surviving,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
