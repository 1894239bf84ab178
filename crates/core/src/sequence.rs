//! Sequence Builder: slice an aligned feature stream into fixed-length,
//! non-overlapping row windows for the predictive models.

use crate::error::CoreError;
use crate::record::NormalizedRecord;
use crate::schema::FEATURE_COLUMNS;

/// Rows per model-input sequence.
pub const TIMESTEPS: usize = 30;
/// Row stride between consecutive sequences. Equal to [`TIMESTEPS`], so
/// sequences never overlap and no row appears twice.
pub const STEP: usize = 30;

// ---------------------------------------------------------------------------
// Feature matrix
// ---------------------------------------------------------------------------

/// Project aligned records onto the fixed 24-column feature matrix, one
/// row per record, columns in [`FEATURE_COLUMNS`] order.
///
/// A record missing one of the canonical feature columns cannot be fed to
/// a model; that is a validation error naming the column and key, never a
/// fabricated zero (zero-filling would bias the continuous fusion).
pub fn feature_matrix(records: &[NormalizedRecord]) -> Result<Vec<Vec<f64>>, CoreError> {
    records
        .iter()
        .map(|record| {
            FEATURE_COLUMNS
                .iter()
                .map(|&column| {
                    record.features.get(column).copied().ok_or_else(|| {
                        CoreError::Validation(format!(
                            "missing feature column '{column}' for video_id={} frame={}",
                            record.video_id, record.frame
                        ))
                    })
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequence slicing
// ---------------------------------------------------------------------------

/// Number of sequences produced from `rows` input rows:
/// `floor((rows - timesteps)/step) + 1` when `rows >= timesteps`, else 0.
/// Trailing remainder rows shorter than `timesteps` are dropped, never
/// padded.
pub fn sequence_count(rows: usize, timesteps: usize, step: usize) -> usize {
    if rows < timesteps {
        0
    } else {
        (rows - timesteps) / step + 1
    }
}

/// Lazy, finite, restartable iterator over the fixed-length row windows
/// of a feature matrix. Window `i` covers rows
/// `[i*step, i*step + timesteps)`.
#[derive(Debug, Clone)]
pub struct SequenceIter<'a> {
    rows: &'a [Vec<f64>],
    timesteps: usize,
    step: usize,
    start: usize,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = &'a [Vec<f64>];

    fn next(&mut self) -> Option<Self::Item> {
        if self.start + self.timesteps > self.rows.len() {
            return None;
        }
        let window = &self.rows[self.start..self.start + self.timesteps];
        self.start += self.step;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.start + self.timesteps > self.rows.len() {
            0
        } else {
            (self.rows.len() - self.start - self.timesteps) / self.step + 1
        };
        (remaining, Some(remaining))
    }
}

/// Iterate the sequence windows of a feature matrix.
pub fn sequence_windows(rows: &[Vec<f64>], timesteps: usize, step: usize) -> SequenceIter<'_> {
    SequenceIter {
        rows,
        timesteps,
        step,
        start: 0,
    }
}

// ---------------------------------------------------------------------------
// SequenceBatch
// ---------------------------------------------------------------------------

/// An owned batch of model-input sequences for one source, indexed by
/// sequence position. Sequence `i` is positionally comparable across
/// sources only when all three batches were built from streams aligned by
/// the Cross-Source Aligner with identical slicing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBatch {
    pub timesteps: usize,
    /// `sequences[i][row][feature]`, rows in stream order, features in
    /// [`FEATURE_COLUMNS`] order.
    pub sequences: Vec<Vec<Vec<f64>>>,
}

impl SequenceBatch {
    /// Build the batch by materializing every sequence window.
    pub fn build(rows: &[Vec<f64>], timesteps: usize, step: usize) -> Self {
        Self {
            timesteps,
            sequences: sequence_windows(rows, timesteps, step)
                .map(|window| window.to_vec())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
