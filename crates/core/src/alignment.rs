//! Cross-Source Aligner: restrict all three normalized streams to the
//! keys present in every one of them.
//!
//! The output streams have identical length and identical ordered key
//! sequence, the precondition the Sequence Builder relies on for
//! positional correspondence across sources.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;
use crate::record::{AlignedKey, NormalizedRecord};
use crate::source::{Source, SourceSet};

/// Three record streams restricted to their common key set, in canonical
/// order (ascending `video_id`, then `frame`).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedStreams {
    /// The common keys, one per row, shared by all three streams.
    pub keys: Vec<AlignedKey>,
    /// Per-source records, row `i` of each stream carrying `keys[i]`.
    pub streams: SourceSet<Vec<NormalizedRecord>>,
}

impl AlignedStreams {
    /// Number of aligned rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Index a stream by its aligned key.
///
/// Requires every record to carry a window id (the Window Assigner must
/// have run), and rejects duplicate keys within one source: frames are
/// strictly increasing per video, so a repeated key means corrupt input.
fn index_stream(
    source: Source,
    records: &[NormalizedRecord],
) -> Result<BTreeMap<AlignedKey, NormalizedRecord>, CoreError> {
    let mut indexed = BTreeMap::new();
    for record in records {
        let key = record.key().ok_or_else(|| {
            CoreError::Validation(format!(
                "{source} record video_id={} frame={} has no window_id; \
                 run the window assigner before alignment",
                record.video_id, record.frame
            ))
        })?;
        if indexed.insert(key, record.clone()).is_some() {
            return Err(CoreError::Validation(format!(
                "{source} stream contains duplicate key video_id={} frame={} window_id={}",
                key.video_id, key.frame, key.window_id
            )));
        }
    }
    Ok(indexed)
}

/// Compute the intersection of `(video_id, frame, window_id)` keys across
/// the three streams and restrict each stream to it.
///
/// An empty intersection is an alignment error; proceeding would build
/// empty sequences silently.
pub fn align(inputs: &SourceSet<Vec<NormalizedRecord>>) -> Result<AlignedStreams, CoreError> {
    let indexed = inputs.try_map(|source, records| index_stream(source, records))?;

    let mut common: BTreeSet<AlignedKey> = indexed.yolo.keys().copied().collect();
    common.retain(|key| indexed.movenet.contains_key(key));
    common.retain(|key| indexed.mediapipe.contains_key(key));

    if common.is_empty() {
        return Err(CoreError::Alignment(
            "no overlapping observations: the three sources share no \
             (video_id, frame, window_id) key"
                .into(),
        ));
    }

    // BTreeSet iteration already yields the canonical order: AlignedKey
    // orders by video_id, then frame.
    let keys: Vec<AlignedKey> = common.into_iter().collect();
    let streams = indexed.map(|_, index| {
        keys.iter()
            .map(|key| index[key].clone())
            .collect::<Vec<NormalizedRecord>>()
    });

    Ok(AlignedStreams { keys, streams })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record(video_id: i64, frame: i64) -> NormalizedRecord {
        NormalizedRecord::new(video_id, frame, Some(frame / 60))
    }

    fn stream(frames: &[(i64, i64)]) -> Vec<NormalizedRecord> {
        frames.iter().map(|&(v, f)| record(v, f)).collect()
    }

    #[test]
    fn aligns_to_the_common_key_set() {
        let inputs = SourceSet {
            yolo: stream(&[(1, 0), (1, 1), (1, 2), (1, 3)]),
            movenet: stream(&[(1, 0), (1, 2), (1, 3)]),
            mediapipe: stream(&[(1, 1), (1, 2), (1, 3), (1, 4)]),
        };
        let aligned = align(&inputs).unwrap();

        let frames: Vec<i64> = aligned.keys.iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![2, 3]);
        assert_eq!(aligned.len(), 2);
    }

    #[test]
    fn output_streams_share_length_and_key_sequence() {
        let inputs = SourceSet {
            yolo: stream(&[(2, 0), (1, 0), (1, 61)]),
            movenet: stream(&[(1, 0), (1, 61), (2, 0)]),
            mediapipe: stream(&[(1, 61), (2, 0), (1, 0)]),
        };
        let aligned = align(&inputs).unwrap();

        assert_eq!(aligned.len(), 3);
        for stream in aligned.streams.as_array() {
            assert_eq!(stream.len(), aligned.keys.len());
            for (row, key) in stream.iter().zip(&aligned.keys) {
                assert_eq!(row.key(), Some(*key));
            }
        }
        // Canonical order: ascending video_id, then frame.
        assert_eq!(
            aligned.keys,
            vec![
                AlignedKey { video_id: 1, frame: 0, window_id: 0 },
                AlignedKey { video_id: 1, frame: 61, window_id: 1 },
                AlignedKey { video_id: 2, frame: 0, window_id: 0 },
            ]
        );
    }

    #[test]
    fn disagreeing_window_ids_do_not_align() {
        // Same (video_id, frame) but a different window_id is a different
        // key, so the row drops out of the intersection.
        let mut odd = NormalizedRecord::new(1, 59, Some(1));
        odd.features.insert("left_hip_x".into(), 0.1);
        let inputs = SourceSet {
            yolo: vec![record(1, 59), record(1, 60)],
            movenet: vec![odd, record(1, 60)],
            mediapipe: vec![record(1, 59), record(1, 60)],
        };
        let aligned = align(&inputs).unwrap();
        let frames: Vec<i64> = aligned.keys.iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![60]);
    }

    #[test]
    fn empty_intersection_is_an_alignment_error() {
        let inputs = SourceSet {
            yolo: stream(&[(1, 0)]),
            movenet: stream(&[(1, 1)]),
            mediapipe: stream(&[(1, 2)]),
        };
        assert_matches!(align(&inputs), Err(CoreError::Alignment(_)));
    }

    #[test]
    fn record_without_window_id_is_rejected() {
        let inputs = SourceSet {
            yolo: vec![NormalizedRecord::new(1, 0, None)],
            movenet: stream(&[(1, 0)]),
            mediapipe: stream(&[(1, 0)]),
        };
        assert_matches!(align(&inputs), Err(CoreError::Validation(_)));
    }

    #[test]
    fn duplicate_key_within_a_source_is_rejected() {
        let inputs = SourceSet {
            yolo: stream(&[(1, 0), (1, 0)]),
            movenet: stream(&[(1, 0)]),
            mediapipe: stream(&[(1, 0)]),
        };
        let err = align(&inputs).unwrap_err();
        assert_matches!(&err, CoreError::Validation(msg) => {
            assert!(msg.contains("yolo"));
            assert!(msg.contains("duplicate"));
        });
    }
}
