//! Window Assigner: uniform `frame / WINDOW_SIZE` windowing across all
//! sources, plus per-window confidence accumulation.
//!
//! Windows are later joined by `(video_id, window_id)`, so one globally
//! fixed window size applies to every source. A stored window id that
//! disagrees with the recomputed value means the upstream extractor used
//! a different window derivation and must be reported, never silently
//! overwritten.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::record::NormalizedRecord;
use crate::schema::Joint;

/// Frames per window, shared by all three sources.
pub const WINDOW_SIZE: i64 = 60;

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// The window a frame belongs to.
pub fn window_for_frame(frame: i64) -> i64 {
    frame / WINDOW_SIZE
}

/// Ensure every record carries `window_id == frame / WINDOW_SIZE`.
///
/// Idempotent: records that already carry the correct window id pass
/// through unchanged. A record whose stored window id disagrees with the
/// recomputed value is a data-integrity error naming the conflicting key.
pub fn assign_windows(
    mut records: Vec<NormalizedRecord>,
) -> Result<Vec<NormalizedRecord>, CoreError> {
    for record in &mut records {
        let computed = window_for_frame(record.frame);
        match record.window_id {
            None => record.window_id = Some(computed),
            Some(stored) if stored == computed => {}
            Some(stored) => {
                return Err(CoreError::Integrity(format!(
                    "window_id mismatch for video_id={} frame={}: stored {stored}, \
                     recomputed {computed} (WINDOW_SIZE={WINDOW_SIZE})",
                    record.video_id, record.frame
                )));
            }
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// WindowAccumulator
// ---------------------------------------------------------------------------

/// Per-window confidence lists with one fixed, named field per joint.
/// Constructed fresh per window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAccumulator {
    pub left_shoulder: Vec<f64>,
    pub right_shoulder: Vec<f64>,
    pub left_elbow: Vec<f64>,
    pub right_elbow: Vec<f64>,
    pub left_hip: Vec<f64>,
    pub right_hip: Vec<f64>,
    pub left_knee: Vec<f64>,
    pub right_knee: Vec<f64>,
}

impl WindowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn confidences(&self, joint: Joint) -> &Vec<f64> {
        match joint {
            Joint::LeftShoulder => &self.left_shoulder,
            Joint::RightShoulder => &self.right_shoulder,
            Joint::LeftElbow => &self.left_elbow,
            Joint::RightElbow => &self.right_elbow,
            Joint::LeftHip => &self.left_hip,
            Joint::RightHip => &self.right_hip,
            Joint::LeftKnee => &self.left_knee,
            Joint::RightKnee => &self.right_knee,
        }
    }

    fn confidences_mut(&mut self, joint: Joint) -> &mut Vec<f64> {
        match joint {
            Joint::LeftShoulder => &mut self.left_shoulder,
            Joint::RightShoulder => &mut self.right_shoulder,
            Joint::LeftElbow => &mut self.left_elbow,
            Joint::RightElbow => &mut self.right_elbow,
            Joint::LeftHip => &mut self.left_hip,
            Joint::RightHip => &mut self.right_hip,
            Joint::LeftKnee => &mut self.left_knee,
            Joint::RightKnee => &mut self.right_knee,
        }
    }

    pub fn push(&mut self, joint: Joint, confidence: f64) {
        self.confidences_mut(joint).push(confidence);
    }

    /// Mean confidence for one joint, or `None` if the joint was never
    /// observed in this window.
    pub fn mean_confidence(&self, joint: Joint) -> Option<f64> {
        let values = self.confidences(joint);
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    /// Mean confidence across all observed joints, or `None` if the
    /// window holds no observations at all.
    pub fn overall_mean_confidence(&self) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for joint in Joint::ALL {
            let values = self.confidences(joint);
            sum += values.iter().sum::<f64>();
            count += values.len();
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// Group per-frame joint confidences into per-window accumulators, keyed
/// by `(video_id, window_id)`. Records without an assigned window are
/// skipped; run [`assign_windows`] first.
pub fn accumulate_windows(
    records: &[NormalizedRecord],
) -> BTreeMap<(i64, i64), WindowAccumulator> {
    let mut windows: BTreeMap<(i64, i64), WindowAccumulator> = BTreeMap::new();

    for record in records {
        let Some(window_id) = record.window_id else {
            continue;
        };
        let accumulator = windows
            .entry((record.video_id, window_id))
            .or_insert_with(WindowAccumulator::new);
        for joint in Joint::ALL {
            let column = format!("{}_confidence", joint.as_str());
            if let Some(&confidence) = record.features.get(&column) {
                accumulator.push(joint, confidence);
            }
        }
    }

    windows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record(video_id: i64, frame: i64, window_id: Option<i64>) -> NormalizedRecord {
        NormalizedRecord::new(video_id, frame, window_id)
    }

    // -- window_for_frame -----------------------------------------------------

    #[test]
    fn window_boundaries() {
        assert_eq!(window_for_frame(0), 0);
        assert_eq!(window_for_frame(59), 0);
        assert_eq!(window_for_frame(60), 1);
        assert_eq!(window_for_frame(119), 1);
        assert_eq!(window_for_frame(120), 2);
    }

    // -- assign_windows -------------------------------------------------------

    #[test]
    fn assigns_missing_window_ids() {
        let records = vec![record(1, 0, None), record(1, 59, None), record(1, 60, None)];
        let assigned = assign_windows(records).unwrap();
        let windows: Vec<Option<i64>> = assigned.iter().map(|r| r.window_id).collect();
        assert_eq!(windows, vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn assignment_is_idempotent() {
        let records = vec![record(1, 0, None), record(1, 61, None)];
        let once = assign_windows(records).unwrap();
        let twice = assign_windows(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn matching_stored_window_id_passes_through() {
        let records = vec![record(1, 59, Some(0))];
        let assigned = assign_windows(records).unwrap();
        assert_eq!(assigned[0].window_id, Some(0));
    }

    #[test]
    fn disagreeing_window_id_is_an_integrity_error() {
        // Frame 59 belongs to window 0 under WINDOW_SIZE=60; a stored
        // value of 1 means the extractor derived windows differently.
        let records = vec![record(7, 59, Some(1))];
        let err = assign_windows(records).unwrap_err();
        assert_matches!(&err, CoreError::Integrity(msg) => {
            assert!(msg.contains("video_id=7"));
            assert!(msg.contains("frame=59"));
        });
    }

    // -- WindowAccumulator ----------------------------------------------------

    #[test]
    fn accumulator_means_per_joint() {
        let mut acc = WindowAccumulator::new();
        acc.push(Joint::LeftKnee, 0.8);
        acc.push(Joint::LeftKnee, 0.6);
        acc.push(Joint::RightHip, 1.0);

        assert_eq!(acc.mean_confidence(Joint::LeftKnee), Some(0.7));
        assert_eq!(acc.mean_confidence(Joint::RightHip), Some(1.0));
        assert_eq!(acc.mean_confidence(Joint::LeftElbow), None);
    }

    #[test]
    fn accumulator_overall_mean() {
        let mut acc = WindowAccumulator::new();
        assert_eq!(acc.overall_mean_confidence(), None);

        acc.push(Joint::LeftShoulder, 0.5);
        acc.push(Joint::RightShoulder, 1.0);
        assert_eq!(acc.overall_mean_confidence(), Some(0.75));
    }

    #[test]
    fn accumulate_windows_groups_by_video_and_window() {
        let mut first = record(1, 0, Some(0));
        first.features.insert("left_knee_confidence".into(), 0.9);
        let mut second = record(1, 60, Some(1));
        second.features.insert("left_knee_confidence".into(), 0.5);
        let mut other_video = record(2, 0, Some(0));
        other_video.features.insert("left_knee_confidence".into(), 0.4);

        let windows = accumulate_windows(&[first, second, other_video]);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[&(1, 0)].left_knee, vec![0.9]);
        assert_eq!(windows[&(1, 1)].left_knee, vec![0.5]);
        assert_eq!(windows[&(2, 0)].left_knee, vec![0.4]);
    }

    #[test]
    fn accumulate_windows_skips_unassigned_records() {
        let mut unassigned = record(1, 0, None);
        unassigned.features.insert("left_knee_confidence".into(), 0.9);
        let windows = accumulate_windows(&[unassigned]);
        assert!(windows.is_empty());
    }
}
