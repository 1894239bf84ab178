//! Schema Normalizer: canonical joint schema and the table-driven mapping
//! from each back-end's native column names onto it.
//!
//! YOLO emits joint-named columns with a shortened `_conf` confidence
//! suffix; MoveNet and MediaPipe emit `keypoint_{index}_{suffix}` columns
//! using their own landmark indices. Normalization renames all of them to
//! the shared `{joint}_{suffix}` form and carries the key columns over.

use crate::record::{NormalizedRecord, RawRecord};
use crate::source::Source;

// ---------------------------------------------------------------------------
// Joints
// ---------------------------------------------------------------------------

/// The eight tracked joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

impl Joint {
    /// All joints, in the canonical feature-column order.
    pub const ALL: [Joint; 8] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical columns
// ---------------------------------------------------------------------------

/// Key columns present in every normalized table.
pub const KEY_COLUMNS: [&str; 3] = ["video_id", "frame", "window_id"];

/// Canonical per-joint feature suffixes.
pub const FEATURE_SUFFIXES: [&str; 5] = ["x", "y", "confidence", "velocity_x", "velocity_y"];

/// The fixed, ordered feature-column list fed to the predictive models.
/// Shared across all three sources, never derived per source, since the
/// models depend on identical column order.
pub const FEATURE_COLUMNS: [&str; 24] = [
    "left_shoulder_x",
    "left_shoulder_y",
    "left_shoulder_confidence",
    "right_shoulder_x",
    "right_shoulder_y",
    "right_shoulder_confidence",
    "left_elbow_x",
    "left_elbow_y",
    "left_elbow_confidence",
    "right_elbow_x",
    "right_elbow_y",
    "right_elbow_confidence",
    "left_hip_x",
    "left_hip_y",
    "left_hip_confidence",
    "right_hip_x",
    "right_hip_y",
    "right_hip_confidence",
    "left_knee_x",
    "left_knee_y",
    "left_knee_confidence",
    "right_knee_x",
    "right_knee_y",
    "right_knee_confidence",
];

/// Canonical column name for one joint feature, e.g. `left_knee_confidence`.
pub fn canonical_column(joint: Joint, suffix: &str) -> String {
    format!("{}_{suffix}", joint.as_str())
}

// ---------------------------------------------------------------------------
// Native naming tables
// ---------------------------------------------------------------------------

/// The back-end's native landmark index for a joint.
///
/// YOLO and MoveNet both use the COCO indexing; MediaPipe uses its own
/// pose-landmark indexing.
pub fn keypoint_index(source: Source, joint: Joint) -> u8 {
    match source {
        Source::Yolo | Source::Movenet => match joint {
            Joint::LeftShoulder => 5,
            Joint::RightShoulder => 6,
            Joint::LeftElbow => 7,
            Joint::RightElbow => 8,
            Joint::LeftHip => 11,
            Joint::RightHip => 12,
            Joint::LeftKnee => 13,
            Joint::RightKnee => 14,
        },
        Source::Mediapipe => match joint {
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
        },
    }
}

/// The native column name a back-end uses for one canonical joint feature.
pub fn native_column(source: Source, joint: Joint, suffix: &str) -> String {
    match source {
        // Joint-name based, with the shortened `_conf` confidence suffix.
        Source::Yolo => {
            let native_suffix = if suffix == "confidence" { "conf" } else { suffix };
            format!("{}_{native_suffix}", joint.as_str())
        }
        // Index based.
        Source::Movenet | Source::Mediapipe => {
            format!("keypoint_{}_{suffix}", keypoint_index(source, joint))
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Map one raw record onto the canonical schema.
///
/// Produces a new record; the raw record is left untouched. A native
/// column absent for a joint simply yields no canonical column for that
/// joint; missing features are never zero-filled. The native window
/// column (`window_id`, `window_index`, or `chunk_index`) is carried over
/// as `window_id` regardless of its native name.
pub fn normalize_record(source: Source, raw: &RawRecord) -> NormalizedRecord {
    let mut normalized =
        NormalizedRecord::new(raw.video_id, raw.frame, raw.window.map(|(_, value)| value));

    for joint in Joint::ALL {
        for suffix in FEATURE_SUFFIXES {
            let native = native_column(source, joint, suffix);
            if let Some(&value) = raw.fields.get(&native) {
                normalized
                    .features
                    .insert(canonical_column(joint, suffix), value);
            }
        }
    }

    normalized
}

/// Normalize an ordered raw record stream, preserving order.
pub fn normalize_stream(source: Source, raw: &[RawRecord]) -> Vec<NormalizedRecord> {
    raw.iter().map(|record| normalize_record(source, record)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
