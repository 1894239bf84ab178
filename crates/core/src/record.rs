//! Per-frame record types and the cross-source join key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WindowColumn
// ---------------------------------------------------------------------------

/// Native window-column naming used by a back-end's raw output.
///
/// MoveNet emits `window_index`, MediaPipe emits `chunk_index`, and a
/// stream that was already reconciled carries `window_id`. The Schema
/// Normalizer maps all three onto the canonical `window_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowColumn {
    WindowId,
    WindowIndex,
    ChunkIndex,
}

impl WindowColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WindowId => "window_id",
            Self::WindowIndex => "window_index",
            Self::ChunkIndex => "chunk_index",
        }
    }

    /// Recognize a raw table header as one of the window-column variants.
    pub fn from_header(name: &str) -> Option<Self> {
        match name {
            "window_id" => Some(Self::WindowId),
            "window_index" => Some(Self::WindowIndex),
            "chunk_index" => Some(Self::ChunkIndex),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// One per-frame row as emitted by a back-end, columns still in that
/// back-end's native naming. Immutable once created; normalization
/// produces a new record rather than rewriting this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub video_id: i64,
    /// 0-based frame index, strictly increasing per video within a source.
    /// Frames with no detected skeleton are simply absent upstream.
    pub frame: i64,
    /// Native window column and its value, if the back-end emitted one.
    pub window: Option<(WindowColumn, i64)>,
    /// Native float columns keyed by the back-end's own column names.
    pub fields: BTreeMap<String, f64>,
}

impl RawRecord {
    pub fn new(video_id: i64, frame: i64) -> Self {
        Self {
            video_id,
            frame,
            window: None,
            fields: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// NormalizedRecord
// ---------------------------------------------------------------------------

/// One per-frame row in the canonical schema: key columns plus canonical
/// joint-feature columns. A joint absent from the source's output is
/// simply missing from `features`, never fabricated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub video_id: i64,
    pub frame: i64,
    /// `None` until the Window Assigner has run (for back-ends whose raw
    /// output carries no window column).
    pub window_id: Option<i64>,
    /// Canonical feature columns, e.g. `left_knee_confidence`.
    pub features: BTreeMap<String, f64>,
}

impl NormalizedRecord {
    pub fn new(video_id: i64, frame: i64, window_id: Option<i64>) -> Self {
        Self {
            video_id,
            frame,
            window_id,
            features: BTreeMap::new(),
        }
    }

    /// The cross-source join key, available once a window is assigned.
    pub fn key(&self) -> Option<AlignedKey> {
        self.window_id.map(|window_id| AlignedKey {
            video_id: self.video_id,
            frame: self.frame,
            window_id,
        })
    }
}

// ---------------------------------------------------------------------------
// AlignedKey
// ---------------------------------------------------------------------------

/// The `(video_id, frame, window_id)` tuple that must match exactly
/// across all three sources for a frame to participate in sequencing.
/// Ordering is the canonical stream order: ascending `video_id`, then
/// `frame` (then `window_id`, which is derived from `frame`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AlignedKey {
    pub video_id: i64,
    pub frame: i64,
    pub window_id: i64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_column_from_header_recognizes_all_variants() {
        assert_eq!(
            WindowColumn::from_header("window_id"),
            Some(WindowColumn::WindowId)
        );
        assert_eq!(
            WindowColumn::from_header("window_index"),
            Some(WindowColumn::WindowIndex)
        );
        assert_eq!(
            WindowColumn::from_header("chunk_index"),
            Some(WindowColumn::ChunkIndex)
        );
        assert_eq!(WindowColumn::from_header("frame"), None);
    }

    #[test]
    fn key_requires_window_id() {
        let mut record = NormalizedRecord::new(1, 59, None);
        assert_eq!(record.key(), None);

        record.window_id = Some(0);
        assert_eq!(
            record.key(),
            Some(AlignedKey {
                video_id: 1,
                frame: 59,
                window_id: 0
            })
        );
    }

    #[test]
    fn aligned_key_orders_by_video_then_frame() {
        let a = AlignedKey {
            video_id: 1,
            frame: 100,
            window_id: 1,
        };
        let b = AlignedKey {
            video_id: 2,
            frame: 0,
            window_id: 0,
        };
        let c = AlignedKey {
            video_id: 1,
            frame: 101,
            window_id: 1,
        };
        let mut keys = vec![b, c, a];
        keys.sort();
        assert_eq!(keys, vec![a, c, b]);
    }
}
