//! File-based handoff between pipeline stages.
//!
//! Every artifact is a flat delimited table with a header row: the
//! normalized per-source tables, the aligned common-key table, and the
//! final fused table. Column names are contractual, column order is not.

use std::fs;
use std::path::{Path, PathBuf};

use gma_core::alignment::AlignedStreams;
use gma_core::dedup::FusedRow;
use gma_core::record::RawRecord;
use gma_core::source::Source;
use gma_core::table;

use crate::error::PipelineError;

/// File name a back-end writes its raw per-frame table under.
pub fn raw_table_name(source: Source) -> String {
    format!("{source}_motion_dataset_with_window_scores.csv")
}

/// File name for a source's normalized, aligned table.
pub fn aligned_table_name(source: Source) -> String {
    format!("{source}_aligned.csv")
}

/// File name for the aligned common-key table.
pub const KEY_TABLE_NAME: &str = "aligned_keys.csv";

/// File name for the final fused table.
pub const FUSED_TABLE_NAME: &str = "ensemble_predictions_with_ids.csv";

/// Read one back-end's raw per-frame table from disk.
pub fn read_raw_table(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let text = fs::read_to_string(path)?;
    let records = table::parse_raw_table(&text)?;
    tracing::info!(path = %path.display(), rows = records.len(), "Loaded raw table");
    Ok(records)
}

fn write_table(dir: &Path, name: &str, text: &str) -> Result<PathBuf, PipelineError> {
    let path = dir.join(name);
    fs::write(&path, text)?;
    tracing::info!(path = %path.display(), "Wrote artifact");
    Ok(path)
}

/// Persist the aligned streams: one normalized table per source plus the
/// common-key table.
pub fn write_aligned_artifacts(
    dir: &Path,
    aligned: &AlignedStreams,
) -> Result<(), PipelineError> {
    fs::create_dir_all(dir)?;
    for source in Source::ALL {
        let text = table::write_normalized_table(aligned.streams.get(source));
        write_table(dir, &aligned_table_name(source), &text)?;
    }
    write_table(dir, KEY_TABLE_NAME, &table::write_key_table(&aligned.keys))?;
    Ok(())
}

/// Persist the final fused table.
pub fn write_fused_table(dir: &Path, rows: &[FusedRow]) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(dir)?;
    write_table(dir, FUSED_TABLE_NAME, &table::write_fused_table(rows))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gma_core::record::{AlignedKey, NormalizedRecord};
    use gma_core::source::SourceSet;

    #[test]
    fn raw_table_names_match_the_extractor_outputs() {
        assert_eq!(
            raw_table_name(Source::Yolo),
            "yolo_motion_dataset_with_window_scores.csv"
        );
        assert_eq!(
            raw_table_name(Source::Movenet),
            "movenet_motion_dataset_with_window_scores.csv"
        );
        assert_eq!(
            raw_table_name(Source::Mediapipe),
            "mediapipe_motion_dataset_with_window_scores.csv"
        );
    }

    #[test]
    fn raw_table_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(raw_table_name(Source::Yolo));
        fs::write(&path, "video_id,frame,window_id,left_knee_x\n1,0,0,0.5\n").unwrap();

        let records = read_raw_table(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields["left_knee_x"], 0.5);
    }

    #[test]
    fn missing_raw_table_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_raw_table(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn aligned_artifacts_write_four_tables() {
        let mut record = NormalizedRecord::new(1, 0, Some(0));
        record.features.insert("left_knee_x".into(), 0.5);
        let aligned = AlignedStreams {
            keys: vec![AlignedKey { video_id: 1, frame: 0, window_id: 0 }],
            streams: SourceSet::from_fn(|_| vec![record.clone()]),
        };

        let dir = tempfile::tempdir().unwrap();
        write_aligned_artifacts(dir.path(), &aligned).unwrap();

        for source in Source::ALL {
            assert!(dir.path().join(aligned_table_name(source)).exists());
        }
        let keys = fs::read_to_string(dir.path().join(KEY_TABLE_NAME)).unwrap();
        assert_eq!(keys, "video_id,frame,window_id\n1,0,0");
    }

    #[test]
    fn fused_table_lands_in_the_output_dir() {
        let rows = vec![FusedRow {
            video_id: 1,
            window_id: 0,
            movement_prediction: 1.0,
            knee_prediction: 0,
            elbow_prediction: 1,
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = write_fused_table(dir.path(), &rows).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("video_id,window_id,"));
        assert!(text.ends_with("1,0,1,0,1"));
    }
}
