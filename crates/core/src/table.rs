//! Flat delimited tables with a header row: the persisted handoff format
//! between pipeline stages.
//!
//! Column names are contractual, column order is not. Cells hold plain
//! numbers, so no quoting is needed; an empty cell means the field was
//! absent for that row (never zero).

use std::collections::BTreeSet;

use crate::dedup::FusedRow;
use crate::error::CoreError;
use crate::record::{AlignedKey, NormalizedRecord, RawRecord, WindowColumn};
use crate::schema::{canonical_column, Joint, FEATURE_SUFFIXES};

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn split_header(text: &str) -> Result<(Vec<&str>, std::str::Lines<'_>), CoreError> {
    let mut lines = text.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| CoreError::Validation("table is empty".into()))?;
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CoreError::Validation("table header row is empty".into()));
    }
    Ok((headers, lines))
}

fn require_column(headers: &[&str], name: &str) -> Result<usize, CoreError> {
    headers
        .iter()
        .position(|&h| h == name)
        .ok_or_else(|| CoreError::Validation(format!("table is missing the '{name}' column")))
}

fn parse_int_cell(cell: &str, column: &str, line_no: usize) -> Result<i64, CoreError> {
    cell.trim().parse::<i64>().map_err(|_| {
        CoreError::Validation(format!(
            "line {line_no}: cannot parse '{cell}' in column '{column}' as an integer"
        ))
    })
}

fn parse_float_cell(cell: &str, column: &str, line_no: usize) -> Result<f64, CoreError> {
    cell.trim().parse::<f64>().map_err(|_| {
        CoreError::Validation(format!(
            "line {line_no}: cannot parse '{cell}' in column '{column}' as a number"
        ))
    })
}

// ---------------------------------------------------------------------------
// Raw per-source tables
// ---------------------------------------------------------------------------

/// Parse a back-end's raw per-frame table.
///
/// Requires `video_id` and `frame` columns. The first header matching one
/// of the native window-column names (`window_id`, `window_index`,
/// `chunk_index`) becomes the record's window column; every remaining
/// column is kept as a native float field. Empty cells are absent fields.
pub fn parse_raw_table(text: &str) -> Result<Vec<RawRecord>, CoreError> {
    let (headers, lines) = split_header(text)?;
    let video_idx = require_column(&headers, "video_id")?;
    let frame_idx = require_column(&headers, "frame")?;
    let window = headers
        .iter()
        .enumerate()
        .find_map(|(i, h)| WindowColumn::from_header(h).map(|column| (i, column)));

    let mut records = Vec::new();
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = offset + 2; // 1-based, after the header
        let cells: Vec<&str> = line.split(',').collect();
        let cell = |i: usize| cells.get(i).copied().unwrap_or("");

        let mut record = RawRecord::new(
            parse_int_cell(cell(video_idx), "video_id", line_no)?,
            parse_int_cell(cell(frame_idx), "frame", line_no)?,
        );
        if let Some((window_idx, column)) = window {
            let value = cell(window_idx);
            if !value.trim().is_empty() {
                record.window = Some((column, parse_int_cell(value, column.as_str(), line_no)?));
            }
        }
        for (i, &header) in headers.iter().enumerate() {
            if i == video_idx || i == frame_idx || Some(i) == window.map(|(idx, _)| idx) {
                continue;
            }
            let value = cell(i);
            if value.trim().is_empty() {
                continue;
            }
            record
                .fields
                .insert(header.to_string(), parse_float_cell(value, header, line_no)?);
        }
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Normalized tables
// ---------------------------------------------------------------------------

/// Canonical feature columns present in at least one record, in canonical
/// (joint-major) order.
fn present_feature_columns(records: &[NormalizedRecord]) -> Vec<String> {
    let present: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.features.keys().map(String::as_str))
        .collect();

    let mut columns = Vec::new();
    for joint in Joint::ALL {
        for suffix in FEATURE_SUFFIXES {
            let column = canonical_column(joint, suffix);
            if present.contains(column.as_str()) {
                columns.push(column);
            }
        }
    }
    columns
}

/// Render a normalized record stream as a delimited table: the key
/// columns followed by whichever canonical feature columns occur in the
/// stream. Absent fields render as empty cells.
pub fn write_normalized_table(records: &[NormalizedRecord]) -> String {
    let feature_columns = present_feature_columns(records);

    let mut lines = Vec::with_capacity(records.len() + 1);
    let mut header = vec!["video_id".to_string(), "frame".into(), "window_id".into()];
    header.extend(feature_columns.iter().cloned());
    lines.push(header.join(","));

    for record in records {
        let mut cells = vec![
            record.video_id.to_string(),
            record.frame.to_string(),
            record
                .window_id
                .map(|w| w.to_string())
                .unwrap_or_default(),
        ];
        for column in &feature_columns {
            cells.push(
                record
                    .features
                    .get(column)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

/// Parse a normalized table written by [`write_normalized_table`] (or an
/// equivalent producer). All non-key columns become canonical features.
pub fn parse_normalized_table(text: &str) -> Result<Vec<NormalizedRecord>, CoreError> {
    let (headers, lines) = split_header(text)?;
    let video_idx = require_column(&headers, "video_id")?;
    let frame_idx = require_column(&headers, "frame")?;
    let window_idx = headers.iter().position(|&h| h == "window_id");

    let mut records = Vec::new();
    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = offset + 2;
        let cells: Vec<&str> = line.split(',').collect();
        let cell = |i: usize| cells.get(i).copied().unwrap_or("");

        let mut record = NormalizedRecord::new(
            parse_int_cell(cell(video_idx), "video_id", line_no)?,
            parse_int_cell(cell(frame_idx), "frame", line_no)?,
            None,
        );
        if let Some(idx) = window_idx {
            let value = cell(idx);
            if !value.trim().is_empty() {
                record.window_id = Some(parse_int_cell(value, "window_id", line_no)?);
            }
        }
        for (i, &header) in headers.iter().enumerate() {
            if i == video_idx || i == frame_idx || Some(i) == window_idx {
                continue;
            }
            let value = cell(i);
            if value.trim().is_empty() {
                continue;
            }
            record
                .features
                .insert(header.to_string(), parse_float_cell(value, header, line_no)?);
        }
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Key and fused tables
// ---------------------------------------------------------------------------

/// Render the aligned common-key table.
pub fn write_key_table(keys: &[AlignedKey]) -> String {
    let mut lines = Vec::with_capacity(keys.len() + 1);
    lines.push("video_id,frame,window_id".to_string());
    for key in keys {
        lines.push(format!("{},{},{}", key.video_id, key.frame, key.window_id));
    }
    lines.join("\n")
}

/// Render the final fused table: one row per retained
/// `(video_id, window_id)` key, no `frame` column.
pub fn write_fused_table(rows: &[FusedRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        "video_id,window_id,movement_prediction,knee_prediction,elbow_prediction".to_string(),
    );
    for row in rows {
        lines.push(format!(
            "{},{},{},{},{}",
            row.video_id,
            row.window_id,
            row.movement_prediction,
            row.knee_prediction,
            row.elbow_prediction
        ));
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
