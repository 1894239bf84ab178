//! Core domain logic for the GMA pose-ensemble pipeline.
//!
//! Reconciles per-frame keypoint tables produced by three independent
//! pose back-ends (YOLO, MoveNet, MediaPipe) into one common windowed
//! feature stream, and fuses the three models' per-sequence predictions
//! into a single ensemble output per `(video_id, window_id)`.
//!
//! Pure in-memory logic, no file or network I/O. The pipeline crate
//! owns orchestration and artifact persistence.

pub mod alignment;
pub mod dedup;
pub mod error;
pub mod fusion;
pub mod record;
pub mod schema;
pub mod sequence;
pub mod source;
pub mod table;
pub mod windowing;

pub use error::CoreError;
