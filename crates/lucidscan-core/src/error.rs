//! Error type for data-model violations.
//!
//! These errors cover construction and conversion of the shared sample
//! types. Pipeline-level failures (decode, model load, extraction,
//! inference) live in the inference crate and wrap these where needed.

use crate::modality::Modality;
use thiserror::Error;

/// Error type for data-model violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pixel grid construction rejected (bad channel count, length mismatch).
    #[error("invalid pixel grid: {reason}")]
    InvalidPixelGrid { reason: String },

    /// Audio clip construction rejected (zero sample rate).
    #[error("invalid audio clip: {reason}")]
    InvalidAudioClip { reason: String },

    /// A tensor's shape does not match the modality's fixed contract.
    #[error("tensor shape {dims:?} violates the {modality:?} contract {expected}")]
    ShapeContract {
        modality: Modality,
        dims: Vec<usize>,
        expected: &'static str,
    },

    /// A frame source failed to capture the frame at a timestamp.
    #[error("frame capture failed at {timestamp_secs}s: {message}")]
    FrameCapture {
        timestamp_secs: f64,
        message: String,
    },

    /// Conversion between `PixelGrid` and the raster backend failed.
    #[error("image conversion failed: {reason}")]
    ImageConversion { reason: String },
}

/// Result type alias for data-model operations.
pub type CoreResult<T> = Result<T, CoreError>;
