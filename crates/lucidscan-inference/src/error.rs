//! Error taxonomy for the analysis pipeline.
//!
//! # Error Categories
//!
//! | Category | Variants | Caller treatment |
//! |----------|----------|------------------|
//! | Media | DecodeError | "please select a valid file", no retry |
//! | Model | ModelLoadError | fatal for the modality until assets fixed |
//! | Input | ExtractionError | validation failure (degenerate input) |
//! | Scoring | InferenceError | generic processing error |
//! | Ambient | ConfigError, TensorError, IoError | operator-facing |
//!
//! All four pipeline kinds propagate unchanged to the caller; nothing is
//! retried internally beyond the registry's cache-to-asset fallback
//! chain, and no failure is converted into a default score.

use lucidscan_core::Modality;
use thiserror::Error;

/// Boxed failure cause carried by the pipeline error variants.
pub type ErrorCause = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all analysis pipeline failures.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Malformed, unsupported, oversized, or timed-out media input.
    #[error("decode failed for {modality} media: {source}")]
    DecodeError {
        modality: Modality,
        #[source]
        source: ErrorCause,
    },

    /// Both the persistent cache and the bundled asset failed to yield a
    /// usable model for the modality.
    #[error("model load failed for {modality}: {source}")]
    ModelLoadError {
        modality: Modality,
        #[source]
        source: ErrorCause,
    },

    /// Degenerate input that cannot produce a contract tensor.
    #[error("feature extraction failed: {reason}")]
    ExtractionError { reason: String },

    /// The scoring invocation itself failed (model acquisition included).
    #[error("inference failed for {modality}: {source}")]
    InferenceError {
        modality: Modality,
        #[source]
        source: ErrorCause,
    },

    /// Invalid configuration; never silently defaulted.
    #[error("configuration error: {message}")]
    ConfigError { message: String },

    /// A tensor operation failed outside the scoring call.
    #[error("tensor operation failed: {message}")]
    TensorError { message: String },

    /// File I/O failure in a store backend.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DetectError {
    /// Wrap a decoder failure cause.
    pub fn decode(modality: Modality, source: impl Into<ErrorCause>) -> Self {
        Self::DecodeError {
            modality,
            source: source.into(),
        }
    }

    /// Decoder failure described by a message only.
    pub fn decode_msg(modality: Modality, message: impl Into<String>) -> Self {
        Self::decode(modality, boxed_message(message))
    }

    /// Wrap a model-load failure cause.
    pub fn model_load(modality: Modality, source: impl Into<ErrorCause>) -> Self {
        Self::ModelLoadError {
            modality,
            source: source.into(),
        }
    }

    /// Wrap a scoring failure cause.
    pub fn inference(modality: Modality, source: impl Into<ErrorCause>) -> Self {
        Self::InferenceError {
            modality,
            source: source.into(),
        }
    }

    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::ExtractionError {
            reason: reason.into(),
        }
    }

    /// Map a candle failure into [`DetectError::TensorError`] with the
    /// failing operation named.
    pub fn tensor(op: &str, error: candle_core::Error) -> Self {
        Self::TensorError {
            message: format!("{op}: {error}"),
        }
    }
}

/// Build an opaque boxed cause from a plain message.
pub(crate) fn boxed_message(message: impl Into<String>) -> ErrorCause {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        message.into(),
    ))
}

/// Result type alias for pipeline operations.
pub type DetectResult<T> = Result<T, DetectError>;
