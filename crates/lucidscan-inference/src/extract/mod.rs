//! Feature extractors: structured samples to contract tensors.
//!
//! One extractor per modality, selected by an exhaustive match over
//! [`DecodedMedia`] so the compiler enforces that every modality is
//! handled. Whatever the input size, the output always carries the
//! modality's fixed contract shape; extractors resize, pad, or truncate
//! to get there.

mod audio;
mod image;
mod text;
mod video;

use std::time::Duration;

use tokenizers::Tokenizer;

use lucidscan_core::{DecodedMedia, FeatureTensor};

use crate::error::DetectResult;

/// Stateful extraction front end.
///
/// Holds the optional text vocabulary and the per-seek timeout applied
/// while sampling video frames.
pub struct FeaturePipeline {
    vocab: Option<Tokenizer>,
    frame_timeout: Duration,
}

impl FeaturePipeline {
    #[must_use]
    pub fn new(vocab: Option<Tokenizer>, frame_timeout: Duration) -> Self {
        Self {
            vocab,
            frame_timeout,
        }
    }

    /// Convert decoded samples into the modality's contract tensor.
    ///
    /// The input is consumed; video sources are seeked in increasing
    /// timestamp order.
    ///
    /// # Errors
    /// - [`DetectError::ExtractionError`](crate::error::DetectError) for
    ///   degenerate input (zero-duration video, empty audio signal)
    /// - [`DetectError::DecodeError`](crate::error::DetectError) when a
    ///   frame seek fails or times out
    pub async fn extract(&self, media: DecodedMedia) -> DetectResult<FeatureTensor> {
        match media {
            DecodedMedia::Image(grid) => image::extract_image(grid),
            DecodedMedia::Video(source) => {
                video::extract_video(source, self.frame_timeout).await
            }
            DecodedMedia::Audio(clip) => audio::extract_audio(&clip),
            DecodedMedia::Text(text) => text::extract_text(&text, self.vocab.as_ref()),
        }
    }
}
