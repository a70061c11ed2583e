//! Fixed tensor shape contracts, one per modality.
//!
//! These constants are the downstream classifier's input contract.
//! Extractors resize, pad, or truncate to meet them; they never pass a
//! variable shape forward.

use crate::modality::Modality;

/// Side length of the square frame expected by the image and video heads.
pub const IMAGE_INPUT_SIDE: usize = 224;

/// Number of frames sampled from a video, evenly spaced over `[0, duration)`.
pub const VIDEO_SAMPLE_FRAMES: usize = 10;

/// Analysis window length for audio framing, in samples.
pub const AUDIO_FRAME_SIZE: usize = 1024;

/// Hop between consecutive audio frames, in samples.
pub const AUDIO_HOP_SIZE: usize = 512;

/// Number of frequency bands in each per-frame audio feature vector.
pub const AUDIO_FEATURE_BANDS: usize = 128;

/// Side length of the square spectrogram grid after bilinear resize.
pub const AUDIO_GRID_SIDE: usize = 128;

/// Fixed token sequence length for text input.
pub const TEXT_SEQUENCE_LEN: usize = 100;

/// Bucket count for the fallback first-character token hash.
pub const TEXT_HASH_BUCKETS: u32 = 1000;

/// Returns true when `dims` satisfies the modality's shape contract.
///
/// Image and video inputs keep the decoder's channel count, so the
/// trailing dimension accepts 3 (RGB) or 4 (RGBA) for images; sampled
/// video frames are always converted to RGB.
#[must_use]
pub fn matches_contract(modality: Modality, dims: &[usize]) -> bool {
    match modality {
        Modality::Image => {
            matches!(dims, [1, h, w, c]
                if *h == IMAGE_INPUT_SIDE && *w == IMAGE_INPUT_SIDE && (*c == 3 || *c == 4))
        }
        Modality::Video => {
            matches!(dims, [1, f, h, w, 3]
                if *f == VIDEO_SAMPLE_FRAMES && *h == IMAGE_INPUT_SIDE && *w == IMAGE_INPUT_SIDE)
        }
        Modality::Audio => dims == [1, AUDIO_GRID_SIDE, AUDIO_GRID_SIDE, 1],
        Modality::Text => dims == [1, TEXT_SEQUENCE_LEN],
    }
}

/// Human-readable contract shape, used in shape-violation errors.
#[must_use]
pub const fn contract_summary(modality: Modality) -> &'static str {
    match modality {
        Modality::Image => "[1, 224, 224, C] with C in {3, 4}",
        Modality::Video => "[1, 10, 224, 224, 3]",
        Modality::Audio => "[1, 128, 128, 1]",
        Modality::Text => "[1, 100]",
    }
}
