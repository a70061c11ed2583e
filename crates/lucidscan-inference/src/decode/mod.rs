//! Media decoders: raw bytes to structured samples.
//!
//! Each decoder satisfies a fixed contract (spelled out per module) and
//! fails with a decode error on malformed or unsupported input. Video
//! decoding is an external platform capability reached through the
//! [`VideoBackend`] seam; everything else ships a built-in decoder.

mod audio;
mod image;
mod text;
mod video;

pub use video::VideoBackend;

use lucidscan_core::{DecodedMedia, Modality};

use crate::error::{DetectError, DetectResult};

/// Decode `bytes` according to the declared modality.
///
/// # Errors
/// Returns [`DetectError::DecodeError`] for malformed or unsupported
/// media, and for video submissions when no backend is configured.
pub async fn decode_media(
    modality: Modality,
    bytes: Vec<u8>,
    video_backend: Option<&dyn VideoBackend>,
) -> DetectResult<DecodedMedia> {
    match modality {
        Modality::Image => image::decode_image(&bytes).map(DecodedMedia::Image),
        Modality::Audio => audio::decode_audio(bytes).map(DecodedMedia::Audio),
        Modality::Text => text::decode_text(bytes).map(DecodedMedia::Text),
        Modality::Video => match video_backend {
            Some(backend) => backend
                .open(bytes)
                .await
                .map(DecodedMedia::Video)
                .map_err(|e| DetectError::decode(Modality::Video, e)),
            None => Err(DetectError::decode_msg(
                Modality::Video,
                "no video decoder backend configured",
            )),
        },
    }
}
