//! Video feature extraction.
//!
//! Samples exactly [`VIDEO_SAMPLE_FRAMES`] frames at timestamps
//! `duration * i / 10` for `i = 0..9`, seeking in increasing order
//! because decoder state advances with each seek. Every frame is
//! converted to RGB and nearest-resized to the square input side, then
//! the frames are stacked in timestamp order behind a batch dimension.
//! Output shape `[1, 10, 224, 224, 3]`.

use std::time::Duration;

use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use tokio::time::timeout;

use lucidscan_core::shapes::{IMAGE_INPUT_SIDE, VIDEO_SAMPLE_FRAMES};
use lucidscan_core::{FeatureTensor, FrameSource, Modality};

use crate::error::{DetectError, DetectResult};
use crate::extract::image::contract_violation;

pub(crate) async fn extract_video(
    mut source: Box<dyn FrameSource>,
    frame_timeout: Duration,
) -> DetectResult<FeatureTensor> {
    let duration = source.duration_secs();
    if !duration.is_finite() || duration <= 0.0 {
        return Err(DetectError::extraction("zero-duration video"));
    }

    let side = IMAGE_INPUT_SIDE;
    let mut data = Vec::with_capacity(VIDEO_SAMPLE_FRAMES * side * side * 3);
    for index in 0..VIDEO_SAMPLE_FRAMES {
        let timestamp = duration * index as f64 / VIDEO_SAMPLE_FRAMES as f64;
        let frame = timeout(frame_timeout, source.frame_at(timestamp))
            .await
            .map_err(|_| {
                DetectError::decode_msg(
                    Modality::Video,
                    format!("frame seek at {timestamp:.3}s timed out"),
                )
            })?
            .map_err(|e| DetectError::decode(Modality::Video, e))?;

        let rgb = frame
            .to_dynamic_image()
            .map_err(|e| DetectError::extraction(format!("unusable frame: {e}")))?
            .to_rgb8();
        let resized = image::imageops::resize(&rgb, side as u32, side as u32, FilterType::Nearest);
        data.extend(resized.into_raw().into_iter().map(f32::from));
        tracing::trace!(index, timestamp, "video frame sampled");
    }

    let tensor = Tensor::from_vec(
        data,
        (1, VIDEO_SAMPLE_FRAMES, side, side, 3),
        &Device::Cpu,
    )
    .map_err(|e| DetectError::tensor("video tensor build", e))?;
    FeatureTensor::new(Modality::Video, tensor).map_err(contract_violation)
}
