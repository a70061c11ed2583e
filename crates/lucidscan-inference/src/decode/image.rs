//! Image decoding.
//!
//! Contract: decode to a pixel grid at the media's native width and
//! height with 3 or 4 channels, 8 bits per channel.

use lucidscan_core::{Modality, PixelGrid};

use crate::error::{DetectError, DetectResult};

pub(crate) fn decode_image(bytes: &[u8]) -> DetectResult<PixelGrid> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DetectError::decode(Modality::Image, e))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(DetectError::decode_msg(
            Modality::Image,
            "image has zero width or height",
        ));
    }
    let grid = PixelGrid::from_dynamic_image(&decoded);
    tracing::debug!(
        width = grid.width(),
        height = grid.height(),
        channels = grid.channels(),
        "image decoded"
    );
    Ok(grid)
}
