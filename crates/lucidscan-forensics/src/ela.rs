//! Error Level Analysis transform.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

use lucidscan_core::PixelGrid;

/// JPEG quality used when the caller does not supply one.
pub const DEFAULT_ELA_QUALITY: u8 = 90;

/// Internal failure cause; never escapes this module, only logged before
/// falling back to the original image.
#[derive(Debug, Error)]
enum ElaError {
    #[error("jpeg round-trip failed: {0}")]
    Jpeg(#[from] image::ImageError),

    #[error("pixel grid conversion failed: {0}")]
    Grid(#[from] lucidscan_core::CoreError),

    #[error("recompressed image is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    DimensionDrift {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },
}

/// Compute the ELA diagnostic for `image` at the default quality.
#[must_use]
pub fn compute_ela(image: &PixelGrid) -> PixelGrid {
    compute_ela_with_quality(image, DEFAULT_ELA_QUALITY)
}

/// Compute the ELA diagnostic for `image`, recompressing at `quality`
/// (0 to 100; values outside the encoder's 1 to 100 range are clamped).
///
/// The result has the input's dimensions and channel count. The
/// difference is computed per pixel and channel over RGB, scaled so the
/// largest observed difference maps to 255; RGBA inputs keep an opaque
/// alpha channel in the output.
///
/// This is a best-effort diagnostic: any failure logs a warning and
/// returns the original image unchanged instead of propagating an error.
#[must_use]
pub fn compute_ela_with_quality(image: &PixelGrid, quality: u8) -> PixelGrid {
    match ela_inner(image, quality) {
        Ok(diagnostic) => diagnostic,
        Err(error) => {
            tracing::warn!(%error, "ELA generation failed, returning original image");
            image.clone()
        }
    }
}

fn ela_inner(image: &PixelGrid, quality: u8) -> Result<PixelGrid, ElaError> {
    let original = image.to_dynamic_image()?.to_rgb8();
    let (width, height) = (original.width(), original.height());

    // Round-trip through JPEG at the requested quality.
    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, quality.clamp(1, 100)).encode(
        original.as_raw(),
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    let recompressed =
        image::load_from_memory_with_format(&jpeg_bytes, image::ImageFormat::Jpeg)?.to_rgb8();

    if recompressed.width() != width || recompressed.height() != height {
        return Err(ElaError::DimensionDrift {
            expected_w: width,
            expected_h: height,
            actual_w: recompressed.width(),
            actual_h: recompressed.height(),
        });
    }

    // Absolute per-channel differences and their global maximum.
    let diffs: Vec<u8> = original
        .as_raw()
        .iter()
        .zip(recompressed.as_raw().iter())
        .map(|(&a, &b)| a.abs_diff(b))
        .collect();
    let max_diff = diffs.iter().copied().max().unwrap_or(0);

    // Scale so the brightest difference maps to 255. A zero maximum
    // degrades to a zero image rather than dividing by zero.
    let scale = 255.0 / f32::from(max_diff.max(1));
    let scaled = diffs
        .iter()
        .map(|&d| (f32::from(d) * scale).round().clamp(0.0, 255.0) as u8);

    let data = if image.channels() == 4 {
        let mut rgba = Vec::with_capacity(diffs.len() / 3 * 4);
        for (index, value) in scaled.enumerate() {
            rgba.push(value);
            if index % 3 == 2 {
                rgba.push(u8::MAX);
            }
        }
        rgba
    } else {
        scaled.collect()
    };

    Ok(PixelGrid::new(width, height, image.channels(), data)?)
}
