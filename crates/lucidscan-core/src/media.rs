//! Decoded sample forms handed from decoders to feature extractors.

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::{CoreError, CoreResult};

/// Interleaved 8-bit pixel grid with 3 (RGB) or 4 (RGBA) channels.
///
/// Decoders produce grids at the media's native dimensions; resizing to
/// the classifier's input side is the extractor's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Create a grid from interleaved samples.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidPixelGrid`] when `channels` is not 3 or
    /// 4, or when `data.len() != width * height * channels`.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> CoreResult<Self> {
        if channels != 3 && channels != 4 {
            return Err(CoreError::InvalidPixelGrid {
                reason: format!("expected 3 or 4 channels, got {channels}"),
            });
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(CoreError::InvalidPixelGrid {
                reason: format!(
                    "sample count {} does not match {width}x{height}x{channels} = {expected}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build a grid from a decoded raster image, keeping the source's
    /// alpha channel when present.
    #[must_use]
    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            Self {
                width: rgba.width(),
                height: rgba.height(),
                channels: 4,
                data: rgba.into_raw(),
            }
        } else {
            let rgb = image.to_rgb8();
            Self {
                width: rgb.width(),
                height: rgb.height(),
                channels: 3,
                data: rgb.into_raw(),
            }
        }
    }

    /// Convert back into a raster image for encoding or resizing.
    ///
    /// # Errors
    /// Returns [`CoreError::ImageConversion`] when the buffer cannot back
    /// an image of these dimensions (only possible for degenerate grids).
    pub fn to_dynamic_image(&self) -> CoreResult<DynamicImage> {
        let reason = || CoreError::ImageConversion {
            reason: format!(
                "cannot view {}x{}x{} buffer as an image",
                self.width, self.height, self.channels
            ),
        };
        match self.channels {
            3 => image::RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(reason),
            _ => image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(reason),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Interleaved samples, row-major, `channels` values per pixel.
    #[inline]
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.data
    }

    /// Consume the grid, returning the interleaved samples.
    #[inline]
    #[must_use]
    pub fn into_samples(self) -> Vec<u8> {
        self.data
    }
}

/// Mono PCM samples plus the source sample rate.
///
/// Decoders take the first channel of multi-channel sources and never
/// resample; the extractor's framing works at the native rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// # Errors
    /// Returns [`CoreError::InvalidAudioClip`] when `sample_rate` is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> CoreResult<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidAudioClip {
                reason: "sample_rate must be > 0".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    #[inline]
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Seekable video frame capture contract.
///
/// Implementations wrap a platform decoder. Within one extraction pass
/// the pipeline seeks in non-decreasing timestamp order, because decoder
/// state advances with each seek; implementations may rely on that.
#[async_trait]
pub trait FrameSource: Send {
    /// Total duration in seconds. Zero or non-finite values cause the
    /// extractor to reject the source.
    fn duration_secs(&self) -> f64;

    /// Seek to `timestamp_secs` in `[0, duration)` and capture the frame
    /// visible at that instant.
    async fn frame_at(&mut self, timestamp_secs: f64) -> CoreResult<PixelGrid>;
}

/// Modality-specific decoded form, created by a decoder and consumed
/// exactly once by the matching feature extractor.
pub enum DecodedMedia {
    Image(PixelGrid),
    Video(Box<dyn FrameSource>),
    Audio(AudioClip),
    Text(String),
}

impl std::fmt::Debug for DecodedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(grid) => f
                .debug_struct("DecodedMedia::Image")
                .field("width", &grid.width())
                .field("height", &grid.height())
                .field("channels", &grid.channels())
                .finish(),
            Self::Video(source) => f
                .debug_struct("DecodedMedia::Video")
                .field("duration_secs", &source.duration_secs())
                .finish(),
            Self::Audio(clip) => f
                .debug_struct("DecodedMedia::Audio")
                .field("samples", &clip.len())
                .field("sample_rate", &clip.sample_rate())
                .finish(),
            Self::Text(text) => f
                .debug_struct("DecodedMedia::Text")
                .field("chars", &text.chars().count())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(width: u32, height: u32, channels: u8, value: u8) -> PixelGrid {
        let len = width as usize * height as usize * channels as usize;
        PixelGrid::new(width, height, channels, vec![value; len]).unwrap()
    }

    // ============================================================
    // PIXEL GRID TESTS
    // ============================================================

    #[test]
    fn test_pixel_grid_rejects_bad_channel_count() {
        let result = PixelGrid::new(2, 2, 2, vec![0; 8]);
        assert!(matches!(result, Err(CoreError::InvalidPixelGrid { .. })));
    }

    #[test]
    fn test_pixel_grid_rejects_length_mismatch() {
        let result = PixelGrid::new(2, 2, 3, vec![0; 11]);
        let err = result.unwrap_err();
        assert!(format!("{err}").contains("2x2x3"));
    }

    #[test]
    fn test_pixel_grid_roundtrips_through_dynamic_image() {
        let grid = flat_grid(4, 3, 3, 77);
        let image = grid.to_dynamic_image().unwrap();
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 3);
        let back = PixelGrid::from_dynamic_image(&image);
        assert_eq!(back, grid);
    }

    #[test]
    fn test_pixel_grid_keeps_alpha_channel() {
        let grid = flat_grid(2, 2, 4, 10);
        let image = grid.to_dynamic_image().unwrap();
        assert!(image.color().has_alpha());
        assert_eq!(PixelGrid::from_dynamic_image(&image).channels(), 4);
    }

    // ============================================================
    // AUDIO CLIP TESTS
    // ============================================================

    #[test]
    fn test_audio_clip_rejects_zero_sample_rate() {
        let result = AudioClip::new(vec![0.0, 0.1], 0);
        assert!(matches!(result, Err(CoreError::InvalidAudioClip { .. })));
    }

    #[test]
    fn test_audio_clip_allows_empty_signal() {
        // Degenerate signals are rejected later, by extraction.
        let clip = AudioClip::new(Vec::new(), 44_100).unwrap();
        assert!(clip.is_empty());
        assert_eq!(clip.sample_rate(), 44_100);
    }

    // ============================================================
    // DEBUG FORMATTING
    // ============================================================

    #[test]
    fn test_decoded_media_debug_does_not_dump_payload() {
        let media = DecodedMedia::Image(flat_grid(100, 100, 3, 0));
        let debug = format!("{media:?}");
        assert!(debug.contains("width"));
        assert!(debug.len() < 200, "debug output should stay compact");
    }
}
