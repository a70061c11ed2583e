//! Image feature extraction.
//!
//! Nearest-neighbor resize to the classifier's square input side,
//! conversion to f32, and a leading batch dimension. Output shape
//! `[1, 224, 224, C]` with the decoder's channel count preserved.

use candle_core::{Device, Tensor};
use image::imageops::FilterType;

use lucidscan_core::shapes::IMAGE_INPUT_SIDE;
use lucidscan_core::{CoreError, FeatureTensor, Modality, PixelGrid};

use crate::error::{DetectError, DetectResult};

pub(crate) fn extract_image(grid: PixelGrid) -> DetectResult<FeatureTensor> {
    let channels = usize::from(grid.channels());
    let side = IMAGE_INPUT_SIDE;
    let data = resize_samples_f32(&grid, side as u32)?;

    let tensor = Tensor::from_vec(data, (1, side, side, channels), &Device::Cpu)
        .map_err(|e| DetectError::tensor("image tensor build", e))?;
    FeatureTensor::new(Modality::Image, tensor).map_err(contract_violation)
}

/// Nearest-neighbor resize to `side`x`side`, flattened to f32 samples in
/// the grid's own channel layout.
pub(crate) fn resize_samples_f32(grid: &PixelGrid, side: u32) -> DetectResult<Vec<f32>> {
    let dynamic = grid
        .to_dynamic_image()
        .map_err(|e| DetectError::extraction(format!("unusable pixel grid: {e}")))?;
    let raw = if grid.channels() == 4 {
        image::imageops::resize(&dynamic.to_rgba8(), side, side, FilterType::Nearest).into_raw()
    } else {
        image::imageops::resize(&dynamic.to_rgb8(), side, side, FilterType::Nearest).into_raw()
    };
    Ok(raw.into_iter().map(f32::from).collect())
}

/// A contract violation after extraction is an internal invariant break,
/// not a caller error.
pub(crate) fn contract_violation(error: CoreError) -> DetectError {
    DetectError::TensorError {
        message: format!("extractor produced an off-contract tensor: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn gradient_grid(width: u32, height: u32, channels: u8) -> PixelGrid {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.push((x % 256) as u8);
                data.push((y % 256) as u8);
                data.push(128);
                if channels == 4 {
                    data.push(255);
                }
            }
        }
        PixelGrid::new(width, height, channels, data).unwrap()
    }

    // Tensors register with the process-wide buffer gauge, so every test
    // that creates one shares the gauge's serial key.
    #[test]
    #[serial(buffer_gauge)]
    fn test_extract_resizes_any_input_to_contract_shape() {
        let tensor = extract_image(gradient_grid(300, 200, 3)).unwrap();
        assert_eq!(tensor.dims(), [1, 224, 224, 3]);
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_extract_upscales_small_input() {
        let tensor = extract_image(gradient_grid(7, 5, 3)).unwrap();
        assert_eq!(tensor.dims(), [1, 224, 224, 3]);
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_extract_preserves_alpha_channel_count() {
        let tensor = extract_image(gradient_grid(64, 64, 4)).unwrap();
        assert_eq!(tensor.dims(), [1, 224, 224, 4]);
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_values_stay_in_byte_range_as_floats() {
        let tensor = extract_image(gradient_grid(10, 10, 3)).unwrap();
        let flat = tensor
            .inner()
            .flatten_all()
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        assert!(flat.iter().all(|v| (0.0..=255.0).contains(v)));
    }
}
