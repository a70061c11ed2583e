//! Audio feature extraction.
//!
//! The mono signal is cut into overlapping frames of
//! [`AUDIO_FRAME_SIZE`] samples with hop [`AUDIO_HOP_SIZE`]; a signal
//! shorter than one window yields a single zero-padded frame. Each frame
//! is Hann-windowed, transformed with a forward FFT, and its one-sided
//! magnitude spectrum is pooled into [`AUDIO_FEATURE_BANDS`] contiguous
//! frequency bands. The resulting `[frames, 128]` grid is bilinearly
//! resized to the fixed `[128, 128]` contract grid and wrapped with
//! batch and channel dimensions. Output shape `[1, 128, 128, 1]`.

use candle_core::{Device, Tensor};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use lucidscan_core::shapes::{
    AUDIO_FEATURE_BANDS, AUDIO_FRAME_SIZE, AUDIO_GRID_SIDE, AUDIO_HOP_SIZE,
};
use lucidscan_core::{AudioClip, FeatureTensor, Modality};

use crate::error::{DetectError, DetectResult};
use crate::extract::image::contract_violation;

pub(crate) fn extract_audio(clip: &AudioClip) -> DetectResult<FeatureTensor> {
    let samples = clip.samples();
    if samples.is_empty() {
        return Err(DetectError::extraction("empty audio signal"));
    }

    let frames = frame_count(samples.len());
    let window = hann_window(AUDIO_FRAME_SIZE);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(AUDIO_FRAME_SIZE);

    let mut grid = Vec::with_capacity(frames * AUDIO_FEATURE_BANDS);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); AUDIO_FRAME_SIZE];
    for frame_index in 0..frames {
        let start = frame_index * AUDIO_HOP_SIZE;
        for (n, slot) in buffer.iter_mut().enumerate() {
            // Frames running past the signal end are zero-padded.
            let sample = samples.get(start + n).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * window[n], 0.0);
        }
        fft.process(&mut buffer);
        band_magnitudes(&buffer, &mut grid);
    }

    tracing::debug!(
        samples = samples.len(),
        sample_rate = clip.sample_rate(),
        frames,
        "spectrogram grid built"
    );

    let resized = bilinear_resize(
        &grid,
        frames,
        AUDIO_FEATURE_BANDS,
        AUDIO_GRID_SIDE,
        AUDIO_GRID_SIDE,
    );
    let tensor = Tensor::from_vec(
        resized,
        (1, AUDIO_GRID_SIDE, AUDIO_GRID_SIDE, 1),
        &Device::Cpu,
    )
    .map_err(|e| DetectError::tensor("spectrogram tensor build", e))?;
    FeatureTensor::new(Modality::Audio, tensor).map_err(contract_violation)
}

/// Number of analysis frames for a signal of `len` samples.
///
/// `floor((len - 1024) / 512) + 1` full windows; anything shorter than a
/// single window still produces one (zero-padded) frame.
pub(crate) fn frame_count(len: usize) -> usize {
    if len >= AUDIO_FRAME_SIZE {
        (len - AUDIO_FRAME_SIZE) / AUDIO_HOP_SIZE + 1
    } else {
        1
    }
}

/// Hann window: `w[n] = 0.5 * (1 - cos(2*pi*n / (N-1)))`.
fn hann_window(size: usize) -> Vec<f32> {
    let denom = (size - 1) as f32;
    (0..size)
        .map(|n| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / denom).cos()))
        .collect()
}

/// Pool the one-sided magnitude spectrum into contiguous frequency bands,
/// appending one value per band to `out`.
fn band_magnitudes(spectrum: &[Complex<f32>], out: &mut Vec<f32>) {
    let bins = AUDIO_FRAME_SIZE / 2 + 1;
    for band in 0..AUDIO_FEATURE_BANDS {
        let lo = band * bins / AUDIO_FEATURE_BANDS;
        let hi = (band + 1) * bins / AUDIO_FEATURE_BANDS;
        out.push(spectrum[lo..hi].iter().map(|bin| bin.norm()).sum());
    }
}

/// Bilinear resize of a row-major `src_h`x`src_w` grid to
/// `dst_h`x`dst_w`.
fn bilinear_resize(
    src: &[f32],
    src_h: usize,
    src_w: usize,
    dst_h: usize,
    dst_w: usize,
) -> Vec<f32> {
    debug_assert_eq!(src.len(), src_h * src_w);

    let coord = |dst: usize, dst_len: usize, src_len: usize| -> f32 {
        if dst_len <= 1 || src_len <= 1 {
            0.0
        } else {
            dst as f32 * (src_len - 1) as f32 / (dst_len - 1) as f32
        }
    };

    let mut out = Vec::with_capacity(dst_h * dst_w);
    for y in 0..dst_h {
        let sy = coord(y, dst_h, src_h);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let ty = sy - y0 as f32;
        for x in 0..dst_w {
            let sx = coord(x, dst_w, src_w);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let tx = sx - x0 as f32;

            let top = src[y0 * src_w + x0] * (1.0 - tx) + src[y0 * src_w + x1] * tx;
            let bottom = src[y1 * src_w + x0] * (1.0 - tx) + src[y1 * src_w + x1] * tx;
            out.push(top * (1.0 - ty) + bottom * ty);
        }
    }
    out
}
