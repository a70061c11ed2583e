//! Gauge-tracked feature tensor.

use candle_core::Tensor;

use crate::error::{CoreError, CoreResult};
use crate::gauge::GaugeGuard;
use crate::modality::Modality;
use crate::shapes;

/// Fixed-shape numeric input to the classifier for one modality.
///
/// A `FeatureTensor` is ephemeral: an extractor creates it, the inference
/// executor consumes it, and dropping it releases the underlying buffer.
/// Construction validates the modality's shape contract, so a value of
/// this type always carries the contract shape.
///
/// Every live instance is counted by [`crate::gauge::live_buffers`]; the
/// pipeline's leak tests rely on that count returning to zero after both
/// success and failure paths.
#[derive(Debug)]
pub struct FeatureTensor {
    modality: Modality,
    inner: Tensor,
    _live: GaugeGuard,
}

impl FeatureTensor {
    /// Wrap a tensor after checking it against the modality contract.
    ///
    /// # Errors
    /// Returns [`CoreError::ShapeContract`] when `tensor`'s dimensions do
    /// not match the fixed shape for `modality`.
    pub fn new(modality: Modality, tensor: Tensor) -> CoreResult<Self> {
        let dims = tensor.dims();
        if !shapes::matches_contract(modality, dims) {
            return Err(CoreError::ShapeContract {
                modality,
                dims: dims.to_vec(),
                expected: shapes::contract_summary(modality),
            });
        }
        Ok(Self {
            modality,
            inner: tensor,
            _live: GaugeGuard::register(),
        })
    }

    #[inline]
    #[must_use]
    pub fn modality(&self) -> Modality {
        self.modality
    }

    #[inline]
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        self.inner.dims()
    }

    /// Borrow the underlying tensor for scoring.
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &Tensor {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::live_buffers;
    use candle_core::Device;
    use serial_test::serial;

    fn text_tensor() -> Tensor {
        Tensor::from_vec(vec![0u32; 100], (1, 100), &Device::Cpu).unwrap()
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_new_accepts_contract_shape() {
        let tensor = FeatureTensor::new(Modality::Text, text_tensor()).unwrap();
        assert_eq!(tensor.modality(), Modality::Text);
        assert_eq!(tensor.dims(), [1, 100]);
    }

    #[test]
    fn test_new_rejects_wrong_shape() {
        let bad = Tensor::from_vec(vec![0u32; 50], (1, 50), &Device::Cpu).unwrap();
        let err = FeatureTensor::new(Modality::Text, bad).unwrap_err();
        assert!(matches!(err, CoreError::ShapeContract { .. }));
    }

    #[test]
    fn test_new_rejects_cross_modality_shape() {
        // A valid text shape is not a valid audio shape.
        let err = FeatureTensor::new(Modality::Audio, text_tensor()).unwrap_err();
        assert!(format!("{err}").contains("[1, 128, 128, 1]"));
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_drop_releases_gauge_registration() {
        let before = live_buffers();
        let tensor = FeatureTensor::new(Modality::Text, text_tensor()).unwrap();
        assert_eq!(live_buffers(), before + 1);
        drop(tensor);
        assert_eq!(live_buffers(), before);
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_failed_construction_registers_nothing() {
        let before = live_buffers();
        let bad = Tensor::from_vec(vec![0u32; 10], (1, 10), &Device::Cpu).unwrap();
        let _ = FeatureTensor::new(Modality::Text, bad);
        assert_eq!(live_buffers(), before);
    }
}
