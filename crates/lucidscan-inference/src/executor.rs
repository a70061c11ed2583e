//! Inference executor.
//!
//! Bridges a contract tensor to the registered scoring model and turns
//! the raw probability into a clamped percentage. The tensor is taken by
//! value and released before the result leaves this module, on the
//! success path and on every failure path alike; the core buffer gauge
//! verifies that nothing outlives the call.

use std::sync::Arc;

use lucidscan_core::{FeatureTensor, ProbabilityScore};

use crate::error::{boxed_message, DetectError, DetectResult};
use crate::registry::ModelRegistry;

/// Runs scoring calls against registry-owned models.
pub struct InferenceExecutor {
    registry: Arc<ModelRegistry>,
}

impl InferenceExecutor {
    #[must_use]
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Score a tensor with its modality's model.
    ///
    /// # Errors
    /// Returns [`DetectError::InferenceError`] when the model cannot be
    /// acquired or the scoring call fails; the underlying cause is
    /// preserved in the source chain.
    pub async fn infer(&self, tensor: FeatureTensor) -> DetectResult<ProbabilityScore> {
        let modality = tensor.modality();

        let handle = match self.registry.acquire(modality).await {
            Ok(handle) => handle,
            Err(error) => {
                // The tensor drops here, before the failure propagates.
                drop(tensor);
                return Err(DetectError::inference(modality, error));
            }
        };

        let raw = handle.score(&tensor);
        drop(tensor);

        let raw = raw.map_err(|e| DetectError::inference(modality, e))?;
        if !raw.is_finite() {
            return Err(DetectError::inference(
                modality,
                boxed_message(format!("model produced a non-finite score: {raw}")),
            ));
        }

        let score = ProbabilityScore::from_unit(raw);
        tracing::debug!(modality = %modality, score = score.value(), "inference complete");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use candle_core::{Device, Tensor};
    use serial_test::serial;

    use lucidscan_core::gauge::live_buffers;
    use lucidscan_core::shapes::TEXT_SEQUENCE_LEN;
    use lucidscan_core::Modality;

    use crate::model::ScoringModel;
    use crate::registry::{FsAssetStore, FsCacheStore};

    struct CountingModel {
        score: f32,
        calls: AtomicUsize,
    }

    impl ScoringModel for CountingModel {
        fn modality(&self) -> Modality {
            Modality::Text
        }

        fn score(&self, _tensor: &FeatureTensor) -> DetectResult<f32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.score)
        }
    }

    struct FailingModel;

    impl ScoringModel for FailingModel {
        fn modality(&self) -> Modality {
            Modality::Text
        }

        fn score(&self, _tensor: &FeatureTensor) -> DetectResult<f32> {
            Err(DetectError::TensorError {
                message: "backend rejected the tensor".to_string(),
            })
        }
    }

    fn empty_registry(tmp: &tempfile::TempDir) -> Arc<ModelRegistry> {
        Arc::new(ModelRegistry::new(
            Arc::new(FsCacheStore::new(tmp.path().join("cache"))),
            Arc::new(FsAssetStore::new(tmp.path())),
        ))
    }

    fn text_tensor() -> FeatureTensor {
        let tensor = Tensor::from_vec(
            vec![1u32; TEXT_SEQUENCE_LEN],
            (1, TEXT_SEQUENCE_LEN),
            &Device::Cpu,
        )
        .unwrap();
        FeatureTensor::new(Modality::Text, tensor).unwrap()
    }

    #[tokio::test]
    #[serial(buffer_gauge)]
    async fn test_infer_scales_and_invokes_model_once() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = empty_registry(&tmp);
        let model = Arc::new(CountingModel {
            score: 0.42,
            calls: AtomicUsize::new(0),
        });
        registry.preload(Arc::clone(&model) as _).await;

        let executor = InferenceExecutor::new(registry);
        let score = executor.infer(text_tensor()).await.unwrap();

        assert!((score.value() - 42.0).abs() < 1e-4);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(live_buffers(), 0, "tensor released after success");
    }

    #[tokio::test]
    #[serial(buffer_gauge)]
    async fn test_infer_clamps_out_of_range_scores() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = empty_registry(&tmp);
        registry
            .preload(Arc::new(CountingModel {
                score: 1.7,
                calls: AtomicUsize::new(0),
            }) as _)
            .await;

        let executor = InferenceExecutor::new(registry);
        let score = executor.infer(text_tensor()).await.unwrap();
        assert_eq!(score.value(), 100.0);
    }

    #[tokio::test]
    #[serial(buffer_gauge)]
    async fn test_scoring_failure_wraps_and_releases_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = empty_registry(&tmp);
        registry.preload(Arc::new(FailingModel) as _).await;

        let executor = InferenceExecutor::new(registry);
        let err = executor.infer(text_tensor()).await.unwrap_err();

        assert!(matches!(err, DetectError::InferenceError { .. }));
        assert_eq!(live_buffers(), 0, "tensor released after failure");
    }

    #[tokio::test]
    #[serial(buffer_gauge)]
    async fn test_unacquirable_model_wraps_and_releases_buffer() {
        // Registry over an empty directory: no assets, every acquire
        // fails.
        let tmp = tempfile::tempdir().unwrap();
        let executor = InferenceExecutor::new(empty_registry(&tmp));

        let err = executor.infer(text_tensor()).await.unwrap_err();
        assert!(matches!(
            err,
            DetectError::InferenceError {
                modality: Modality::Text,
                ..
            }
        ));
        assert_eq!(live_buffers(), 0, "tensor released after acquire failure");
    }
}
