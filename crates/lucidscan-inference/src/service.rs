//! Analysis service facade.
//!
//! The single surface UI components talk to: submit raw media of a
//! declared modality and receive a probability in `[0, 100]` or a typed
//! failure, plus the independent ELA diagnostic for images.

use std::sync::Arc;
use std::time::Duration;

use tokenizers::Tokenizer;
use tokio::time::timeout;

use lucidscan_core::{Modality, PixelGrid, ProbabilityScore};
use lucidscan_forensics::{compute_ela_with_quality, DEFAULT_ELA_QUALITY};

use crate::config::DetectorConfig;
use crate::decode::{decode_media, VideoBackend};
use crate::error::{DetectError, DetectResult};
use crate::executor::InferenceExecutor;
use crate::extract::FeaturePipeline;
use crate::registry::{FsAssetStore, FsCacheStore, ModelAssetStore, ModelCacheStore, ModelRegistry};

/// Facade over decode, extraction, the model registry, and inference.
///
/// One instance serves many concurrent submissions; within a single
/// submission the stages run strictly in order, and independent
/// submissions interleave at await points. Results come back in
/// completion order, not submission order.
pub struct AnalysisService {
    config: DetectorConfig,
    registry: Arc<ModelRegistry>,
    executor: InferenceExecutor,
    pipeline: FeaturePipeline,
    video_backend: Option<Arc<dyn VideoBackend>>,
}

impl AnalysisService {
    /// Build a service over filesystem stores at the configured paths.
    ///
    /// # Errors
    /// Returns [`DetectError::ConfigError`] on invalid configuration or
    /// an unreadable vocabulary file.
    pub fn new(config: DetectorConfig) -> DetectResult<Self> {
        let cache: Arc<dyn ModelCacheStore> =
            Arc::new(FsCacheStore::new(config.models.cache_dir.clone()));
        let assets: Arc<dyn ModelAssetStore> =
            Arc::new(FsAssetStore::new(config.models.assets_dir.clone()));
        Self::with_stores(config, cache, assets)
    }

    /// Build a service over injected storage backends.
    ///
    /// # Errors
    /// Returns [`DetectError::ConfigError`] on invalid configuration or
    /// an unreadable vocabulary file.
    pub fn with_stores(
        config: DetectorConfig,
        cache: Arc<dyn ModelCacheStore>,
        assets: Arc<dyn ModelAssetStore>,
    ) -> DetectResult<Self> {
        config.validate()?;

        let vocab = match &config.models.vocab_file {
            Some(path) => Some(Tokenizer::from_file(path).map_err(|e| {
                DetectError::ConfigError {
                    message: format!("vocab file '{}' unusable: {e}", path.display()),
                }
            })?),
            None => None,
        };

        let registry = Arc::new(ModelRegistry::new(cache, assets));
        let frame_timeout = Duration::from_millis(config.limits.decode_timeout_ms);
        Ok(Self {
            executor: InferenceExecutor::new(Arc::clone(&registry)),
            pipeline: FeaturePipeline::new(vocab, frame_timeout),
            registry,
            config,
            video_backend: None,
        })
    }

    /// Install a platform video decoding backend.
    #[must_use]
    pub fn with_video_backend(mut self, backend: Arc<dyn VideoBackend>) -> Self {
        self.video_backend = Some(backend);
        self
    }

    /// Access the model registry, e.g. to preload models at startup.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Analyze one piece of media: decode, extract, infer.
    ///
    /// # Errors
    /// - [`DetectError::DecodeError`] for unusable input (malformed
    ///   media, oversized payload, decode timeout, missing video
    ///   backend)
    /// - [`DetectError::ExtractionError`] for degenerate input
    /// - [`DetectError::InferenceError`] when the model cannot be
    ///   acquired or scoring fails
    pub async fn submit_media(
        &self,
        modality: Modality,
        bytes: Vec<u8>,
    ) -> DetectResult<ProbabilityScore> {
        if bytes.len() > self.config.limits.max_media_bytes {
            return Err(DetectError::decode_msg(
                modality,
                format!(
                    "payload of {} bytes exceeds the {} byte limit",
                    bytes.len(),
                    self.config.limits.max_media_bytes
                ),
            ));
        }

        let decode_budget = Duration::from_millis(self.config.limits.decode_timeout_ms);
        let media = timeout(
            decode_budget,
            decode_media(modality, bytes, self.video_backend.as_deref()),
        )
        .await
        .map_err(|_| DetectError::decode_msg(modality, "decode timed out"))??;

        let tensor = self.pipeline.extract(media).await?;
        self.executor.infer(tensor).await
    }

    /// Produce the ELA diagnostic image for display.
    ///
    /// Independent of scoring and best-effort by design: on any internal
    /// failure the original image comes back unchanged.
    #[must_use]
    pub fn submit_image_for_diagnostics(
        &self,
        image: &PixelGrid,
        quality: Option<u8>,
    ) -> PixelGrid {
        compute_ela_with_quality(image, quality.unwrap_or(DEFAULT_ELA_QUALITY))
    }
}
