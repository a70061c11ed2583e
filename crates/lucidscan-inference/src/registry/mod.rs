//! Load-once model registry.
//!
//! Supplies the scoring model for a modality, loading at most once per
//! process and reusing the handle thereafter. Loads go through a layered
//! source: the persistent cache first, then the bundled asset with a
//! best-effort cache write-back.
//!
//! # State machine
//!
//! Each modality owns one slot behind an async mutex:
//!
//! ```text
//! Empty ──load ok──▶ Ready(handle)     (returned to every caller)
//!   │
//!   └───load err──▶ Failed(cause)      (returned to every caller)
//! ```
//!
//! The slot mutex serializes the first load, so concurrent `acquire`
//! calls for one modality never trigger duplicate loads; they all
//! observe the same eventual handle or the same memoized failure. Slots
//! for different modalities are independent. A failed load is not
//! retried until the process restarts with fixed assets, and a ready
//! handle is never unloaded.

mod stores;

pub use stores::{asset_file_name, FsAssetStore, FsCacheStore, ModelAssetStore, ModelCacheStore};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use lucidscan_core::Modality;

use crate::error::{boxed_message, DetectError, DetectResult};
use crate::model::{DetectorHead, ModelHandle};

enum ModelSlot {
    Empty,
    Ready(ModelHandle),
    Failed(String),
}

/// Process-lifetime cache of scoring models, one per modality.
pub struct ModelRegistry {
    slots: HashMap<Modality, Mutex<ModelSlot>>,
    cache: Arc<dyn ModelCacheStore>,
    assets: Arc<dyn ModelAssetStore>,
}

impl ModelRegistry {
    /// Build a registry over the given storage backends.
    #[must_use]
    pub fn new(cache: Arc<dyn ModelCacheStore>, assets: Arc<dyn ModelAssetStore>) -> Self {
        let slots = Modality::all()
            .iter()
            .map(|&m| (m, Mutex::new(ModelSlot::Empty)))
            .collect();
        Self {
            slots,
            cache,
            assets,
        }
    }

    /// Seed a slot with an already-loaded model.
    ///
    /// Used for warm starts and as the test seam for injecting
    /// instrumented models; a seeded slot never touches the stores.
    pub async fn preload(&self, handle: ModelHandle) {
        let modality = handle.modality();
        let mut slot = self
            .slot(modality)
            .expect("registry holds a slot for every modality")
            .lock()
            .await;
        *slot = ModelSlot::Ready(handle);
    }

    /// Get the scoring model for `modality`, loading it on first use.
    ///
    /// # Errors
    /// Returns [`DetectError::ModelLoadError`] when both the cache and
    /// the bundled asset fail; the same failure is returned for every
    /// subsequent call on that modality.
    pub async fn acquire(&self, modality: Modality) -> DetectResult<ModelHandle> {
        let mut slot = self.slot(modality)?.lock().await;
        match &*slot {
            ModelSlot::Ready(handle) => Ok(Arc::clone(handle)),
            ModelSlot::Failed(cause) => Err(DetectError::model_load(
                modality,
                boxed_message(cause.clone()),
            )),
            ModelSlot::Empty => match self.load(modality).await {
                Ok(handle) => {
                    *slot = ModelSlot::Ready(Arc::clone(&handle));
                    Ok(handle)
                }
                Err(error) => {
                    tracing::error!(modality = %modality, %error, "model load failed");
                    *slot = ModelSlot::Failed(error.to_string());
                    Err(error)
                }
            },
        }
    }

    /// True when the modality's model is loaded and ready.
    pub async fn is_loaded(&self, modality: Modality) -> bool {
        match self.slot(modality) {
            Ok(slot) => matches!(&*slot.lock().await, ModelSlot::Ready(_)),
            Err(_) => false,
        }
    }

    fn slot(&self, modality: Modality) -> DetectResult<&Mutex<ModelSlot>> {
        self.slots
            .get(&modality)
            .ok_or_else(|| DetectError::ConfigError {
                message: format!("registry has no slot for modality '{modality}'"),
            })
    }

    /// Layered cold load: cache first, then the bundled asset with a
    /// best-effort cache write-back.
    async fn load(&self, modality: Modality) -> DetectResult<ModelHandle> {
        match self.cache.read(modality).await {
            Ok(Some(bytes)) => match DetectorHead::from_bytes(modality, &bytes) {
                Ok(head) => {
                    tracing::info!(modality = %modality, "model loaded from persistent cache");
                    return Ok(Arc::new(head));
                }
                Err(error) => {
                    tracing::warn!(
                        modality = %modality,
                        %error,
                        "cached model unusable, falling back to bundled asset"
                    );
                }
            },
            Ok(None) => {
                tracing::debug!(modality = %modality, "model cache miss");
            }
            Err(error) => {
                tracing::warn!(
                    modality = %modality,
                    %error,
                    "model cache unreadable, falling back to bundled asset"
                );
            }
        }

        let bytes = self.assets.read(modality).await?;
        let head = DetectorHead::from_bytes(modality, &bytes)
            .map_err(|e| DetectError::model_load(modality, e))?;

        // Write-back is best effort; a failed write must not fail the
        // acquisition.
        if let Err(error) = self.cache.write(modality, &bytes).await {
            tracing::warn!(modality = %modality, %error, "model cache write-back failed");
        }

        tracing::info!(modality = %modality, "model loaded from bundled asset");
        Ok(Arc::new(head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::save_head;

    /// Asset store wrapper that counts reads, for cold-load accounting.
    struct CountingAssets {
        inner: FsAssetStore,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl ModelAssetStore for CountingAssets {
        async fn read(&self, modality: Modality) -> DetectResult<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(modality).await
        }
    }

    fn provision_assets(dir: &std::path::Path) {
        for &modality in Modality::all() {
            let path = dir.join(asset_file_name(modality));
            save_head(&path, &[0.01; 32], 0.0).unwrap();
        }
    }

    fn registry_over(
        tmp: &tempfile::TempDir,
    ) -> (Arc<ModelRegistry>, Arc<CountingAssets>) {
        provision_assets(tmp.path());
        let assets = Arc::new(CountingAssets {
            inner: FsAssetStore::new(tmp.path()),
            reads: AtomicUsize::new(0),
        });
        let cache = Arc::new(FsCacheStore::new(tmp.path().join("cache")));
        let registry = Arc::new(ModelRegistry::new(cache, Arc::clone(&assets) as _));
        (registry, assets)
    }

    #[tokio::test]
    async fn test_sequential_acquires_trigger_one_cold_load() {
        let tmp = tempfile::tempdir().unwrap();
        let (registry, assets) = registry_over(&tmp);

        let first = registry.acquire(Modality::Audio).await.unwrap();
        for _ in 0..9 {
            let again = registry.acquire(Modality::Audio).await.unwrap();
            assert!(
                Arc::ptr_eq(&first, &again),
                "every acquire must return the same handle"
            );
        }
        assert_eq!(assets.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_acquires_do_not_duplicate_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let (registry, assets) = registry_over(&tmp);

        let mut joins = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            joins.push(tokio::spawn(async move {
                registry
                    .acquire(Modality::Image)
                    .await
                    .map(|h| Arc::as_ptr(&h) as *const () as usize)
            }));
        }
        let mut pointers = Vec::new();
        for join in joins {
            pointers.push(join.await.unwrap().unwrap());
        }
        pointers.dedup();
        assert_eq!(pointers.len(), 1, "all callers share one handle");
        assert_eq!(assets.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_modalities_load_independently() {
        let tmp = tempfile::tempdir().unwrap();
        let (registry, assets) = registry_over(&tmp);

        registry.acquire(Modality::Image).await.unwrap();
        registry.acquire(Modality::Text).await.unwrap();
        assert_eq!(assets.reads.load(Ordering::SeqCst), 2);
        assert!(registry.is_loaded(Modality::Image).await);
        assert!(!registry.is_loaded(Modality::Video).await);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_the_asset_store() {
        let tmp = tempfile::tempdir().unwrap();
        provision_assets(tmp.path());
        let cache: Arc<dyn ModelCacheStore> =
            Arc::new(FsCacheStore::new(tmp.path().join("cache")));

        // First registry cold-loads and writes the cache back.
        let assets = Arc::new(CountingAssets {
            inner: FsAssetStore::new(tmp.path()),
            reads: AtomicUsize::new(0),
        });
        let registry = ModelRegistry::new(Arc::clone(&cache), Arc::clone(&assets) as _);
        registry.acquire(Modality::Audio).await.unwrap();
        assert_eq!(assets.reads.load(Ordering::SeqCst), 1);

        // A fresh registry over the same stores finds the cached model.
        let assets2 = Arc::new(CountingAssets {
            inner: FsAssetStore::new(tmp.path()),
            reads: AtomicUsize::new(0),
        });
        let registry2 = ModelRegistry::new(cache, Arc::clone(&assets2) as _);
        registry2.acquire(Modality::Audio).await.unwrap();
        assert_eq!(assets2.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_asset_and_rewrites() {
        let tmp = tempfile::tempdir().unwrap();
        provision_assets(tmp.path());
        let cache_dir = tmp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("text.model"), b"garbage entry").unwrap();

        let assets = Arc::new(CountingAssets {
            inner: FsAssetStore::new(tmp.path()),
            reads: AtomicUsize::new(0),
        });
        let cache: Arc<dyn ModelCacheStore> = Arc::new(FsCacheStore::new(&cache_dir));
        let registry = ModelRegistry::new(Arc::clone(&cache), Arc::clone(&assets) as _);

        registry.acquire(Modality::Text).await.unwrap();
        assert_eq!(assets.reads.load(Ordering::SeqCst), 1);
        // The rewrite makes the next read a valid hit.
        assert!(cache.read(Modality::Text).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_asset_fails_and_failure_is_memoized() {
        let tmp = tempfile::tempdir().unwrap();
        // No assets provisioned at all.
        let assets = Arc::new(CountingAssets {
            inner: FsAssetStore::new(tmp.path()),
            reads: AtomicUsize::new(0),
        });
        let cache = Arc::new(FsCacheStore::new(tmp.path().join("cache")));
        let registry = ModelRegistry::new(cache, Arc::clone(&assets) as _);

        let first = registry.acquire(Modality::Video).await.err().unwrap();
        assert!(matches!(first, DetectError::ModelLoadError { .. }));

        let second = registry.acquire(Modality::Video).await.err().unwrap();
        assert!(matches!(second, DetectError::ModelLoadError { .. }));
        assert_eq!(
            assets.reads.load(Ordering::SeqCst),
            1,
            "a memoized failure must not reload"
        );
    }

    #[tokio::test]
    async fn test_preload_bypasses_the_stores() {
        use crate::model::{ModelHandle, ScoringModel};
        use lucidscan_core::FeatureTensor;

        struct FixedScore;
        impl ScoringModel for FixedScore {
            fn modality(&self) -> Modality {
                Modality::Image
            }
            fn score(&self, _tensor: &FeatureTensor) -> DetectResult<f32> {
                Ok(0.25)
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let (registry, assets) = registry_over(&tmp);
        let handle: ModelHandle = Arc::new(FixedScore);
        registry.preload(Arc::clone(&handle)).await;

        let acquired = registry.acquire(Modality::Image).await.unwrap();
        assert!(Arc::ptr_eq(&acquired, &handle));
        assert_eq!(assets.reads.load(Ordering::SeqCst), 0);
    }
}
