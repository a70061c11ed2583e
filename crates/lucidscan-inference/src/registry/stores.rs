//! Storage backends for the model registry.
//!
//! The registry is constructed over two injectable stores: a writable
//! persistent cache consulted first, and the read-only bundled assets
//! used as the cold-load fallback. Both are keyed by modality name.

use std::path::PathBuf;

use async_trait::async_trait;
use xxhash_rust::xxh64::xxh64;

use lucidscan_core::Modality;

use crate::error::{DetectError, DetectResult};

/// Writable key-value store for serialized models, keyed by modality.
///
/// Contract: `read` returns the last value written for the key, or a
/// miss. A corrupt entry is reported as a miss, never an error; the
/// registry falls back to the bundled asset and rewrites the entry.
#[async_trait]
pub trait ModelCacheStore: Send + Sync {
    /// Read the cached payload for `modality`, if any.
    async fn read(&self, modality: Modality) -> DetectResult<Option<Vec<u8>>>;

    /// Persist `payload` for `modality`, replacing any previous value.
    async fn write(&self, modality: Modality, payload: &[u8]) -> DetectResult<()>;
}

/// Read-only source of the canonical bundled model for each modality.
#[async_trait]
pub trait ModelAssetStore: Send + Sync {
    /// Read the bundled payload for `modality`.
    async fn read(&self, modality: Modality) -> DetectResult<Vec<u8>>;
}

// ============================================================================
// FILESYSTEM CACHE STORE
// ============================================================================

/// Entry framing: magic, xxh64 of the payload, then the payload. A
/// checksum mismatch or short file reads as a miss.
const CACHE_MAGIC: &[u8; 4] = b"LSC1";
const CACHE_HEADER_LEN: usize = CACHE_MAGIC.len() + 8;

/// File-per-modality persistent cache under a configurable directory.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, modality: Modality) -> PathBuf {
        self.dir.join(format!("{}.model", modality.as_str()))
    }

    fn decode_entry(bytes: &[u8]) -> Option<Vec<u8>> {
        if bytes.len() < CACHE_HEADER_LEN || &bytes[..CACHE_MAGIC.len()] != CACHE_MAGIC {
            return None;
        }
        let mut checksum = [0u8; 8];
        checksum.copy_from_slice(&bytes[CACHE_MAGIC.len()..CACHE_HEADER_LEN]);
        let payload = &bytes[CACHE_HEADER_LEN..];
        if xxh64(payload, 0) != u64::from_le_bytes(checksum) {
            return None;
        }
        Some(payload.to_vec())
    }

    fn encode_entry(payload: &[u8]) -> Vec<u8> {
        let mut framed = Vec::with_capacity(CACHE_HEADER_LEN + payload.len());
        framed.extend_from_slice(CACHE_MAGIC);
        framed.extend_from_slice(&xxh64(payload, 0).to_le_bytes());
        framed.extend_from_slice(payload);
        framed
    }
}

#[async_trait]
impl ModelCacheStore for FsCacheStore {
    async fn read(&self, modality: Modality) -> DetectResult<Option<Vec<u8>>> {
        let path = self.entry_path(modality);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DetectError::IoError(e)),
        };
        match Self::decode_entry(&bytes) {
            Some(payload) => Ok(Some(payload)),
            None => {
                tracing::warn!(
                    modality = %modality,
                    path = %path.display(),
                    "cache entry corrupt, treating as miss"
                );
                Ok(None)
            }
        }
    }

    async fn write(&self, modality: Modality, payload: &[u8]) -> DetectResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(modality);
        // Write-then-rename keeps readers from observing partial entries.
        let staging = path.with_extension("model.tmp");
        tokio::fs::write(&staging, Self::encode_entry(payload)).await?;
        tokio::fs::rename(&staging, &path).await?;
        tracing::info!(modality = %modality, path = %path.display(), "model cached");
        Ok(())
    }
}

// ============================================================================
// FILESYSTEM ASSET STORE
// ============================================================================

/// Bundled assets laid out as `<dir>/<modality>_detector.safetensors`.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    dir: PathBuf,
}

impl FsAssetStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Canonical asset path for a modality.
    #[must_use]
    pub fn asset_path(&self, modality: Modality) -> PathBuf {
        self.dir
            .join(format!("{}_detector.safetensors", modality.as_str()))
    }
}

/// File name helper shared with tooling that provisions asset dirs.
#[must_use]
pub fn asset_file_name(modality: Modality) -> String {
    format!("{}_detector.safetensors", modality.as_str())
}

#[async_trait]
impl ModelAssetStore for FsAssetStore {
    async fn read(&self, modality: Modality) -> DetectResult<Vec<u8>> {
        let path = self.asset_path(modality);
        tokio::fs::read(&path).await.map_err(|e| {
            DetectError::model_load(
                modality,
                std::io::Error::new(
                    e.kind(),
                    format!("bundled asset '{}' unreadable: {e}", path.display()),
                ),
            )
        })
    }
}
