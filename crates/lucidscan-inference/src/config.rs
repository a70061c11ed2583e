//! Pipeline configuration.
//!
//! # TOML Structure
//!
//! ```toml
//! [models]
//! assets_dir = "./assets/models"
//! cache_dir = "./cache/models"
//! vocab_file = "./assets/vocab/tokenizer.json"
//!
//! [limits]
//! decode_timeout_ms = 30000
//! max_media_bytes = 104857600
//! ```
//!
//! Invalid configuration returns an error; nothing is silently defaulted
//! after load. Environment variables (prefix `LUCIDSCAN_`) override file
//! values.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

// ============================================================================
// MODEL PATHS CONFIG
// ============================================================================

/// Locations of the bundled model assets and the persistent model cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPathsConfig {
    /// Directory holding the canonical bundled assets, one
    /// `<modality>_detector.safetensors` file per modality. Read-only.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Directory for the persistent model cache written after a cold
    /// load. Created on first write.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Optional tokenizer vocabulary for text extraction. When absent,
    /// tokens fall back to the deterministic first-character hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_file: Option<PathBuf>,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets/models")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache/models")
}

impl Default for ModelPathsConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            cache_dir: default_cache_dir(),
            vocab_file: None,
        }
    }
}

impl ModelPathsConfig {
    /// # Errors
    /// Returns [`DetectError::ConfigError`] when either directory is the
    /// empty path.
    pub fn validate(&self) -> DetectResult<()> {
        if self.assets_dir.as_os_str().is_empty() {
            return Err(DetectError::ConfigError {
                message: "assets_dir cannot be empty".to_string(),
            });
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(DetectError::ConfigError {
                message: "cache_dir cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// LIMITS CONFIG
// ============================================================================

/// Per-request resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Upper bound on a single decode or frame-seek wait, in
    /// milliseconds. An expired wait surfaces as a decode failure.
    #[serde(default = "default_decode_timeout_ms")]
    pub decode_timeout_ms: u64,

    /// Largest accepted media payload in bytes. Oversized submissions
    /// fail decode instead of being attempted.
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: usize,
}

fn default_decode_timeout_ms() -> u64 {
    30_000
}

fn default_max_media_bytes() -> usize {
    100 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            decode_timeout_ms: default_decode_timeout_ms(),
            max_media_bytes: default_max_media_bytes(),
        }
    }
}

impl LimitsConfig {
    /// # Errors
    /// Returns [`DetectError::ConfigError`] when either limit is zero.
    pub fn validate(&self) -> DetectResult<()> {
        if self.decode_timeout_ms == 0 {
            return Err(DetectError::ConfigError {
                message: "decode_timeout_ms must be > 0".to_string(),
            });
        }
        if self.max_media_bytes == 0 {
            return Err(DetectError::ConfigError {
                message: "max_media_bytes must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// ROOT DETECTOR CONFIG
// ============================================================================

/// Root configuration for the analysis pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Model asset and cache locations.
    #[serde(default)]
    pub models: ModelPathsConfig,

    /// Per-request limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl DetectorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`DetectError::ConfigError`] when the file cannot be read
    /// or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> DetectResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| DetectError::ConfigError {
            message: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns [`DetectError::ConfigError`] on parse failure.
    pub fn from_toml_str(toml: &str) -> DetectResult<Self> {
        toml::from_str(toml).map_err(|e| DetectError::ConfigError {
            message: format!("failed to parse TOML: {e}"),
        })
    }

    /// Validate all nested sections, returning the first error found.
    pub fn validate(&self) -> DetectResult<()> {
        self.models.validate().map_err(|e| DetectError::ConfigError {
            message: format!("[models] {e}"),
        })?;
        self.limits.validate().map_err(|e| DetectError::ConfigError {
            message: format!("[limits] {e}"),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides.
    ///
    /// | Variable | Config path |
    /// |----------|-------------|
    /// | `LUCIDSCAN_ASSETS_DIR` | `models.assets_dir` |
    /// | `LUCIDSCAN_CACHE_DIR` | `models.cache_dir` |
    /// | `LUCIDSCAN_VOCAB_FILE` | `models.vocab_file` |
    /// | `LUCIDSCAN_DECODE_TIMEOUT_MS` | `limits.decode_timeout_ms` |
    /// | `LUCIDSCAN_MAX_MEDIA_BYTES` | `limits.max_media_bytes` |
    ///
    /// Unparseable numeric values are ignored and the existing value is
    /// kept.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = env::var("LUCIDSCAN_ASSETS_DIR") {
            self.models.assets_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("LUCIDSCAN_CACHE_DIR") {
            self.models.cache_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("LUCIDSCAN_VOCAB_FILE") {
            self.models.vocab_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("LUCIDSCAN_DECODE_TIMEOUT_MS") {
            if let Ok(n) = val.parse::<u64>() {
                self.limits.decode_timeout_ms = n;
            }
        }
        if let Ok(val) = env::var("LUCIDSCAN_MAX_MEDIA_BYTES") {
            if let Ok(n) = val.parse::<usize>() {
                self.limits.max_media_bytes = n;
            }
        }
        self
    }
}
