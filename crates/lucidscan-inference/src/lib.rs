//! Preprocessing and model-invocation core for lucidscan.
//!
//! This crate turns heterogeneous raw media into fixed-shape numeric
//! tensors, manages the per-modality classifier lifecycle, and runs
//! inference. The UI shell consumes it through one entry point:
//! submit raw media of a declared modality, receive a probability in
//! `[0, 100]` or a typed failure.
//!
//! # Architecture
//!
//! - [`decode`]: raw bytes to structured samples (pixel grid, PCM,
//!   frame source, UTF-8 string)
//! - [`extract`]: structured samples to the modality's contract tensor
//! - [`registry`]: load-once, process-lifetime scoring model cache over
//!   injectable persistent-cache and bundled-asset stores
//! - [`executor`]: tensor in, clamped percentage out, with scoped
//!   buffer ownership on every exit path
//! - [`service`]: the facade the UI talks to, including the ELA
//!   diagnostic surface
//!
//! # Pipeline flow
//!
//! ```text
//! RawMedia ──decode──▶ DecodedMedia ──extract──▶ FeatureTensor
//!                                                     │
//!                 ModelRegistry ──acquire──▶ ScoringModel
//!                                                     │
//!                                            InferenceExecutor
//!                                                     ▼
//!                                            ProbabilityScore
//! ```
//!
//! Within one request the stages run strictly in order; independent
//! requests interleave at await points. Decode and frame-seek waits are
//! bounded by the configured timeout.

pub mod config;
pub mod decode;
pub mod error;
pub mod executor;
pub mod extract;
pub mod model;
pub mod registry;
pub mod service;

pub use config::{DetectorConfig, LimitsConfig, ModelPathsConfig};
pub use decode::VideoBackend;
pub use error::{DetectError, DetectResult};
pub use executor::InferenceExecutor;
pub use model::{DetectorHead, ModelHandle, ScoringModel};
pub use registry::{FsAssetStore, FsCacheStore, ModelAssetStore, ModelCacheStore, ModelRegistry};
pub use service::AnalysisService;
