//! Shared data model for the lucidscan content-authenticity pipeline.
//!
//! This crate defines the types that flow between the pipeline stages
//! (decode, extract, infer) and the forensic tooling:
//!
//! - **Modality**: closed enum over the four supported media kinds
//! - **PixelGrid / AudioClip / DecodedMedia**: decoded sample forms
//! - **FrameSource**: seekable video frame capture contract
//! - **FeatureTensor**: fixed-shape numeric input to the classifier,
//!   tracked by the live-buffer gauge for resource-leak verification
//! - **ProbabilityScore**: the scalar inference result in [0, 100]
//!
//! The shape contracts in [`shapes`] are fixed per modality: extractors
//! resize, pad, or truncate so that a `FeatureTensor` never carries a
//! variable shape downstream.

pub mod error;
pub mod gauge;
pub mod media;
pub mod modality;
pub mod score;
pub mod shapes;
pub mod tensor;

pub use error::{CoreError, CoreResult};
pub use media::{AudioClip, DecodedMedia, FrameSource, PixelGrid};
pub use modality::Modality;
pub use score::ProbabilityScore;
pub use tensor::FeatureTensor;
