//! Error Level Analysis (ELA) diagnostics.
//!
//! ELA re-encodes an image with lossy JPEG compression and amplifies the
//! per-pixel difference against the original. Regions that were pasted,
//! repainted, or synthesized tend to recompress differently from their
//! surroundings, so the amplified difference image makes those
//! inconsistencies visible.
//!
//! The transform is a best-effort diagnostic for display only: it never
//! feeds the classifier and it never fails. When any step goes wrong the
//! caller gets the original image back unchanged.

mod ela;

pub use ela::{compute_ela, compute_ela_with_quality, DEFAULT_ELA_QUALITY};
