//! Probability score newtype.

use serde::{Deserialize, Serialize};

/// Probability that the analyzed content is machine-generated, as a
/// percentage clamped to `[0, 100]`.
///
/// This is the only value returned to callers on a successful analysis.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ProbabilityScore(f32);

impl ProbabilityScore {
    /// Clamp a percentage into `[0, 100]`.
    #[must_use]
    pub fn new(percent: f32) -> Self {
        Self(percent.clamp(0.0, 100.0))
    }

    /// Convert a raw classifier probability in `[0, 1]` to a percentage.
    #[must_use]
    pub fn from_unit(probability: f32) -> Self {
        Self::new(probability * 100.0)
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl std::fmt::Display for ProbabilityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}
