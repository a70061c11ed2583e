//! Core Modality enum and its contract accessors.

use serde::{Deserialize, Serialize};

/// Identifies one of the four media kinds the pipeline can score.
///
/// The modality is fixed when a request is created and selects the
/// decoder, the feature extractor, the tensor shape contract, and the
/// model registry key.
///
/// | Variant | Decoded form | Tensor contract |
/// |---------|--------------|-----------------|
/// | Image | pixel grid (native dims, 3/4 channels) | `[1, 224, 224, C]` |
/// | Video | seekable frame source | `[1, 10, 224, 224, 3]` |
/// | Audio | mono PCM + sample rate | `[1, 128, 128, 1]` |
/// | Text | UTF-8 string | `[1, 100]` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Modality {
    Image = 0,
    Video = 1,
    Audio = 2,
    Text = 3,
}

impl Modality {
    /// Returns all four modalities in dispatch order.
    #[must_use]
    pub const fn all() -> &'static [Modality] {
        &[Self::Image, Self::Video, Self::Audio, Self::Text]
    }

    /// Returns the string form used for registry keys, cache file names
    /// and configuration values.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
        }
    }

    /// Rank of the feature tensor produced for this modality.
    #[must_use]
    pub const fn tensor_rank(&self) -> usize {
        match self {
            Self::Image => 4,
            Self::Video => 5,
            Self::Audio => 4,
            Self::Text => 2,
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_lists_four_modalities_in_order() {
        let all = Modality::all();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], Modality::Image);
        assert_eq!(all[3], Modality::Text);
    }

    #[test]
    fn test_as_str_is_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for m in Modality::all() {
            let s = m.as_str();
            assert_eq!(s, s.to_lowercase());
            assert!(seen.insert(s), "duplicate name {s}");
        }
    }

    #[test]
    fn test_serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Modality::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        let back: Modality = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(back, Modality::Video);
    }

    #[test]
    fn test_tensor_rank_matches_contract() {
        assert_eq!(Modality::Image.tensor_rank(), 4);
        assert_eq!(Modality::Video.tensor_rank(), 5);
        assert_eq!(Modality::Audio.tensor_rank(), 4);
        assert_eq!(Modality::Text.tensor_rank(), 2);
    }
}
