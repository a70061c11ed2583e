//! Text feature extraction.
//!
//! Lower-cases the input, splits on whitespace, and keeps at most the
//! first [`TEXT_SEQUENCE_LEN`] tokens. Each token maps to an integer
//! index through the configured vocabulary; without one (or for tokens
//! the vocabulary does not know) the index falls back to a
//! deterministic hash of the token's first character modulo
//! [`TEXT_HASH_BUCKETS`]. Indices are left-aligned into a fixed-length
//! array with zero padding; longer inputs truncate, never erroring.
//! Output shape `[1, 100]`.

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use lucidscan_core::shapes::{TEXT_HASH_BUCKETS, TEXT_SEQUENCE_LEN};
use lucidscan_core::{FeatureTensor, Modality};

use crate::error::{DetectError, DetectResult};
use crate::extract::image::contract_violation;

pub(crate) fn extract_text(
    text: &str,
    vocab: Option<&Tokenizer>,
) -> DetectResult<FeatureTensor> {
    let lowered = text.to_lowercase();
    let mut indices = vec![0u32; TEXT_SEQUENCE_LEN];
    let mut used = 0usize;
    for (slot, token) in indices
        .iter_mut()
        .zip(lowered.split_whitespace().take(TEXT_SEQUENCE_LEN))
    {
        *slot = token_index(token, vocab);
        used += 1;
    }
    tracing::trace!(tokens = used, "text tokenized");

    let tensor = Tensor::from_vec(indices, (1, TEXT_SEQUENCE_LEN), &Device::Cpu)
        .map_err(|e| DetectError::tensor("token tensor build", e))?;
    FeatureTensor::new(Modality::Text, tensor).map_err(contract_violation)
}

fn token_index(token: &str, vocab: Option<&Tokenizer>) -> u32 {
    if let Some(id) = vocab.and_then(|v| v.token_to_id(token)) {
        return id;
    }
    token
        .chars()
        .next()
        .map_or(0, |c| c as u32 % TEXT_HASH_BUCKETS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn indices_of(text: &str) -> Vec<u32> {
        let tensor = extract_text(text, None).unwrap();
        tensor
            .inner()
            .flatten_all()
            .unwrap()
            .to_vec1::<u32>()
            .unwrap()
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_long_input_truncates_to_first_hundred_tokens() {
        let text = (0..250).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let indices = indices_of(&text);
        assert_eq!(indices.len(), 100);
        // "w" is 119; every kept slot hashes the same first character.
        assert!(indices.iter().all(|&i| i == u32::from(b'w')));
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_short_input_zero_pads_remaining_positions() {
        let indices = indices_of("alpha beta gamma delta epsilon");
        assert_eq!(indices.len(), 100);
        assert!(indices[..5].iter().all(|&i| i != 0));
        assert!(indices[5..].iter().all(|&i| i == 0));
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_empty_input_is_all_padding() {
        let indices = indices_of("");
        assert!(indices.iter().all(|&i| i == 0));
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_tokenization_is_case_insensitive() {
        assert_eq!(indices_of("Hello WORLD"), indices_of("hello world"));
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_fallback_hash_is_first_char_mod_buckets() {
        // Lower-cased first char is U+0436 (1078), wrapping to 78 under
        // the 1000-bucket hash.
        let indices = indices_of("Жук");
        assert_eq!(indices[0], 1078 % TEXT_HASH_BUCKETS);
    }

    #[test]
    #[serial(buffer_gauge)]
    fn test_whitespace_runs_collapse() {
        let indices = indices_of("  a \t b \n c  ");
        assert!(indices[..3].iter().all(|&i| i != 0));
        assert!(indices[3..].iter().all(|&i| i == 0));
    }
}
