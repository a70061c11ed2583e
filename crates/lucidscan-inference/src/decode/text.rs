//! Text decoding.
//!
//! Contract: the raw string is the decoded form; there is no binary
//! decode step beyond UTF-8 validation.

use lucidscan_core::Modality;

use crate::error::{DetectError, DetectResult};

pub(crate) fn decode_text(bytes: Vec<u8>) -> DetectResult<String> {
    String::from_utf8(bytes).map_err(|e| DetectError::decode(Modality::Text, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_utf8_passes_through() {
        let text = decode_text("Wie ein Mensch geschrieben.".as_bytes().to_vec()).unwrap();
        assert_eq!(text, "Wie ein Mensch geschrieben.");
    }

    #[test]
    fn test_decode_invalid_utf8_fails() {
        let result = decode_text(vec![0xff, 0xfe, 0x41]);
        assert!(matches!(result, Err(DetectError::DecodeError { .. })));
    }
}
