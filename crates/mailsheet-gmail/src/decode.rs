use crate::GmailResult;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// URL-safe alphabet, padding optional on input
const WEB_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a Gmail body payload (web-safe base64, padded or not)
pub fn decode_web_safe(data: &str) -> GmailResult<Vec<u8>> {
    Ok(WEB_SAFE.decode(data.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GmailError;

    // "PK\x03\x04" zip header followed by bytes that hit '-' and '_'
    const RAW: &[u8] = &[0x50, 0x4b, 0x03, 0x04, 0xfb, 0xff, 0xbf];

    #[test]
    fn test_decodes_unpadded_and_padded() {
        assert_eq!(decode_web_safe("UEsDBPv_vw").unwrap(), RAW);
        assert_eq!(decode_web_safe("UEsDBPv_vw==").unwrap(), RAW);
    }

    #[test]
    fn test_rejects_standard_alphabet() {
        assert!(matches!(
            decode_web_safe("UEsDBPv/vw=="),
            Err(GmailError::DecodeError(_))
        ));
    }

    #[test]
    fn test_empty_payload() {
        assert!(decode_web_safe("").unwrap().is_empty());
    }
}
