//! This module contains basic base64 functionality as used in Hawk: standard padded base64 for
//! MACs and hashes, and unpadded base64url for bewits and nonces.

/// Encode with the standard alphabet, including padding.
pub(crate) fn encode<T: AsRef<[u8]>>(data: T) -> String {
    base64::encode_config(data.as_ref(), base64::STANDARD)
}

/// Encode `data` as base64url (RFC 4648 §5) without padding.
pub fn base64url_encode<T: AsRef<[u8]>>(data: T) -> String {
    base64::encode_config(data.as_ref(), base64::URL_SAFE_NO_PAD)
}

/// Decode base64url, tolerating missing padding.  Any character outside `[A-Za-z0-9_-]` is
/// rejected, including `=`.
pub fn base64url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if let Some((offset, c)) = data
        .bytes()
        .enumerate()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == b'-' || *c == b'_'))
    {
        return Err(base64::DecodeError::InvalidByte(offset, c));
    }
    base64::decode_config(data, base64::URL_SAFE_NO_PAD)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_standard() {
        assert_eq!(encode(&[1u8, 2, 3, 4]), "AQIDBA==");
    }

    #[test]
    fn test_url_encode_no_padding() {
        assert_eq!(base64url_encode(&[0xfbu8, 0xff]), "-_8");
        assert_eq!(base64url_encode("123456\\1353832834\\"), "MTIzNDU2XDEzNTM4MzI4MzRc");
    }

    #[test]
    fn test_url_decode_unpadded() {
        assert_eq!(base64url_decode("-_8").unwrap(), vec![0xfbu8, 0xff]);
        assert_eq!(base64url_decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_url_decode_rejects_foreign_characters() {
        assert!(base64url_decode("|MTIz").is_err());
        assert!(base64url_decode("AQIDBA==").is_err());
        assert!(base64url_decode("a+b/").is_err());
    }
}
