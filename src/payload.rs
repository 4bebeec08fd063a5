use crate::b64;
use crate::credentials::DigestAlgorithm;
use crate::crypto::{self, CryptoError, Hasher};
use crate::mac::HEADER_VERSION;

/// Reduce a `Content-Type` header value to the form that is hashed: the media type alone,
/// trimmed and lower-cased.  `text/plain; charset=utf-8` becomes `text/plain`.
pub fn parse_content_type(content_type: Option<&str>) -> String {
    match content_type {
        Some(ct) => ct
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase(),
        None => String::new(),
    }
}

/// A utility for hashing payloads. Feed your entity body to this, then pass the `finish`
/// result to a request or response.
pub struct PayloadHasher {
    hasher: Box<dyn Hasher>,
}

impl PayloadHasher {
    /// Create a new PayloadHasher. The `content_type` may include parameters; they are stripped
    /// before hashing.  The algorithm should be that of the credentials in use.
    pub fn new(
        content_type: Option<&str>,
        algorithm: DigestAlgorithm,
    ) -> Result<Self, CryptoError> {
        let mut hasher = PayloadHasher {
            hasher: crypto::new_hasher(algorithm)?,
        };
        hasher.update(format!("hawk.{}.payload\n", HEADER_VERSION))?;
        hasher.update(parse_content_type(content_type))?;
        hasher.update("\n")?;
        Ok(hasher)
    }

    /// Hash a single value and return it
    pub fn hash<B: AsRef<[u8]>>(
        content_type: Option<&str>,
        algorithm: DigestAlgorithm,
        payload: B,
    ) -> Result<String, CryptoError> {
        let mut hasher = PayloadHasher::new(content_type, algorithm)?;
        hasher.update(payload)?;
        hasher.finish()
    }

    /// Update the hash with new data.
    pub fn update<B: AsRef<[u8]>>(&mut self, data: B) -> Result<(), CryptoError> {
        self.hasher.update(data.as_ref())
    }

    /// Finish hashing and return the base64 result.
    pub fn finish(mut self) -> Result<String, CryptoError> {
        self.hasher.update(b"\n")?;
        Ok(b64::encode(&self.hasher.finish()?))
    }
}

/// Hash a complete payload.  An empty payload still produces a hash.
pub fn payload_hash(
    payload: &[u8],
    algorithm: DigestAlgorithm,
    content_type: Option<&str>,
) -> Result<String, CryptoError> {
    PayloadHasher::hash(content_type, algorithm, payload)
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_content_type() {
        assert_eq!(parse_content_type(None), "");
        assert_eq!(parse_content_type(Some("text/plain")), "text/plain");
        assert_eq!(
            parse_content_type(Some(" Text/Plain ; charset=utf-8")),
            "text/plain"
        );
        assert_eq!(parse_content_type(Some("")), "");
    }

    #[test]
    fn hash_consistency() {
        let mut hasher1 = PayloadHasher::new(Some("text/plain"), DigestAlgorithm::Sha256).unwrap();
        hasher1.update("pay").unwrap();
        hasher1.update("load").unwrap();
        let hash1 = hasher1.finish().unwrap();

        let mut hasher2 = PayloadHasher::new(Some("text/plain"), DigestAlgorithm::Sha256).unwrap();
        hasher2.update("payload").unwrap();
        let hash2 = hasher2.finish().unwrap();

        let hash3 =
            PayloadHasher::hash(Some("text/plain"), DigestAlgorithm::Sha256, "payload").unwrap();

        assert_eq!(hash1, "XhAS2NNB0dCz3E04dKJH9NYKBwOcfcqu/18qQo5zZmU=");
        assert_eq!(hash2, hash1);
        assert_eq!(hash3, hash1);
    }

    #[test]
    fn test_payload_hash_known_values() {
        assert_eq!(
            payload_hash(b"something to write about", DigestAlgorithm::Sha1, None).unwrap(),
            "bsvY3IfUllw6V5rvk4tStEvpBhE="
        );
        assert_eq!(
            payload_hash(
                b"something to write about",
                DigestAlgorithm::Sha256,
                Some("text/plain")
            )
            .unwrap(),
            "2QfCt3GuY9HQnHWyWD3wX68ZOKbynqlfYmuO2ZBRqtY="
        );
        assert_eq!(
            payload_hash(b"payload", DigestAlgorithm::Sha1, Some("text/plain")).unwrap(),
            "rns7hvESyI8RXxq/RQ5nb/HrYBw="
        );
    }

    #[test]
    fn test_payload_hash_empty() {
        assert_eq!(
            payload_hash(b"", DigestAlgorithm::Sha256, Some("text/plain")).unwrap(),
            "q/t+NNAkQZNlq/aAD6PlexImwQTxwgT2MahfTa9XRLA="
        );
    }

    #[test]
    fn test_payload_hash_ignores_parameters() {
        assert_eq!(
            payload_hash(b"payload", DigestAlgorithm::Sha256, Some("TEXT/plain; charset=utf-8"))
                .unwrap(),
            payload_hash(b"payload", DigestAlgorithm::Sha256, Some("text/plain")).unwrap()
        );
    }
}
