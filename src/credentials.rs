use crate::error::{ClientError, ServerError};
use std::fmt;
use std::str::FromStr;

/// Digest algorithms understood by the cryptographic backends.
///
/// Hawk itself only accepts `Sha1` and `Sha256` (see [`SUPPORTED_ALGORITHMS`]); credentials
/// carrying any other algorithm are rejected before any MAC is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

/// The algorithms Hawk credentials may use.
pub const SUPPORTED_ALGORITHMS: [DigestAlgorithm; 2] =
    [DigestAlgorithm::Sha1, DigestAlgorithm::Sha256];

impl DigestAlgorithm {
    pub fn is_supported(self) -> bool {
        SUPPORTED_ALGORITHMS.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ClientError;
    fn from_str(s: &str) -> Result<Self, ClientError> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(ClientError::UnknownAlgorithm),
        }
    }
}

/// Hawk credentials: an ID, a key associated with that ID, and the digest algorithm agreed
/// between client and server.
///
/// Applications that attach their own data to credentials (a user record, scopes, ..) should
/// wrap this type and implement `AsRef<Credentials>` for the wrapper; the server functions
/// hand the wrapper back untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: String,
    pub key: Vec<u8>,
    pub algorithm: DigestAlgorithm,
}

impl Credentials {
    pub fn new<S, B>(id: S, key: B, algorithm: DigestAlgorithm) -> Credentials
    where
        S: Into<String>,
        B: Into<Vec<u8>>,
    {
        Credentials {
            id: id.into(),
            key: key.into(),
            algorithm,
        }
    }

    /// Check these credentials before signing with them.
    pub(crate) fn validate_for_client(&self) -> Result<(), ClientError> {
        if self.id.is_empty() || self.key.is_empty() {
            return Err(ClientError::InvalidCredentials);
        }
        if !self.algorithm.is_supported() {
            return Err(ClientError::UnknownAlgorithm);
        }
        Ok(())
    }

    /// Check credentials returned by an application lookup.  A failure here is the
    /// application's bug, not the remote party's, so it is an internal error.
    pub(crate) fn validate_for_server(&self) -> Result<(), ServerError> {
        if self.key.is_empty() {
            return Err(ServerError::Internal("Invalid credentials".to_string()));
        }
        if !self.algorithm.is_supported() {
            return Err(ServerError::Internal("Unknown algorithm".to_string()));
        }
        Ok(())
    }
}

impl AsRef<Credentials> for Credentials {
    fn as_ref(&self) -> &Credentials {
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!(
            DigestAlgorithm::from_str("sha1").unwrap(),
            DigestAlgorithm::Sha1
        );
        assert_eq!(
            DigestAlgorithm::from_str("SHA256").unwrap(),
            DigestAlgorithm::Sha256
        );
        assert!(DigestAlgorithm::from_str("hmac-sha-0").is_err());
    }

    #[test]
    fn test_supported() {
        assert!(DigestAlgorithm::Sha1.is_supported());
        assert!(DigestAlgorithm::Sha256.is_supported());
        assert!(!DigestAlgorithm::Sha384.is_supported());
        assert!(!DigestAlgorithm::Sha512.is_supported());
    }

    #[test]
    fn test_validate_for_client() {
        let ok = Credentials::new("123456", "2983d45yun89q", DigestAlgorithm::Sha1);
        assert!(ok.validate_for_client().is_ok());

        let no_id = Credentials::new("", "2983d45yun89q", DigestAlgorithm::Sha1);
        match no_id.validate_for_client() {
            Err(ClientError::InvalidCredentials) => {}
            r => panic!("unexpected {:?}", r),
        }

        let no_key = Credentials::new("123456", "", DigestAlgorithm::Sha1);
        match no_key.validate_for_client() {
            Err(ClientError::InvalidCredentials) => {}
            r => panic!("unexpected {:?}", r),
        }

        let bad_alg = Credentials::new("123456", "2983d45yun89q", DigestAlgorithm::Sha512);
        match bad_alg.validate_for_client() {
            Err(ClientError::UnknownAlgorithm) => {}
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn test_validate_for_server() {
        let no_key = Credentials::new("123456", "", DigestAlgorithm::Sha256);
        assert_eq!(
            no_key.validate_for_server(),
            Err(ServerError::Internal("Invalid credentials".to_string()))
        );
        let bad_alg = Credentials::new("123456", "key", DigestAlgorithm::Sha384);
        assert_eq!(
            bad_alg.validate_for_server(),
            Err(ServerError::Internal("Unknown algorithm".to_string()))
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials::new("me", "sekrit", DigestAlgorithm::Sha256);
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("me"));
        assert!(!dbg.contains("sekrit"));
    }
}
