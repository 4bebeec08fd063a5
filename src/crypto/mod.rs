//! `hawk-auth` consumes its cryptographic primitives through the [`Cryptographer`] trait, so that
//! the HMAC, digest and random-number implementations can be provided by the backend of the
//! application's choice.
//!
//! With the default `use_ring` feature the `ring` backend is installed automatically on first use.
//! With `use_openssl` the application calls [`set_cryptographer`] once at startup, e.g.
//! `hawk_auth::crypto::set_cryptographer(&hawk_auth::crypto::OpensslCryptographer)`.

use crate::credentials::DigestAlgorithm;
use failure::Fail;

mod holder;
pub(crate) use holder::get_cryptographer;
pub use holder::{set_boxed_cryptographer, set_cryptographer, SetCryptographerError};

#[cfg(feature = "use_openssl")]
mod openssl;
#[cfg(feature = "use_openssl")]
pub use self::openssl::OpensslCryptographer;

#[cfg(feature = "use_ring")]
mod ring;
#[cfg(feature = "use_ring")]
pub use self::ring::RingCryptographer;

#[derive(Fail, Debug)]
pub enum CryptoError {
    /// The requested digest algorithm is not supported by this backend.
    #[fail(display = "Digest algorithm {:?} is unsupported by this Cryptographer", _0)]
    UnsupportedDigest(DigestAlgorithm),

    /// The backend failed in some other way.
    #[fail(display = "{}", _0)]
    Other(failure::Error),
}

/// A keyed HMAC, ready to sign.
pub trait HmacKey: Send + Sync + 'static {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// An in-progress digest.  `finish` may only be called once.
pub trait Hasher: Send + Sync + 'static {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;
    fn finish(&mut self) -> Result<Vec<u8>, CryptoError>;
}

pub trait Cryptographer: Send + Sync + 'static {
    /// Fill `output` from a cryptographically secure source.
    fn rand_bytes(&self, output: &mut [u8]) -> Result<(), CryptoError>;
    fn new_key(
        &self,
        algorithm: DigestAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn HmacKey>, CryptoError>;
    fn new_hasher(&self, algorithm: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError>;
    /// Compare two byte strings in time independent of their contents.
    fn constant_time_compare(&self, a: &[u8], b: &[u8]) -> bool;
}

pub(crate) fn rand_bytes(output: &mut [u8]) -> Result<(), CryptoError> {
    get_cryptographer().rand_bytes(output)
}

pub(crate) fn new_key(
    algorithm: DigestAlgorithm,
    key: &[u8],
) -> Result<Box<dyn HmacKey>, CryptoError> {
    get_cryptographer().new_key(algorithm, key)
}

pub(crate) fn new_hasher(algorithm: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError> {
    get_cryptographer().new_hasher(algorithm)
}

/// Compare two base64 MAC or hash strings without leaking timing information about where they
/// differ.
pub fn fixed_time_eq(a: &str, b: &str) -> bool {
    get_cryptographer().constant_time_compare(a.as_bytes(), b.as_bytes())
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod test {
    use super::*;

    #[test]
    fn test_fixed_time_eq() {
        assert!(fixed_time_eq("abc=", "abc="));
        assert!(!fixed_time_eq("abc=", "abd="));
        assert!(!fixed_time_eq("abc=", "abc"));
        assert!(fixed_time_eq("", ""));
    }

    #[test]
    fn test_rand_bytes_fills() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        rand_bytes(&mut a).unwrap();
        rand_bytes(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hmac_sha256_rfc4231_case_2() {
        let key = new_key(DigestAlgorithm::Sha256, b"Jefe").unwrap();
        let mac = key.sign(b"what do ya want for nothing?").unwrap();
        assert_eq!(
            mac,
            vec![
                0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
                0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
                0x64, 0xec, 0x38, 0x43,
            ]
        );
    }

    #[test]
    fn test_sha1_digest_length() {
        let mut hasher = new_hasher(DigestAlgorithm::Sha1).unwrap();
        hasher.update(b"abc").unwrap();
        assert_eq!(hasher.finish().unwrap().len(), 20);
    }
}
