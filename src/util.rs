use crate::b64;
use crate::crypto::{self, CryptoError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of generated nonces, in characters.
const NONCE_LENGTH: usize = 6;

/// The current time in milliseconds since the epoch, shifted by `localtime_offset_msec`.  The
/// offset lets callers correct for known clock skew; it is never learned or stored here.
pub fn now(localtime_offset_msec: i64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i128;
    let shifted = now + i128::from(localtime_offset_msec);
    if shifted < 0 {
        0
    } else {
        shifted as u64
    }
}

/// Like [`now`], in whole seconds (rounded down).
pub fn now_secs(localtime_offset_msec: i64) -> u64 {
    now(localtime_offset_msec) / 1000
}

/// Create a random nonce: the base64url form of random bytes, cut to six characters.
pub(crate) fn random_nonce() -> Result<String, CryptoError> {
    let mut bytes = [0u8; NONCE_LENGTH];
    crypto::rand_bytes(&mut bytes)?;
    let mut nonce = b64::base64url_encode(&bytes);
    nonce.truncate(NONCE_LENGTH);
    Ok(nonce)
}
