//! Activation-key wire format and codec.
//!
//! A key is an 88-byte payload, AES-256-CBC encrypted and base64 encoded:
//!
//! | Offset | Length | Field                                          |
//! |--------|--------|------------------------------------------------|
//! | 0      | 8      | expiry, Unix seconds, little-endian i64        |
//! | 8      | 32     | target fingerprint, UTF-8, right-padded `'0'`  |
//! | 40     | 16     | random filler                                  |
//! | 56     | 32     | HMAC-SHA-256 over the hex text of bytes 0..56  |

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::trace;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::cipher;
use crate::error::LicenseError;
use crate::fingerprint::{FINGERPRINT_LEN, Fingerprint};
use crate::secrets::KeyProvider;

type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_LEN: usize = 8;
const FILLER_LEN: usize = 16;
const TAG_LEN: usize = 32;

/// Length of the signed prefix: timestamp + fingerprint + filler.
const SIGNED_LEN: usize = TIMESTAMP_LEN + FINGERPRINT_LEN + FILLER_LEN;

/// Total payload length before encryption.
const PAYLOAD_LEN: usize = SIGNED_LEN + TAG_LEN;

const FINGERPRINT_OFFSET: usize = TIMESTAMP_LEN;
const FILLER_OFFSET: usize = FINGERPRINT_OFFSET + FINGERPRINT_LEN;

/// Encodes and verifies activation keys. The encode direction runs on the
/// issuer's side only; both directions share the wire format above.
pub struct KeyCodec {
    keys: Arc<dyn KeyProvider>,
}

impl KeyCodec {
    #[must_use]
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self { keys }
    }

    /// Issue a key binding `target` to an expiry instant. The filler is
    /// fresh per call, so two keys for identical inputs never collide.
    #[must_use]
    pub fn encode(&self, target: &Fingerprint, expires_at: DateTime<Utc>) -> String {
        let mut payload = [0u8; PAYLOAD_LEN];

        payload[..TIMESTAMP_LEN].copy_from_slice(&expires_at.timestamp().to_le_bytes());
        payload[FINGERPRINT_OFFSET..FILLER_OFFSET].copy_from_slice(&padded_fingerprint(target));
        OsRng.fill_bytes(&mut payload[FILLER_OFFSET..SIGNED_LEN]);

        let tag = integrity_tag(&self.keys.integrity_secret(), &payload[..SIGNED_LEN]);
        payload[SIGNED_LEN..].copy_from_slice(&tag);

        BASE64.encode(cipher::encrypt(&self.keys.activation_cipher(), &payload))
    }

    /// Decode a candidate key and verify it against the given machine
    /// fingerprint and the current clock.
    ///
    /// # Errors
    /// Will return `Err` with the failing check's kind; callers surface all
    /// kinds to the end user as one "invalid or expired" outcome.
    pub fn verify(&self, candidate: &str, machine: &Fingerprint) -> Result<DateTime<Utc>, LicenseError> {
        let Ok(ciphertext) = BASE64.decode(candidate.trim()) else {
            trace!("Key Base64 Decode Failed");
            return Err(LicenseError::Decode);
        };

        let Ok(payload) = cipher::decrypt(&self.keys.activation_cipher(), &ciphertext) else {
            trace!("Key Decrypt Failed");
            return Err(LicenseError::Decode);
        };

        if payload.len() < PAYLOAD_LEN {
            trace!("Key Payload Undersized");
            return Err(LicenseError::Decode);
        }

        let expected_tag = integrity_tag(&self.keys.integrity_secret(), &payload[..SIGNED_LEN]);
        if !bool::from(expected_tag.ct_eq(&payload[SIGNED_LEN..PAYLOAD_LEN])) {
            trace!("Key Integrity Tag Mismatch");
            return Err(LicenseError::Integrity);
        }

        if payload[FINGERPRINT_OFFSET..FILLER_OFFSET] != padded_fingerprint(machine) {
            trace!("Key Bound to Different Fingerprint");
            return Err(LicenseError::HardwareMismatch);
        }

        let mut seconds = [0u8; TIMESTAMP_LEN];
        seconds.copy_from_slice(&payload[..TIMESTAMP_LEN]);

        let Some(expires_at) = DateTime::from_timestamp(i64::from_le_bytes(seconds), 0) else {
            trace!("Key Timestamp Out of Range");
            return Err(LicenseError::Decode);
        };

        if expires_at <= Utc::now() {
            trace!("Key Expired At {expires_at}");
            return Err(LicenseError::Expired);
        }

        Ok(expires_at)
    }
}

fn padded_fingerprint(fingerprint: &Fingerprint) -> [u8; FINGERPRINT_LEN] {
    let mut field = [b'0'; FINGERPRINT_LEN];
    let bytes = fingerprint.as_str().as_bytes();
    let len = bytes.len().min(FINGERPRINT_LEN);

    field[..len].copy_from_slice(&bytes[..len]);
    field
}

fn integrity_tag(secret: &[u8; 32], signed: &[u8]) -> [u8; TAG_LEN] {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(hex::encode_upper(signed).as_bytes());
    mac.finalize().into_bytes().into()
}
