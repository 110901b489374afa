//! Key material for the two encrypted surfaces and the integrity tag.
//!
//! Production builds compile the secrets in ([`EmbeddedKeys`]); anything
//! that can hand out the same shapes can stand in for it, which is how the
//! tests run against deterministic fixtures.

/// A 256-bit cipher key together with its 128-bit initialization vector.
#[derive(Clone, Copy)]
pub struct CipherMaterial {
    pub key: [u8; 32],
    pub iv: [u8; 16],
}

/// Source of the symmetric key material used by the trial store and the
/// activation-key codec.
pub trait KeyProvider: Send + Sync {
    /// Material for the encrypted trial-state file.
    fn trial_file_cipher(&self) -> CipherMaterial;

    /// Material for activation keys in transit. Distinct from the trial
    /// file's on purpose.
    fn activation_cipher(&self) -> CipherMaterial;

    /// Shared secret for the HMAC-SHA-256 integrity tag inside a key.
    fn integrity_secret(&self) -> [u8; 32];
}

/// Compiled-in key for the trial-state file (32 bytes).
const TRIAL_FILE_KEY: [u8; 32] = [
    47, 166, 78, 213, 9, 120, 35, 201, 250, 17, 88, 140, 62, 233, 105, 4,
    191, 54, 129, 222, 73, 12, 158, 97, 240, 31, 186, 66, 205, 148, 27, 112,
];

const TRIAL_FILE_IV: [u8; 16] = [
    133, 20, 246, 91, 58, 177, 6, 219, 164, 43, 230, 118, 85, 2, 199, 152,
];

/// Compiled-in key for activation keys (32 bytes).
const ACTIVATION_KEY: [u8; 32] = [
    216, 101, 39, 174, 5, 228, 146, 83, 252, 70, 127, 10, 195, 52, 237, 160,
    89, 18, 209, 134, 61, 243, 26, 108, 181, 44, 155, 76, 3, 224, 119, 202,
];

const ACTIVATION_IV: [u8; 16] = [
    72, 189, 34, 141, 253, 96, 15, 170, 51, 206, 123, 8, 231, 150, 67, 214,
];

/// Compiled-in HMAC secret (32 bytes).
const INTEGRITY_SECRET: [u8; 32] = [
    164, 29, 238, 87, 110, 1, 196, 53, 218, 143, 64, 251, 36, 173, 94, 7,
    225, 132, 59, 248, 21, 102, 215, 80, 159, 42, 235, 116, 13, 190, 71, 136,
];

/// The fixed production key material.
pub struct EmbeddedKeys;

impl KeyProvider for EmbeddedKeys {
    fn trial_file_cipher(&self) -> CipherMaterial {
        CipherMaterial { key: TRIAL_FILE_KEY, iv: TRIAL_FILE_IV }
    }

    fn activation_cipher(&self) -> CipherMaterial {
        CipherMaterial { key: ACTIVATION_KEY, iv: ACTIVATION_IV }
    }

    fn integrity_secret(&self) -> [u8; 32] {
        INTEGRITY_SECRET
    }
}
