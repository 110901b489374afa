//! Shared fixtures for the core tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use trialock_core::fingerprint::Fingerprint;
use trialock_core::key::KeyCodec;
use trialock_core::secrets::{CipherMaterial, KeyProvider};
use trialock_core::store::TrialStore;

/// Deterministic key material, unrelated to the embedded production keys.
pub struct FixtureKeys;

impl KeyProvider for FixtureKeys {
    fn trial_file_cipher(&self) -> CipherMaterial {
        CipherMaterial { key: [0x11; 32], iv: [0x22; 16] }
    }

    fn activation_cipher(&self) -> CipherMaterial {
        CipherMaterial { key: [0x33; 32], iv: [0x44; 16] }
    }

    fn integrity_secret(&self) -> [u8; 32] {
        [0x55; 32]
    }
}

/// A second, entirely different set of key material.
pub struct ForeignKeys;

impl KeyProvider for ForeignKeys {
    fn trial_file_cipher(&self) -> CipherMaterial {
        CipherMaterial { key: [0x66; 32], iv: [0x77; 16] }
    }

    fn activation_cipher(&self) -> CipherMaterial {
        CipherMaterial { key: [0x88; 32], iv: [0x99; 16] }
    }

    fn integrity_secret(&self) -> [u8; 32] {
        [0xAA; 32]
    }
}

/// Same ciphers as [`FixtureKeys`] but a different integrity secret, so
/// decryption succeeds and only the tag check can fail.
pub struct WrongMacKeys;

impl KeyProvider for WrongMacKeys {
    fn trial_file_cipher(&self) -> CipherMaterial {
        FixtureKeys.trial_file_cipher()
    }

    fn activation_cipher(&self) -> CipherMaterial {
        FixtureKeys.activation_cipher()
    }

    fn integrity_secret(&self) -> [u8; 32] {
        [0xBB; 32]
    }
}

pub fn fixture_keys() -> Arc<dyn KeyProvider> {
    Arc::new(FixtureKeys)
}

pub fn codec() -> KeyCodec {
    KeyCodec::new(fixture_keys())
}

pub fn temp_store(dir: &TempDir) -> TrialStore {
    TrialStore::new(dir.path().join("trial.dat"), fixture_keys())
}

pub fn fingerprint(hex32: &str) -> Fingerprint {
    Fingerprint::parse(hex32).unwrap()
}

pub fn fingerprint_a() -> Fingerprint {
    fingerprint("00112233445566778899AABBCCDDEEFF")
}

pub fn fingerprint_b() -> Fingerprint {
    fingerprint("FFEEDDCCBBAA99887766554433221100")
}

/// A timestamp with whole-second precision, as embedded in keys and in the
/// trial file.
pub fn at_seconds(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap()
}

pub fn days_from_now(days: i64) -> DateTime<Utc> {
    at_seconds(Utc::now().timestamp() + days * 86_400)
}
