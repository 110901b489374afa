//! The shared symmetric primitive: AES-256-CBC with PKCS#7 padding.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::LicenseError;
use crate::secrets::CipherMaterial;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

#[must_use]
pub fn encrypt(material: &CipherMaterial, plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(&material.key.into(), &material.iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// # Errors
/// Will return `Err` if the ciphertext is not a padded block sequence under
/// this key material.
pub fn decrypt(material: &CipherMaterial, ciphertext: &[u8]) -> Result<Vec<u8>, LicenseError> {
    Aes256CbcDec::new(&material.key.into(), &material.iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| LicenseError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> CipherMaterial {
        CipherMaterial { key: [7u8; 32], iv: [9u8; 16] }
    }

    #[test]
    fn round_trip() {
        let msg = b"FirstRunTime:2030-01-01 00:00:00";
        let ciphertext = encrypt(&material(), msg);
        assert_ne!(&ciphertext[..msg.len().min(ciphertext.len())], &msg[..]);
        assert_eq!(ciphertext.len() % 16, 0);

        let plaintext = decrypt(&material(), &ciphertext).unwrap();
        assert_eq!(plaintext, msg);
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let ciphertext = encrypt(&material(), b"some trial state");
        assert!(decrypt(&material(), &ciphertext[..ciphertext.len() - 1]).is_err());
    }
}
