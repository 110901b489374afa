use thiserror::Error;

#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("Activation Key Decode Failed")]
    Decode,
    #[error("Activation Key Integrity Check Failed")]
    Integrity,
    #[error("Activation Key Bound to Different Hardware")]
    HardwareMismatch,
    #[error("Activation Key Expired")]
    Expired,
    #[error("Invalid Fingerprint String")]
    InvalidFingerprint,
    #[error("Trial State IO: {0}")]
    Io(#[from] std::io::Error),
}
