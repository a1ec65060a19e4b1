use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("signing failed: {0}")]
    Signing(String),
}
