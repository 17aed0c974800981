//! Error types for key custody and message encryption.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors produced by the codec, vault and message cipher.
///
/// Variants that depend on secret material (`WrongPasswordOrCorruptData`,
/// `DecryptionFailed`) deliberately carry no detail.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("malformed sealed key: {0}")]
    MalformedSealedKey(String),

    #[error("incorrect password or corrupted data")]
    WrongPasswordOrCorruptData,

    #[error("payload too large: {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
