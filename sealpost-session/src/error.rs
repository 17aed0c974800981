//! Session error types.

use sealpost_crypto::CryptoError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur in session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is locked")]
    Locked,

    #[error("session has ended")]
    SessionEnded,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("background task failed: {0}")]
    TaskFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Text safe to show an end user.
    ///
    /// Authentication and decryption failures collapse into one message so
    /// the UI cannot reveal whether the password or the data was at fault.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Crypto(
                CryptoError::WrongPasswordOrCorruptData
                | CryptoError::DecryptionFailed
                | CryptoError::MalformedSealedKey(_),
            ) => "incorrect password or corrupted data",
            Self::Crypto(CryptoError::PayloadTooLarge { .. }) => "message is too long",
            Self::Crypto(CryptoError::MalformedKey(_) | CryptoError::UnsupportedKey(_)) => {
                "recipient key is invalid"
            }
            Self::Locked | Self::SessionEnded => "please log in again",
            Self::Crypto(_) | Self::TaskFailed(_) | Self::Config(_) => "something went wrong",
        }
    }
}
