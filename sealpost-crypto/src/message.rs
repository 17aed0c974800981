//! Per-message encryption with the recipient's public key.
//!
//! Messages are encrypted directly with RSA-OAEP (SHA-256 digest and MGF1),
//! so each one is bounded by the OAEP payload limit: 190 bytes of UTF-8 for
//! a 2048-bit key. Oversized messages are rejected, never truncated.

use crate::error::{CryptoError, CryptoResult};
use crate::types::{InboxEntry, InboxPlaintext, MessageEnvelope};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

/// Output size of the OAEP hash.
const OAEP_HASH_LEN: usize = 32;

/// Largest plaintext, in bytes, that fits one OAEP block for `key`.
pub fn max_plaintext_len(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(2 * OAEP_HASH_LEN + 2)
}

/// Encrypts `plaintext` for the holder of `recipient`'s private key.
/// Returns base64 ciphertext.
pub fn encrypt_message(plaintext: &str, recipient: &RsaPublicKey) -> CryptoResult<String> {
    let bytes = plaintext.as_bytes();
    let max = max_plaintext_len(recipient);
    if bytes.len() > max {
        return Err(CryptoError::PayloadTooLarge {
            len: bytes.len(),
            max,
        });
    }

    let ciphertext = recipient
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), bytes)
        .map_err(|e| CryptoError::Encryption(format!("RSA-OAEP encryption failed: {e}")))?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypts base64 ciphertext produced by [`encrypt_message`].
///
/// Every failure, whether bad base64, wrong key, padding or invalid
/// UTF-8, surfaces as the same `DecryptionFailed`.
pub fn decrypt_message(ciphertext_b64: &str, owner: &RsaPrivateKey) -> CryptoResult<String> {
    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let plaintext = owner
        .decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
}

/// Decrypts one envelope into an inbox entry, absorbing the failure.
pub fn open_envelope(envelope: MessageEnvelope, owner: &RsaPrivateKey) -> InboxEntry {
    let plaintext = match decrypt_message(&envelope.encrypted_content, owner) {
        Ok(text) => InboxPlaintext::Decrypted(text),
        Err(_) => InboxPlaintext::Failed,
    };
    InboxEntry {
        envelope,
        plaintext,
    }
}

/// Decrypts every envelope independently, preserving order.
///
/// An envelope that fails to decrypt yields [`InboxPlaintext::Failed`]
/// instead of aborting the batch. Callers log the batch outcome.
pub fn decrypt_inbox(envelopes: Vec<MessageEnvelope>, owner: &RsaPrivateKey) -> Vec<InboxEntry> {
    envelopes
        .into_iter()
        .map(|envelope| open_envelope(envelope, owner))
        .collect()
}

