//! Key custody and message encryption for Sealpost.
//!
//! The server only ever stores ciphertext and public keys. This crate
//! holds everything that touches plaintext or private keys:
//!
//! - **Keys**: RSA-2048 identity key pairs, encoded as base64 SPKI (public)
//!   and base64 PKCS#8 (private).
//! - **Vault**: seals the private key under a password-derived key
//!   (PBKDF2-HMAC-SHA256 → AES-256-GCM) for storage outside the client.
//! - **Message**: RSA-OAEP encryption of each message to the recipient,
//!   and partial-failure bulk decryption of an inbox.
//!
//! # Flow
//!
//! 1. Registration: [`create_identity`] produces a [`RegistrationRecord`]
//!    with the public key in the clear and the private key sealed.
//! 2. Session start: [`PasswordVault::unseal_key`] recovers the private key
//!    from the stored [`SealedPrivateKey`].
//! 3. Messaging: [`encrypt_message`] under a counterparty's public key,
//!    [`decrypt_inbox`] under the owner's private key.

mod cipher;
mod error;
pub mod identity;
pub mod kdf;
pub mod keys;
pub mod message;
pub mod types;
pub mod vault;

pub use cipher::{EncryptedData, NONCE_SIZE, TAG_SIZE, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
pub use identity::{NewIdentity, create_identity};
pub use kdf::{DerivedKey, KEY_SIZE, KdfHash, KdfParams, SALT_SIZE, Salt, derive_key};
pub use keys::{
    EncodedPrivateKey, EncodedPublicKey, KeyPair, RSA_MODULUS_BITS, decode_private,
    decode_public, encode_private, encode_public, generate_key_pair,
};
pub use message::{decrypt_inbox, decrypt_message, encrypt_message, max_plaintext_len, open_envelope};
pub use types::{
    AccountRecord, DECRYPTION_FAILED_PLACEHOLDER, InboxEntry, InboxPlaintext, MessageEnvelope,
    OutboundMessage, PrivateKeyRecord, PublicKeyRecord, RegistrationRecord, conversation_with,
};
pub use vault::{PasswordVault, SealedPrivateKey, VaultConfig};

/// Re-exported so callers can name key types without depending on `rsa`.
pub use rsa::{RsaPrivateKey, RsaPublicKey};
