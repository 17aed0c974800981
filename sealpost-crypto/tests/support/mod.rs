//! Shared fixtures. RSA key generation is slow, so tests share two
//! long-lived key pairs instead of generating one per test.

#![allow(dead_code)]

use sealpost_crypto::{
    KdfHash, KdfParams, KeyPair, PasswordVault, VaultConfig, generate_key_pair,
};
use std::sync::OnceLock;

/// The key pair most tests encrypt to.
pub fn owner_keys() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_key_pair().expect("key generation must succeed"))
}

/// An unrelated key pair, for wrong-key cases.
pub fn foreign_keys() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_key_pair().expect("key generation must succeed"))
}

/// Vault with the cheapest accepted PBKDF2 cost.
pub fn fast_vault() -> PasswordVault {
    PasswordVault::new(VaultConfig {
        kdf: KdfParams::Pbkdf2 {
            hash: KdfHash::Sha256,
            rounds: 1_000,
        },
    })
    .expect("fast vault config is valid")
}
