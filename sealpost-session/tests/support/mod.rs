//! Shared fixtures. One identity is created per test binary; RSA key
//! generation is too slow to repeat in every test.

#![allow(dead_code)]

use sealpost_crypto::{
    KdfHash, KdfParams, KeyPair, MessageEnvelope, NewIdentity, PasswordVault, PrivateKeyRecord,
    PublicKeyRecord, VaultConfig, create_identity, generate_key_pair,
};
use sealpost_session::SessionConfig;
use std::sync::OnceLock;

pub const PASSWORD: &str = "correct horse battery staple";

pub fn fast_vault_config() -> VaultConfig {
    VaultConfig {
        kdf: KdfParams::Pbkdf2 {
            hash: KdfHash::Sha256,
            rounds: 1_000,
        },
    }
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        vault: fast_vault_config(),
        ..SessionConfig::default()
    }
}

/// The account under test, sealed with [`PASSWORD`].
pub fn owner() -> &'static NewIdentity {
    static IDENTITY: OnceLock<NewIdentity> = OnceLock::new();
    IDENTITY.get_or_init(|| {
        let vault = PasswordVault::new(fast_vault_config()).expect("fast vault config is valid");
        create_identity(PASSWORD, &vault).expect("identity creation must succeed")
    })
}

/// A key pair the owner cannot decrypt for.
pub fn stranger() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| generate_key_pair().expect("key generation must succeed"))
}

pub fn owner_private_record() -> PrivateKeyRecord {
    PrivateKeyRecord {
        encrypted_private_key: owner().record.encrypted_private_key.clone(),
    }
}

pub fn owner_public_record() -> PublicKeyRecord {
    PublicKeyRecord {
        public_key: owner().record.public_key.clone(),
    }
}

pub fn envelope(sender: &str, encrypted_content: String) -> MessageEnvelope {
    MessageEnvelope {
        id: None,
        sender: sender.to_string(),
        receiver: "owner@example.com".to_string(),
        encrypted_content,
        timestamp: "2024-05-01T10:00:00Z".to_string(),
        expires_at: None,
        read: false,
    }
}
