//! Password-based key derivation.
//!
//! The default is PBKDF2-HMAC-SHA256 with 100,000 rounds, which is what
//! every untagged sealed key was produced with. Argon2id is available as an
//! upgrade path and is always written with a version tag.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of derived keys in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of the per-seal random salt.
pub const SALT_SIZE: usize = 16;

/// Lowest PBKDF2 round count accepted by [`KdfParams::validate`].
pub const MIN_PBKDF2_ROUNDS: u32 = 1_000;

/// Reference PBKDF2 round count.
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 100_000;

/// A symmetric key derived from a password. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Random salt, fresh for every sealing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// HMAC hash used by PBKDF2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KdfHash {
    Sha256,
    Sha512,
}

/// Key derivation function and its cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum KdfParams {
    Pbkdf2 {
        hash: KdfHash,
        rounds: u32,
    },
    Argon2id {
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::Pbkdf2 {
            hash: KdfHash::Sha256,
            rounds: DEFAULT_PBKDF2_ROUNDS,
        }
    }
}

impl KdfParams {
    /// Argon2id at the OWASP-recommended baseline (19 MiB, 2 passes).
    pub fn argon2id() -> Self {
        Self::Argon2id {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }

    pub fn validate(&self) -> CryptoResult<()> {
        match *self {
            Self::Pbkdf2 { rounds, .. } if rounds < MIN_PBKDF2_ROUNDS => {
                Err(CryptoError::InvalidConfig(format!(
                    "PBKDF2 rounds must be at least {MIN_PBKDF2_ROUNDS}, got {rounds}"
                )))
            }
            Self::Pbkdf2 { .. } => Ok(()),
            Self::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => Params::new(memory_kib, iterations, parallelism, Some(KEY_SIZE))
                .map(|_| ())
                .map_err(|e| CryptoError::InvalidConfig(format!("argon2id parameters: {e}"))),
        }
    }
}

/// Derives a 256-bit key from `password` and `salt`.
///
/// Deterministic for a given (password, salt, params) triple and slow by
/// construction.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    let mut out = [0u8; KEY_SIZE];
    match *params {
        KdfParams::Pbkdf2 {
            hash: KdfHash::Sha256,
            rounds,
        } => pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut out),
        KdfParams::Pbkdf2 {
            hash: KdfHash::Sha512,
            rounds,
        } => pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), rounds, &mut out),
        KdfParams::Argon2id {
            memory_kib,
            iterations,
            parallelism,
        } => {
            let argon_params = Params::new(memory_kib, iterations, parallelism, Some(KEY_SIZE))
                .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
                .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut out)
                .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        }
    }
    let key = DerivedKey::from_bytes(out);
    out.zeroize();
    Ok(key)
}
