//! Password sealing of the identity private key.
//!
//! A sealed key is the private key's PKCS#8 bytes encrypted with AES-256-GCM
//! under a password-derived key, packed as dot-separated base64 segments:
//!
//! ```text
//! base64(salt) "." base64(iv) "." base64(ciphertext)          PBKDF2 (untagged)
//! "v2" "." base64(salt) "." base64(iv) "." base64(ciphertext) Argon2id
//! ```
//!
//! The untagged layout carries no parameters. It is always opened with the
//! vault's PBKDF2 settings, so changing the round count strands every key
//! sealed before the change.

use crate::cipher::{self, EncryptedData, NONCE_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{self, KdfParams, SALT_SIZE, Salt};
use crate::keys::{self, EncodedPrivateKey};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// Segment separator. Not part of the base64 alphabet.
pub const SEAL_DELIMITER: char = '.';

/// Leading tag of Argon2id-sealed keys.
pub const ARGON2ID_FORMAT_TAG: &str = "v2";

/// Parameters owned by the vault.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// KDF used when sealing. Also supplies the parameters for opening keys
    /// of the same family.
    pub kdf: KdfParams,
}

impl VaultConfig {
    pub fn validate(&self) -> CryptoResult<()> {
        self.kdf.validate()
    }
}

/// A private key sealed under a password, in its transportable string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedPrivateKey(String);

impl SealedPrivateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for SealedPrivateKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SealedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SealFormat {
    Pbkdf2,
    Argon2id,
}

struct SealedParts {
    format: SealFormat,
    salt: Salt,
    encrypted: EncryptedData,
}

impl SealedParts {
    fn parse(sealed: &SealedPrivateKey) -> CryptoResult<Self> {
        let segments: Vec<&str> = sealed.as_str().split(SEAL_DELIMITER).collect();
        let (format, fields) = match segments.as_slice() {
            [salt, iv, ct] => (SealFormat::Pbkdf2, [*salt, *iv, *ct]),
            [tag, salt, iv, ct] if *tag == ARGON2ID_FORMAT_TAG => {
                (SealFormat::Argon2id, [*salt, *iv, *ct])
            }
            [tag, _, _, _] => {
                return Err(CryptoError::MalformedSealedKey(format!(
                    "unknown format tag {tag:?}"
                )));
            }
            other => {
                return Err(CryptoError::MalformedSealedKey(format!(
                    "expected 3 segments, found {}",
                    other.len()
                )));
            }
        };

        let [salt_b64, iv_b64, ct_b64] = fields;
        let salt: [u8; SALT_SIZE] = decode_fixed(salt_b64, "salt")?;
        let nonce: [u8; NONCE_SIZE] = decode_fixed(iv_b64, "iv")?;
        let ciphertext = decode_segment(ct_b64, "ciphertext")?;

        Ok(Self {
            format,
            salt: Salt::from_bytes(salt),
            encrypted: EncryptedData { nonce, ciphertext },
        })
    }

    fn render(&self) -> SealedPrivateKey {
        let body = [
            STANDARD.encode(self.salt.as_bytes()),
            STANDARD.encode(self.encrypted.nonce),
            STANDARD.encode(&self.encrypted.ciphertext),
        ]
        .join(".");
        match self.format {
            SealFormat::Pbkdf2 => SealedPrivateKey(body),
            SealFormat::Argon2id => SealedPrivateKey(format!("{ARGON2ID_FORMAT_TAG}.{body}")),
        }
    }
}

fn decode_segment(segment: &str, name: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(segment)
        .map_err(|e| CryptoError::MalformedSealedKey(format!("{name} is not valid base64: {e}")))
}

fn decode_fixed<const N: usize>(segment: &str, name: &str) -> CryptoResult<[u8; N]> {
    let bytes = decode_segment(segment, name)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        CryptoError::MalformedSealedKey(format!(
            "{name} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Seals and unseals identity private keys with a user password.
#[derive(Clone, Debug, Default)]
pub struct PasswordVault {
    config: VaultConfig,
}

impl PasswordVault {
    pub fn new(config: VaultConfig) -> CryptoResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Seals an encoded private key under `password`.
    ///
    /// Salt and iv are drawn fresh from the OS random source on every call,
    /// so sealing the same key twice never produces the same string.
    pub fn seal(
        &self,
        private_key: &EncodedPrivateKey,
        password: &str,
    ) -> CryptoResult<SealedPrivateKey> {
        let der = private_key.to_der()?;
        let salt = Salt::random();
        let derived = kdf::derive_key(password, &salt, &self.config.kdf)?;
        let encrypted = cipher::encrypt(&derived, &der)?;

        let format = match self.config.kdf {
            KdfParams::Pbkdf2 { .. } => SealFormat::Pbkdf2,
            KdfParams::Argon2id { .. } => SealFormat::Argon2id,
        };
        debug!(?format, "sealed private key");

        Ok(SealedParts {
            format,
            salt,
            encrypted,
        }
        .render())
    }

    /// Opens a sealed key.
    ///
    /// Fails with `MalformedSealedKey` if the string cannot be parsed and
    /// with `WrongPasswordOrCorruptData` if authentication fails. The latter
    /// does not say which of the two it was.
    pub fn unseal(
        &self,
        sealed: &SealedPrivateKey,
        password: &str,
    ) -> CryptoResult<EncodedPrivateKey> {
        let parts = SealedParts::parse(sealed)?;
        let params = self.params_for(parts.format);
        let derived = kdf::derive_key(password, &parts.salt, &params)?;
        let plaintext = Zeroizing::new(cipher::decrypt(&derived, &parts.encrypted)?);
        Ok(EncodedPrivateKey::from_der(&plaintext))
    }

    /// Opens a sealed key and parses it into a usable private key.
    pub fn unseal_key(&self, sealed: &SealedPrivateKey, password: &str) -> CryptoResult<RsaPrivateKey> {
        let encoded = self.unseal(sealed, password)?;
        let der = encoded.to_der()?;
        keys::private_from_der(&der)
    }

    /// Re-seals under a new password with fresh salt and iv.
    ///
    /// The old password must open the key first. Output uses this vault's
    /// sealing format, so this also migrates keys between formats.
    pub fn reseal(
        &self,
        sealed: &SealedPrivateKey,
        old_password: &str,
        new_password: &str,
    ) -> CryptoResult<SealedPrivateKey> {
        let encoded = self.unseal(sealed, old_password)?;
        self.seal(&encoded, new_password)
    }

    fn params_for(&self, format: SealFormat) -> KdfParams {
        match (format, self.config.kdf) {
            (SealFormat::Pbkdf2, kdf @ KdfParams::Pbkdf2 { .. }) => kdf,
            (SealFormat::Pbkdf2, _) => KdfParams::default(),
            (SealFormat::Argon2id, kdf @ KdfParams::Argon2id { .. }) => kdf,
            (SealFormat::Argon2id, _) => KdfParams::argon2id(),
        }
    }
}
