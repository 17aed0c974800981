//! Identity key pairs and their textual encoding.
//!
//! The system uses exactly one key family: RSA with a 2048-bit modulus and
//! public exponent 65537. Public keys travel as base64 SPKI DER, private keys
//! as base64 PKCS#8 DER. Both encodings are deterministic.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, PrivateKeyInfo, SubjectPublicKeyInfoRef};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Modulus size of every identity key.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Public exponent of every identity key.
pub const RSA_PUBLIC_EXPONENT: u64 = 65_537;

/// An identity key pair.
///
/// `RsaPrivateKey` zeroizes its components on drop.
pub struct KeyPair {
    pub private: RsaPrivateKey,
    pub public: RsaPublicKey,
}

impl KeyPair {
    /// Rebuilds a key pair from its private half.
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}

/// Base64 SPKI encoding of a public key. Safe to publish.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPublicKey(String);

impl EncodedPublicKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncodedPublicKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for EncodedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base64 PKCS#8 encoding of a private key.
///
/// Only ever lives in memory between the key object and its sealed form.
/// Zeroized on drop and redacted from `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncodedPrivateKey(String);

impl EncodedPrivateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps raw PKCS#8 DER bytes.
    pub(crate) fn from_der(der: &[u8]) -> Self {
        Self(STANDARD.encode(der))
    }

    /// Decodes the base64 layer, returning the raw DER bytes.
    pub(crate) fn to_der(&self) -> CryptoResult<Zeroizing<Vec<u8>>> {
        STANDARD
            .decode(&self.0)
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::MalformedKey(format!("private key is not valid base64: {e}")))
    }
}

impl From<String> for EncodedPrivateKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for EncodedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodedPrivateKey(<redacted>)")
    }
}

/// Generates a fresh identity key pair from the OS random source.
pub fn generate_key_pair() -> CryptoResult<KeyPair> {
    let private = RsaPrivateKey::new(&mut OsRng, RSA_MODULUS_BITS)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    Ok(KeyPair::from_private(private))
}

pub fn encode_public(key: &RsaPublicKey) -> CryptoResult<EncodedPublicKey> {
    let der = key
        .to_public_key_der()
        .map_err(|e| CryptoError::MalformedKey(format!("cannot encode public key: {e}")))?;
    Ok(EncodedPublicKey(STANDARD.encode(der.as_bytes())))
}

pub fn encode_private(key: &RsaPrivateKey) -> CryptoResult<EncodedPrivateKey> {
    let der = key
        .to_pkcs8_der()
        .map_err(|e| CryptoError::MalformedKey(format!("cannot encode private key: {e}")))?;
    Ok(EncodedPrivateKey::from_der(der.as_bytes()))
}

/// Parses a base64 SPKI public key.
///
/// Fails with `MalformedKey` when the text or DER structure is broken and
/// with `UnsupportedKey` when it is a well-formed key of the wrong family
/// or size.
pub fn decode_public(text: &str) -> CryptoResult<RsaPublicKey> {
    let der = STANDARD
        .decode(text)
        .map_err(|e| CryptoError::MalformedKey(format!("public key is not valid base64: {e}")))?;

    let spki = SubjectPublicKeyInfoRef::try_from(der.as_slice()).map_err(|e| {
        CryptoError::MalformedKey(format!("not a SubjectPublicKeyInfo document: {e}"))
    })?;
    if spki.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(CryptoError::UnsupportedKey(format!(
            "expected rsaEncryption, got algorithm {}",
            spki.algorithm.oid
        )));
    }

    let key = RsaPublicKey::try_from(spki)
        .map_err(|e| CryptoError::MalformedKey(format!("invalid RSA public key: {e}")))?;
    check_parameters(&key)?;
    Ok(key)
}

/// Parses a base64 PKCS#8 private key. Same failure split as [`decode_public`].
pub fn decode_private(text: &str) -> CryptoResult<RsaPrivateKey> {
    let der = Zeroizing::new(
        STANDARD.decode(text).map_err(|e| {
            CryptoError::MalformedKey(format!("private key is not valid base64: {e}"))
        })?,
    );
    private_from_der(&der)
}

pub(crate) fn private_from_der(der: &[u8]) -> CryptoResult<RsaPrivateKey> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| CryptoError::MalformedKey(format!("not a PKCS#8 document: {e}")))?;
    if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(CryptoError::UnsupportedKey(format!(
            "expected rsaEncryption, got algorithm {}",
            info.algorithm.oid
        )));
    }

    let key = RsaPrivateKey::try_from(info)
        .map_err(|e| CryptoError::MalformedKey(format!("invalid RSA private key: {e}")))?;
    key.validate()
        .map_err(|e| CryptoError::MalformedKey(format!("inconsistent RSA private key: {e}")))?;
    check_parameters(&key)?;
    Ok(key)
}

fn check_parameters(key: &impl PublicKeyParts) -> CryptoResult<()> {
    let bits = key.n().bits();
    if bits != RSA_MODULUS_BITS {
        return Err(CryptoError::UnsupportedKey(format!(
            "expected {RSA_MODULUS_BITS}-bit modulus, got {bits} bits"
        )));
    }
    if *key.e() != BigUint::from(RSA_PUBLIC_EXPONENT) {
        return Err(CryptoError::UnsupportedKey(
            "unexpected public exponent".to_string(),
        ));
    }
    Ok(())
}
