//! Password sealing: round trips, wrong passwords, tampering and format.

mod support;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sealpost_crypto::{
    CryptoError, EncodedPrivateKey, KdfParams, PasswordVault, SealedPrivateKey, VaultConfig,
    encode_private, encode_public,
};
use support::{fast_vault, owner_keys};

fn owner_private() -> EncodedPrivateKey {
    encode_private(&owner_keys().private).unwrap()
}

/// Flips one byte of the decoded ciphertext segment and re-encodes.
fn flip_ciphertext_byte(sealed: &SealedPrivateKey, index: usize) -> SealedPrivateKey {
    let segments: Vec<&str> = sealed.as_str().split('.').collect();
    let mut ciphertext = STANDARD.decode(segments[2]).unwrap();
    ciphertext[index] ^= 0x01;
    SealedPrivateKey::from(format!(
        "{}.{}.{}",
        segments[0],
        segments[1],
        STANDARD.encode(ciphertext)
    ))
}

#[test]
fn seal_unseal_roundtrip() {
    let vault = fast_vault();
    let key = owner_private();

    let sealed = vault.seal(&key, "correct-horse-battery-staple").unwrap();
    let opened = vault.unseal(&sealed, "correct-horse-battery-staple").unwrap();

    assert_eq!(opened.as_str(), key.as_str());
}

#[test]
fn default_vault_roundtrip() {
    let vault = PasswordVault::default();
    assert_eq!(vault.config().kdf, KdfParams::default());

    let sealed = vault.seal(&owner_private(), "pw-100k").unwrap();
    let opened = vault.unseal_key(&sealed, "pw-100k").unwrap();
    assert_eq!(opened, owner_keys().private);
}

#[test]
fn wrong_password_is_rejected() {
    let vault = fast_vault();
    let sealed = vault.seal(&owner_private(), "right password").unwrap();

    let err = vault.unseal(&sealed, "wrong password").unwrap_err();
    assert!(matches!(err, CryptoError::WrongPasswordOrCorruptData), "got {err:?}");
}

#[test]
fn wrong_password_and_tampering_share_one_message() {
    let vault = fast_vault();
    let sealed = vault.seal(&owner_private(), "pw").unwrap();

    let wrong_pw = vault.unseal(&sealed, "nope").unwrap_err().to_string();
    let tampered = vault
        .unseal(&flip_ciphertext_byte(&sealed, 0), "pw")
        .unwrap_err()
        .to_string();

    assert_eq!(wrong_pw, tampered);
    assert_eq!(wrong_pw, "incorrect password or corrupted data");
}

#[test]
fn every_ciphertext_byte_is_tamper_evident() {
    let vault = fast_vault();
    let sealed = vault.seal(&owner_private(), "pw").unwrap();
    let len = STANDARD
        .decode(sealed.as_str().split('.').nth(2).unwrap())
        .unwrap()
        .len();

    // Stride keeps the test quick while still covering body and tag.
    for i in (0..len).step_by(37).chain(len - 16..len) {
        let err = vault.unseal(&flip_ciphertext_byte(&sealed, i), "pw").unwrap_err();
        assert!(
            matches!(err, CryptoError::WrongPasswordOrCorruptData),
            "tampering at byte {i} must be detected"
        );
    }
}

#[test]
fn tampered_iv_is_rejected() {
    let vault = fast_vault();
    let sealed = vault.seal(&owner_private(), "pw").unwrap();
    let segments: Vec<&str> = sealed.as_str().split('.').collect();
    let mut iv = STANDARD.decode(segments[1]).unwrap();
    iv[0] ^= 0xFF;
    let tampered = SealedPrivateKey::from(format!(
        "{}.{}.{}",
        segments[0],
        STANDARD.encode(iv),
        segments[2]
    ));

    assert!(matches!(
        vault.unseal(&tampered, "pw").unwrap_err(),
        CryptoError::WrongPasswordOrCorruptData
    ));
}

#[test]
fn sealing_is_randomized() {
    let vault = fast_vault();
    let key = owner_private();

    let a = vault.seal(&key, "pw").unwrap();
    let b = vault.seal(&key, "pw").unwrap();
    assert_ne!(a, b);

    let seg_a: Vec<&str> = a.as_str().split('.').collect();
    let seg_b: Vec<&str> = b.as_str().split('.').collect();
    assert_ne!(seg_a[0], seg_b[0], "salt must differ");
    assert_ne!(seg_a[1], seg_b[1], "iv must differ");
    assert_ne!(seg_a[2], seg_b[2], "ciphertext must differ");

    assert_eq!(vault.unseal(&a, "pw").unwrap().as_str(), key.as_str());
    assert_eq!(vault.unseal(&b, "pw").unwrap().as_str(), key.as_str());
}

#[test]
fn unseal_key_rejects_sealed_non_key_bytes() {
    let vault = fast_vault();
    let junk = EncodedPrivateKey::from(STANDARD.encode(b"opaque bytes, not PKCS#8"));
    let sealed = vault.seal(&junk, "pw").unwrap();

    assert_eq!(vault.unseal(&sealed, "pw").unwrap().as_str(), junk.as_str());
    assert!(matches!(
        vault.unseal_key(&sealed, "pw").unwrap_err(),
        CryptoError::MalformedKey(_)
    ));
}

#[test]
fn seal_rejects_non_base64_private_key() {
    let err = fast_vault()
        .seal(&EncodedPrivateKey::from("***".to_string()), "pw")
        .unwrap_err();
    assert!(matches!(err, CryptoError::MalformedKey(_)));
}

#[test]
fn reseal_changes_password_and_keeps_key() {
    let vault = fast_vault();
    let sealed = vault.seal(&owner_private(), "old").unwrap();

    let resealed = vault.reseal(&sealed, "old", "new").unwrap();
    assert_ne!(resealed, sealed);

    assert!(vault.unseal(&resealed, "old").is_err());
    assert_eq!(
        vault.unseal(&resealed, "new").unwrap().as_str(),
        owner_private().as_str()
    );
}

#[test]
fn reseal_with_wrong_old_password_fails() {
    let vault = fast_vault();
    let sealed = vault.seal(&owner_private(), "old").unwrap();
    assert!(matches!(
        vault.reseal(&sealed, "guess", "new").unwrap_err(),
        CryptoError::WrongPasswordOrCorruptData
    ));
}

#[test]
fn argon2id_vault_still_opens_untagged_default_keys() {
    let legacy = PasswordVault::default().seal(&owner_private(), "pw").unwrap();

    let upgraded = PasswordVault::new(VaultConfig {
        kdf: KdfParams::Argon2id {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
    })
    .unwrap();

    let opened = upgraded.unseal(&legacy, "pw").unwrap();
    assert_eq!(opened.as_str(), owner_private().as_str());

    let migrated = upgraded.reseal(&legacy, "pw", "pw").unwrap();
    assert!(migrated.as_str().starts_with("v2."));
    assert_eq!(upgraded.unseal(&migrated, "pw").unwrap().as_str(), owner_private().as_str());
}

#[test]
fn changed_round_count_cannot_open_untagged_keys() {
    // Untagged keys carry no parameters; a different round count derives a
    // different key and the blob reads as corrupt.
    let sealed = fast_vault().seal(&owner_private(), "pw").unwrap();
    let other = PasswordVault::new(VaultConfig {
        kdf: KdfParams::Pbkdf2 {
            hash: sealpost_crypto::KdfHash::Sha256,
            rounds: 2_000,
        },
    })
    .unwrap();
    assert!(matches!(
        other.unseal(&sealed, "pw").unwrap_err(),
        CryptoError::WrongPasswordOrCorruptData
    ));
}

#[test]
fn registration_record_uses_wire_field_names() {
    let record = sealpost_crypto::RegistrationRecord {
        public_key: encode_public(&owner_keys().public).unwrap(),
        encrypted_private_key: fast_vault().seal(&owner_private(), "pw").unwrap(),
    };
    let json = serde_json::to_value(&record).unwrap();
    assert!(json["public_key"].is_string());
    assert!(json["encrypted_private_key"].is_string());
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn seal_unseal_always_roundtrips(
            bytes in proptest::collection::vec(any::<u8>(), 0..512),
            password in ".{0,64}",
        ) {
            let vault = fast_vault();
            let key = EncodedPrivateKey::from(STANDARD.encode(&bytes));
            let sealed = vault.seal(&key, &password).unwrap();
            let opened = vault.unseal(&sealed, &password).unwrap();
            prop_assert_eq!(opened.as_str(), key.as_str());
        }
    }
}
