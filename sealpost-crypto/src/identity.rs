//! Identity creation: one key pair, public half published, private half sealed.

use crate::error::CryptoResult;
use crate::keys::{self, KeyPair};
use crate::types::RegistrationRecord;
use crate::vault::PasswordVault;
use tracing::debug;

/// A freshly created identity.
///
/// `record` goes to account storage; `keys` can seed the first session
/// without unsealing again.
#[derive(Debug)]
pub struct NewIdentity {
    pub record: RegistrationRecord,
    pub keys: KeyPair,
}

/// Generates a key pair and seals its private half under `password`.
pub fn create_identity(password: &str, vault: &PasswordVault) -> CryptoResult<NewIdentity> {
    let keys = keys::generate_key_pair()?;
    let public_key = keys::encode_public(&keys.public)?;
    let encoded_private = keys::encode_private(&keys.private)?;
    let encrypted_private_key = vault.seal(&encoded_private, password)?;

    debug!("created identity key pair");
    Ok(NewIdentity {
        record: RegistrationRecord {
            public_key,
            encrypted_private_key,
        },
        keys,
    })
}
