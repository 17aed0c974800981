//! Identity creation off the async runtime.

use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::session::{Session, run_blocking};
use sealpost_crypto::{PasswordVault, RegistrationRecord, create_identity};
use tracing::info;
use zeroize::Zeroizing;

/// Creates an identity for a new account.
///
/// Returns the record to hand to account storage, and a session that is
/// already unlocked with the fresh key pair so the user does not have to
/// unseal it again.
pub async fn register(
    config: SessionConfig,
    password: &str,
) -> SessionResult<(RegistrationRecord, Session)> {
    config.validate()?;
    let vault = PasswordVault::new(config.vault)?;
    let password = Zeroizing::new(password.to_string());
    let identity = run_blocking(move || create_identity(&password, &vault)).await?;

    let session = Session::with_keys(config, identity.keys)?;
    info!("registered new identity");
    Ok((identity.record, session))
}
