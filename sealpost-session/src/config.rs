//! Session configuration.

use crate::error::{SessionError, SessionResult};
use sealpost_crypto::VaultConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a client session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key derivation settings for sealing and unsealing.
    pub vault: VaultConfig,

    /// Upper bound on envelopes decrypted at once.
    pub max_inbox_concurrency: usize,

    /// Drop envelopes past their `expires_at` before decrypting.
    pub hide_expired: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vault: VaultConfig::default(),
            max_inbox_concurrency: 8,
            hide_expired: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> SessionResult<()> {
        if self.max_inbox_concurrency == 0 {
            return Err(SessionError::Config(
                "max_inbox_concurrency must be at least 1".to_string(),
            ));
        }
        self.vault.validate()?;
        Ok(())
    }
}
