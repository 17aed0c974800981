//! Per-login key state.
//!
//! A [`Session`] owns the unsealed private key for one authenticated login.
//! The key is set once (unlock) and cleared once (end). All crypto runs on
//! tokio's blocking pool so the slow KDF and RSA operations never stall
//! async workers.

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use chrono::Utc;
use sealpost_crypto::{
    CryptoResult, InboxEntry, KeyPair, MessageEnvelope, OutboundMessage, PasswordVault,
    PrivateKeyRecord, PublicKeyRecord, RsaPrivateKey, decode_public, decrypt_message,
    encrypt_message, open_envelope,
};
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tracing::{debug, warn};
use zeroize::Zeroizing;

enum KeyState {
    Locked,
    Unlocked(Arc<RsaPrivateKey>),
    Ended,
}

/// Key state for one authenticated login.
pub struct Session {
    vault: PasswordVault,
    config: SessionConfig,
    state: RwLock<KeyState>,
    unlock_gate: Mutex<()>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a locked session.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        let vault = PasswordVault::new(config.vault)?;
        Ok(Self {
            vault,
            config,
            state: RwLock::new(KeyState::Locked),
            unlock_gate: Mutex::new(()),
        })
    }

    /// Creates a session that is already unlocked, e.g. right after
    /// registration when the key pair is still in memory.
    pub fn with_keys(config: SessionConfig, keys: KeyPair) -> SessionResult<Self> {
        let mut session = Self::new(config)?;
        session.state = RwLock::new(KeyState::Unlocked(Arc::new(keys.private)));
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn vault(&self) -> &PasswordVault {
        &self.vault
    }

    /// Unseals the stored private key into the session.
    ///
    /// Concurrent calls are serialized: callers that queued while another
    /// unlock was running share its result. A call on a session that was
    /// already unlocked when it arrived still checks `password` against the
    /// record, so a wrong password is always reported.
    pub async fn unlock(&self, record: &PrivateKeyRecord, password: &str) -> SessionResult<()> {
        let arrived_locked = matches!(*self.state.read().await, KeyState::Locked);
        let _gate = self.unlock_gate.lock().await;

        let unlocked = match &*self.state.read().await {
            KeyState::Unlocked(_) => true,
            KeyState::Ended => return Err(SessionError::SessionEnded),
            KeyState::Locked => false,
        };
        if unlocked && arrived_locked {
            debug!("session unlocked by concurrent caller");
            return Ok(());
        }
        if unlocked {
            // The unsealed copy is only a password check; the session keeps its key.
            self.unseal(record, password).await?;
            debug!("session already unlocked, password verified");
            return Ok(());
        }

        let key = self.unseal(record, password).await?;

        let mut state = self.state.write().await;
        if matches!(*state, KeyState::Ended) {
            return Err(SessionError::SessionEnded);
        }
        *state = KeyState::Unlocked(Arc::new(key));
        debug!("session unlocked");
        Ok(())
    }

    async fn unseal(&self, record: &PrivateKeyRecord, password: &str) -> SessionResult<RsaPrivateKey> {
        let vault = self.vault.clone();
        let sealed = record.encrypted_private_key.clone();
        let password = Zeroizing::new(password.to_string());
        run_blocking(move || vault.unseal_key(&sealed, &password)).await
    }

    /// Ends the session and drops the private key.
    ///
    /// Work already holding the key may finish, but its results are
    /// discarded. An ended session cannot be unlocked again.
    pub async fn end(&self) {
        let mut state = self.state.write().await;
        if !matches!(*state, KeyState::Ended) {
            *state = KeyState::Ended;
            debug!("session ended");
        }
    }

    pub async fn is_unlocked(&self) -> bool {
        matches!(*self.state.read().await, KeyState::Unlocked(_))
    }

    pub async fn is_ended(&self) -> bool {
        matches!(*self.state.read().await, KeyState::Ended)
    }

    /// Encrypts a message for `receiver` using the key record fetched for
    /// them. Fails without producing anything if the message is too long or
    /// the key is invalid.
    pub async fn seal_outbound(
        &self,
        receiver: &str,
        recipient_key: &PublicKeyRecord,
        plaintext: &str,
    ) -> SessionResult<OutboundMessage> {
        if self.is_ended().await {
            return Err(SessionError::SessionEnded);
        }

        let encoded = recipient_key.public_key.clone();
        let plaintext = Zeroizing::new(plaintext.to_string());
        let encrypted_content = run_blocking(move || {
            let public = decode_public(encoded.as_str())?;
            encrypt_message(&plaintext, &public)
        })
        .await?;

        Ok(OutboundMessage {
            receiver: receiver.to_string(),
            encrypted_content,
        })
    }

    /// Decrypts a single ciphertext with the session key.
    pub async fn decrypt_message(&self, ciphertext_b64: &str) -> SessionResult<String> {
        let key = self.private_key().await?;
        let ciphertext = ciphertext_b64.to_string();
        let marker = Arc::downgrade(&key);
        let plaintext = run_blocking(move || decrypt_message(&ciphertext, &key)).await?;
        self.ensure_current(&marker).await?;
        Ok(plaintext)
    }

    /// Decrypts an inbox concurrently, preserving envelope order.
    ///
    /// Envelopes that fail to decrypt become placeholder entries. If the
    /// session ends before every envelope is done, the whole result is
    /// discarded and `SessionEnded` is returned.
    pub async fn decrypt_inbox(
        &self,
        envelopes: Vec<MessageEnvelope>,
    ) -> SessionResult<Vec<InboxEntry>> {
        let key = self.private_key().await?;
        let marker = Arc::downgrade(&key);

        let now = Utc::now();
        let total = envelopes.len();
        let envelopes: Vec<MessageEnvelope> = if self.config.hide_expired {
            envelopes.into_iter().filter(|e| !e.is_expired(now)).collect()
        } else {
            envelopes
        };
        if envelopes.len() < total {
            debug!(expired = total - envelopes.len(), "skipping expired envelopes");
        }

        let permits = Arc::new(Semaphore::new(self.config.max_inbox_concurrency));
        let mut handles = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| SessionError::TaskFailed(e.to_string()))?;
            // Stop starting new work once the session is gone.
            self.ensure_current(&marker).await?;
            let worker_key = Arc::clone(&key);
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                open_envelope(envelope, &worker_key)
            }));
        }
        drop(key);

        let mut entries = Vec::with_capacity(handles.len());
        for handle in handles {
            entries.push(
                handle
                    .await
                    .map_err(|e| SessionError::TaskFailed(e.to_string()))?,
            );
        }

        self.ensure_current(&marker).await?;

        let failed = entries.iter().filter(|e| e.plaintext.is_failed()).count();
        if failed > 0 {
            warn!(failed, total = entries.len(), "inbox contains undecryptable messages");
        } else {
            debug!(total = entries.len(), "decrypted inbox");
        }
        Ok(entries)
    }

    async fn private_key(&self) -> SessionResult<Arc<RsaPrivateKey>> {
        match &*self.state.read().await {
            KeyState::Unlocked(key) => Ok(Arc::clone(key)),
            KeyState::Locked => Err(SessionError::Locked),
            KeyState::Ended => Err(SessionError::SessionEnded),
        }
    }

    /// Checks that the key behind `marker` is still the session's key, i.e.
    /// the session was not ended while work was in flight.
    async fn ensure_current(&self, marker: &Weak<RsaPrivateKey>) -> SessionResult<()> {
        match &*self.state.read().await {
            KeyState::Unlocked(current) if std::ptr::eq(Arc::as_ptr(current), marker.as_ptr()) => {
                Ok(())
            }
            _ => {
                warn!("session ended during decryption, discarding results");
                Err(SessionError::SessionEnded)
            }
        }
    }
}

/// Runs a crypto closure on the blocking pool.
pub(crate) async fn run_blocking<F, T>(f: F) -> SessionResult<T>
where
    F: FnOnce() -> CryptoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SessionError::TaskFailed(e.to_string()))?
        .map_err(SessionError::from)
}
