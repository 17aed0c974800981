//! Records exchanged with account storage and message transport.
//!
//! Field names match the JSON the transport layer speaks.

use crate::keys::EncodedPublicKey;
use crate::vault::SealedPrivateKey;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sent to account storage when an identity is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub public_key: EncodedPublicKey,
    pub encrypted_private_key: SealedPrivateKey,
}

/// Fetched from account storage at session start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyRecord {
    pub encrypted_private_key: SealedPrivateKey,
}

/// Fetched from account storage for a message target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    pub public_key: EncodedPublicKey,
}

/// Account as stored server side. Either key may be missing for accounts
/// created before key custody existed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub email: String,
    #[serde(default)]
    pub public_key: Option<EncodedPublicKey>,
    #[serde(default)]
    pub encrypted_private_key: Option<SealedPrivateKey>,
}

impl AccountRecord {
    pub fn has_keys(&self) -> bool {
        self.public_key.is_some() && self.encrypted_private_key.is_some()
    }

    /// Splits out the sealed key for session start.
    pub fn private_key_record(&self) -> Option<PrivateKeyRecord> {
        self.encrypted_private_key
            .clone()
            .map(|encrypted_private_key| PrivateKeyRecord {
                encrypted_private_key,
            })
    }

    pub fn public_key_record(&self) -> Option<PublicKeyRecord> {
        self.public_key
            .clone()
            .map(|public_key| PublicKeyRecord { public_key })
    }
}

/// Submitted to the transport to send one message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub receiver: String,
    pub encrypted_content: String,
}

/// One stored message as returned by the inbox endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sender: String,
    pub receiver: String,
    pub encrypted_content: String,
    /// ISO-8601 timestamp, kept verbatim.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub read: bool,
}

impl MessageEnvelope {
    /// Whether `expires_at` lies before `now`. Envelopes without an expiry,
    /// or with one that does not parse, never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|expires| now > expires)
    }

    /// Parsed `timestamp`, if it is well formed.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Accepts RFC 3339 and the offset-less ISO form (assumed UTC).
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Text shown for an inbox entry that could not be decrypted.
pub const DECRYPTION_FAILED_PLACEHOLDER: &str = "[Decryption failed]";

/// Outcome of decrypting one inbox envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboxPlaintext {
    Decrypted(String),
    Failed,
}

impl InboxPlaintext {
    /// The plaintext, or the failure placeholder.
    pub fn text(&self) -> &str {
        match self {
            Self::Decrypted(text) => text,
            Self::Failed => DECRYPTION_FAILED_PLACEHOLDER,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for InboxPlaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// An envelope paired with its decryption outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboxEntry {
    pub envelope: MessageEnvelope,
    pub plaintext: InboxPlaintext,
}

/// Entries exchanged with `counterpart`, in their original order.
///
/// Messages a user sent to themselves are left out.
pub fn conversation_with<'a>(entries: &'a [InboxEntry], counterpart: &str) -> Vec<&'a InboxEntry> {
    entries
        .iter()
        .filter(|entry| {
            let env = &entry.envelope;
            env.sender != env.receiver && (env.sender == counterpart || env.receiver == counterpart)
        })
        .collect()
}
