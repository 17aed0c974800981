//! Async client session for Sealpost.
//!
//! Wraps `sealpost-crypto` for use from a tokio application:
//! - Registration: key generation and sealing on the blocking pool
//! - Unlock: one password-derived unseal per login, concurrent callers share it
//! - Inbox: bounded concurrent decryption that preserves message order
//! - Logout: ends the session and discards any decryption still in flight

pub mod config;
pub mod error;
pub mod registration;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use registration::register;
pub use session::Session;
