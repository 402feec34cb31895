// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Management Module
//!
//! Issues and validates the opaque session handles clients present after a
//! successful assertion or password login. Tokens carry no structure - 32
//! bytes of OS entropy, base64url encoded - and are tracked server-side so
//! an account action can revoke them.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;
use uuid::Uuid;

use crate::storage::{SessionRecord, Storage, StorageError};

/// Session token length in bytes, before encoding.
const TOKEN_BYTES: usize = 32;

/// Session error types.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unknown session")]
    Unknown,

    #[error("session expired")]
    Expired,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// An issued session: the opaque token plus its validity window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub account: Uuid,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Issues, validates and revokes sessions against storage.
pub struct SessionManager<'a> {
    storage: &'a Storage,
    ttl_secs: u64,
}

impl<'a> SessionManager<'a> {
    /// Creates a session manager with the given time-to-live.
    pub fn new(storage: &'a Storage, ttl_secs: u64) -> Self {
        SessionManager { storage, ttl_secs }
    }

    /// Issues a fresh session for an account.
    pub fn issue(&self, account: &Uuid) -> Result<Session, SessionError> {
        let now = current_timestamp();
        let session = Session {
            token: generate_token(),
            account: *account,
            issued_at: now,
            expires_at: now + self.ttl_secs,
        };
        self.storage.insert_session(&SessionRecord {
            token: session.token.clone(),
            account_id: session.account,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        })?;
        trace!(account = %account, expires_at = session.expires_at, "session issued");
        Ok(session)
    }

    /// Validates a token and returns the account it is bound to.
    ///
    /// Expired sessions are removed on sight and reported as [`SessionError::Expired`].
    pub fn validate(&self, token: &str) -> Result<Uuid, SessionError> {
        let record = self
            .storage
            .load_session(token)?
            .ok_or(SessionError::Unknown)?;
        if current_timestamp() >= record.expires_at {
            self.storage.delete_session(token)?;
            trace!(account = %record.account_id, "session expired");
            return Err(SessionError::Expired);
        }
        Ok(record.account_id)
    }

    /// Revokes a single session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        Ok(self.storage.delete_session(token)?)
    }

    /// Revokes every session of an account. Returns the number removed.
    pub fn revoke_all(&self, account: &Uuid) -> Result<usize, SessionError> {
        Ok(self.storage.delete_account_sessions(account)?)
    }

    /// Removes sessions past their expiry. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize, SessionError> {
        Ok(self.storage.purge_expired_sessions(current_timestamp())?)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Returns the current Unix timestamp in seconds.
/// Falls back to 0 if the system clock is before UNIX_EPOCH (should never happen).
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
