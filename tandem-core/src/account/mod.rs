// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Account Service Module
//!
//! Orchestrates registration and login. Registration trusts the key
//! submitted alongside the proof (self-signed bootstrap - there is no prior
//! secret for a new account); login only ever verifies against the key or
//! password hash already on file. Password login failures collapse into one
//! generic error so the endpoint cannot be used to enumerate accounts.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::assertion::{AssertionError, AssertionVerifier, KeyType, Purpose};
use crate::session::{Session, SessionError, SessionManager};
use crate::storage::{NewAccount, Storage, StorageError};

/// Account service error types.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("account already exists")]
    AlreadyExists,

    #[error("unknown account")]
    UnknownAccount,

    #[error("email already bound to an account")]
    EmailAlreadyBound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not authenticated")]
    Unauthenticated,

    #[error("session expired")]
    SessionExpired,

    #[error("assertion rejected: {0}")]
    Assertion(#[from] AssertionError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Registration request: the public key, its type, and a proof signed with
/// the matching private key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub key: String,
    pub keytype: KeyType,
    pub proof: String,
}

/// Key login request: the claimed account and a proof signed with its
/// registered key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyLoginRequest {
    pub iss: Uuid,
    pub proof: String,
}

/// Public profile of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub created_at: u64,
}

/// Registration and login orchestration over storage.
pub struct AccountService<'a> {
    storage: &'a Storage,
    verifier: &'a AssertionVerifier,
    sessions: SessionManager<'a>,
}

impl<'a> AccountService<'a> {
    pub fn new(
        storage: &'a Storage,
        verifier: &'a AssertionVerifier,
        session_ttl_secs: u64,
    ) -> Self {
        AccountService {
            storage,
            verifier,
            sessions: SessionManager::new(storage, session_ttl_secs),
        }
    }

    /// Registers a new account from a self-signed proof of possession.
    ///
    /// The proof is verified against the key submitted in the same request;
    /// the account identifier is the proof's `iss` claim. Returns the new
    /// account id. No session is issued - login is a separate step.
    pub fn register(&self, request: &RegisterRequest, now: u64) -> Result<Uuid, AccountError> {
        let claims = self.verifier.verify(
            &request.proof,
            request.key.as_bytes(),
            request.keytype,
            Purpose::Register,
        )?;
        // verify() enforces the name claim for register purpose
        let name = claims.name.clone().unwrap_or_default();

        self.storage
            .create_account(&NewAccount {
                uuid: claims.iss,
                name,
                delete_after: claims.delete_after,
                key_pem: request.key.as_bytes().to_vec(),
                key_type: request.keytype.tag(),
                created_at: now,
            })
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => AccountError::AlreadyExists,
                e => AccountError::Storage(e),
            })?;
        debug!(account = %claims.iss, "account registered");
        Ok(claims.iss)
    }

    /// Logs in with a proof signed by an already-registered key.
    pub fn login_with_key(
        &self,
        request: &KeyLoginRequest,
        now: u64,
    ) -> Result<Session, AccountError> {
        let key = self
            .storage
            .account_key(&request.iss)?
            .ok_or(AccountError::UnknownAccount)?;
        let key_type =
            KeyType::from_tag(key.key_type).ok_or(AssertionError::UnsupportedKeyType)?;

        let claims = self
            .verifier
            .verify(&request.proof, &key.pem, key_type, Purpose::Login)?;
        if claims.iss != request.iss {
            debug!(claimed = %request.iss, signed = %claims.iss, "login issuer mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        self.storage.touch_last_seen(&request.iss, now)?;
        trace!(account = %request.iss, "key login");
        Ok(self.sessions.issue(&request.iss)?)
    }

    /// Binds an email/password credential to an authenticated account.
    ///
    /// Only the salted Argon2id hash is stored, never the plaintext.
    pub fn bind_password(
        &self,
        account: &Uuid,
        email: &str,
        password: &str,
        now: u64,
    ) -> Result<(), AccountError> {
        let hash = hash_password(password)?;
        self.storage
            .bind_login(account, email, &hash, now)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => AccountError::EmailAlreadyBound,
                e => AccountError::Storage(e),
            })?;
        debug!(account = %account, "password credential bound");
        Ok(())
    }

    /// Logs in with an email/password pair.
    ///
    /// Unknown email and wrong password yield the same error.
    pub fn login_with_password(
        &self,
        email: &str,
        password: &str,
        now: u64,
    ) -> Result<Session, AccountError> {
        let (account, hash) = self
            .storage
            .login_by_email(email)?
            .ok_or(AccountError::InvalidCredentials)?;
        verify_password(password, &hash)?;

        self.storage.touch_last_seen(&account, now)?;
        trace!(account = %account, "password login");
        Ok(self.sessions.issue(&account)?)
    }

    /// Returns the public profile of an account.
    pub fn account_info(&self, account: &Uuid) -> Result<AccountProfile, AccountError> {
        let record = self
            .storage
            .load_account(account)?
            .ok_or(AccountError::UnknownAccount)?;
        Ok(AccountProfile {
            id: record.uuid,
            name: record.name,
            created_at: record.created_at,
        })
    }
}

/// Hashes a password into a PHC string (Argon2id, random per-hash salt).
pub(crate) fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
///
/// Any mismatch or malformed hash yields `InvalidCredentials`.
pub(crate) fn verify_password(password: &str, stored: &str) -> Result<(), AccountError> {
    let parsed = PasswordHash::new(stored).map_err(|_| AccountError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AccountError::InvalidCredentials)
}
