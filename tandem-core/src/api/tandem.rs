// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tandem Orchestrator
//!
//! Main entry point for the Tandem server core. A transport layer maps its
//! routes onto these methods one to one; everything below this point is
//! transport-neutral.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::account::{
    AccountError, AccountProfile, AccountService, KeyLoginRequest, RegisterRequest,
};
use crate::assertion::AssertionVerifier;
use crate::session::{Session, SessionError, SessionManager};
use crate::storage::Storage;
use crate::sync::{
    EntryChangedRequest, EntryChangedResponse, EntryDeletedRequest, EntryDeletedResponse,
    ListChangedRequest, ListChangedResponse, ListDeletedRequest, ListDeletedResponse, SyncEngine,
};

use super::config::TandemConfig;
use super::error::{TandemError, TandemResult};

/// Server identity and clock, published so clients can target their
/// assertions (`aud` claim) and judge their own clock skew.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerInfo {
    pub id: Uuid,
    pub time: u64,
}

/// Main Tandem orchestrator.
///
/// Owns storage behind a mutex: request handlers may call in concurrently,
/// and serializing entity access is what makes the sync engine's
/// strictly-greater-timestamp comparison atomic - two devices racing on the
/// same identifier cannot both win. Every operation is bounded (CPU-only
/// verification/hashing plus local SQLite I/O), so the lock is never held
/// awaiting anything unbounded.
///
/// # Example
///
/// ```ignore
/// use tandem_core::{Tandem, TandemConfig};
///
/// let tandem = Tandem::open("tandem.db", TandemConfig::new(server_id))?;
/// let info = tandem.server_info(); // clients target info.id as audience
/// let session = tandem.login_with_key(&request)?;
/// let view = tandem.sync_lists_changed(&session.token, batch)?;
/// ```
pub struct Tandem {
    config: TandemConfig,
    verifier: AssertionVerifier,
    storage: Mutex<Storage>,
}

impl Tandem {
    /// Opens or creates the service state at the given database path.
    pub fn open<P: AsRef<Path>>(path: P, config: TandemConfig) -> TandemResult<Self> {
        let storage = Storage::open(path)?;
        Ok(Self::with_storage(storage, config))
    }

    /// Creates a service with in-memory storage (for testing).
    pub fn in_memory(config: TandemConfig) -> TandemResult<Self> {
        let storage = Storage::in_memory()?;
        Ok(Self::with_storage(storage, config))
    }

    fn with_storage(storage: Storage, config: TandemConfig) -> Self {
        info!(server_id = %config.server_id, "tandem core initialized");
        let verifier = AssertionVerifier::new(config.server_id, config.assertion_leeway_secs);
        Tandem {
            config,
            verifier,
            storage: Mutex::new(storage),
        }
    }

    /// Returns the server identity and current time.
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            id: self.config.server_id,
            time: current_timestamp(),
        }
    }

    // === Account Operations ===

    /// Registers a new account. Returns the account id; no session is
    /// issued (login is a separate step).
    pub fn register(&self, request: &RegisterRequest) -> TandemResult<Uuid> {
        let storage = self.storage();
        let id = self
            .accounts(&storage)
            .register(request, current_timestamp())?;
        Ok(id)
    }

    /// Logs in with a proof signed by a registered key.
    pub fn login_with_key(&self, request: &KeyLoginRequest) -> TandemResult<Session> {
        let storage = self.storage();
        let session = self
            .accounts(&storage)
            .login_with_key(request, current_timestamp())?;
        Ok(session)
    }

    /// Logs in with an email/password pair. The plaintext is zeroized
    /// before returning, on success and failure alike.
    pub fn login_with_password(&self, email: &str, mut password: String) -> TandemResult<Session> {
        let result = {
            let storage = self.storage();
            self.accounts(&storage)
                .login_with_password(email, &password, current_timestamp())
        };
        password.zeroize();
        Ok(result?)
    }

    /// Binds an email/password credential to the session's account.
    pub fn bind_password(
        &self,
        token: &str,
        email: &str,
        mut password: String,
    ) -> TandemResult<()> {
        let result = (|| -> TandemResult<()> {
            let storage = self.storage();
            let account = self.authenticate(&storage, token)?;
            self.accounts(&storage)
                .bind_password(&account, email, &password, current_timestamp())?;
            Ok(())
        })();
        password.zeroize();
        result
    }

    /// Returns the profile of the session's account.
    pub fn account_info(&self, token: &str) -> TandemResult<AccountProfile> {
        let storage = self.storage();
        let account = self.authenticate(&storage, token)?;
        Ok(self.accounts(&storage).account_info(&account)?)
    }

    /// Revokes the presented session.
    pub fn logout(&self, token: &str) -> TandemResult<()> {
        let storage = self.storage();
        self.sessions(&storage).revoke(token)?;
        Ok(())
    }

    // === Sync Operations ===

    /// Merges a batch of changed lists for the session's account.
    pub fn sync_lists_changed(
        &self,
        token: &str,
        request: ListChangedRequest,
    ) -> TandemResult<ListChangedResponse> {
        let storage = self.storage();
        let account = self.authenticate(&storage, token)?;
        Ok(SyncEngine::new(&storage, &self.config).lists_changed(&account, request)?)
    }

    /// Applies a batch of list deletions for the session's account.
    pub fn sync_lists_deleted(
        &self,
        token: &str,
        request: ListDeletedRequest,
    ) -> TandemResult<ListDeletedResponse> {
        let storage = self.storage();
        let account = self.authenticate(&storage, token)?;
        Ok(SyncEngine::new(&storage, &self.config).lists_deleted(&account, request)?)
    }

    /// Merges a batch of changed entries for the session's account.
    pub fn sync_entries_changed(
        &self,
        token: &str,
        request: EntryChangedRequest,
    ) -> TandemResult<EntryChangedResponse> {
        let storage = self.storage();
        let account = self.authenticate(&storage, token)?;
        Ok(SyncEngine::new(&storage, &self.config).entries_changed(&account, request)?)
    }

    /// Applies a batch of entry deletions for the session's account.
    pub fn sync_entries_deleted(
        &self,
        token: &str,
        request: EntryDeletedRequest,
    ) -> TandemResult<EntryDeletedResponse> {
        let storage = self.storage();
        let account = self.authenticate(&storage, token)?;
        Ok(SyncEngine::new(&storage, &self.config).entries_deleted(&account, request)?)
    }

    // === Internals ===

    fn storage(&self) -> MutexGuard<'_, Storage> {
        self.storage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn accounts<'a>(&'a self, storage: &'a Storage) -> AccountService<'a> {
        AccountService::new(storage, &self.verifier, self.config.session_ttl_secs)
    }

    fn sessions<'a>(&self, storage: &'a Storage) -> SessionManager<'a> {
        SessionManager::new(storage, self.config.session_ttl_secs)
    }

    /// Resolves a session token to its account.
    ///
    /// Unknown tokens surface as `Unauthenticated`, expired ones as
    /// `SessionExpired` - the split the account service error taxonomy
    /// promises.
    fn authenticate(&self, storage: &Storage, token: &str) -> TandemResult<Uuid> {
        match self.sessions(storage).validate(token) {
            Ok(account) => Ok(account),
            Err(SessionError::Unknown) => Err(AccountError::Unauthenticated.into()),
            Err(SessionError::Expired) => Err(AccountError::SessionExpired.into()),
            Err(e) => Err(TandemError::Session(e)),
        }
    }
}

/// Returns the current Unix timestamp in seconds.
/// Falls back to 0 if the system clock is before UNIX_EPOCH (should never happen).
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
