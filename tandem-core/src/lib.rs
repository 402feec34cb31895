// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tandem Core Library
//!
//! Server core for Tandem: proof-of-possession account authentication and
//! multi-device list synchronization. Transport, TLS and routing live in a
//! separate crate; this one holds the identity scheme, the session and
//! credential handling, and the convergent merge engine.

pub mod account;
pub mod api;
pub mod assertion;
pub mod session;
pub mod storage;
pub mod sync;

pub use account::{AccountError, AccountProfile, KeyLoginRequest, RegisterRequest};
pub use api::{ServerInfo, Tandem, TandemConfig, TandemError, TandemResult};
pub use assertion::{AssertionClaims, AssertionError, AssertionVerifier, KeyType, Purpose};
pub use session::{Session, SessionError, SessionManager};
pub use storage::{Storage, StorageError};
pub use sync::{
    EntryChangedRequest, EntryChangedResponse, EntryDeletedRequest, EntryDeletedResponse,
    EntryDeletion, EntryRecord, ListChangedRequest, ListChangedResponse, ListDeletedRequest,
    ListDeletedResponse, ListDeletion, ListRecord, Meaning, RecordFailure, SyncEngine, SyncError,
};
