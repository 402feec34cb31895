// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for session issuance, validation, expiry and revocation.

mod common;

use common::helpers::*;
use tandem_core::{
    AccountError, SessionError, SessionManager, Storage, TandemConfig, TandemError,
};
use uuid::Uuid;

#[test]
fn sessions_are_validated_per_request() {
    let service = test_service();
    let (account, session) = account_with_session(&service);

    // Every call re-validates the token independently
    for _ in 0..3 {
        assert_eq!(service.account_info(&session.token).unwrap().id, account);
    }
}

#[test]
fn expired_session_is_rejected_and_removed() {
    let mut config = TandemConfig::new(Uuid::new_v4());
    config.session_ttl_secs = 0; // expires the instant it is issued
    let service = test_service_with(config);

    let (_account, session) = account_with_session(&service);
    let err = service.account_info(&session.token).unwrap_err();
    assert!(matches!(
        err,
        TandemError::Account(AccountError::SessionExpired)
    ));

    // The expired row is gone; the token is now simply unknown
    let err = service.account_info(&session.token).unwrap_err();
    assert!(matches!(
        err,
        TandemError::Account(AccountError::Unauthenticated)
    ));
}

#[test]
fn logout_revokes_only_that_session() {
    let service = test_service();
    let (account, first) = account_with_session(&service);
    let second = login(&service, account);

    service.logout(&first.token).unwrap();

    assert!(service.account_info(&first.token).is_err());
    assert_eq!(service.account_info(&second.token).unwrap().id, account);
}

#[test]
fn logout_of_unknown_token_is_a_no_op() {
    let service = test_service();
    service.logout("never-issued").unwrap();
}

#[test]
fn manager_issue_validate_revoke() {
    let storage = Storage::in_memory().unwrap();
    let manager = SessionManager::new(&storage, 3600);
    let account = Uuid::new_v4();

    let session = manager.issue(&account).unwrap();
    assert_eq!(session.account, account);
    assert_eq!(session.expires_at, session.issued_at + 3600);
    assert_eq!(manager.validate(&session.token).unwrap(), account);

    assert!(manager.revoke(&session.token).unwrap());
    assert!(matches!(
        manager.validate(&session.token),
        Err(SessionError::Unknown)
    ));
    assert!(!manager.revoke(&session.token).unwrap());
}

#[test]
fn revoke_all_clears_every_device() {
    let storage = Storage::in_memory().unwrap();
    let manager = SessionManager::new(&storage, 3600);
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();

    let s1 = manager.issue(&account).unwrap();
    let s2 = manager.issue(&account).unwrap();
    let s3 = manager.issue(&other).unwrap();

    assert_eq!(manager.revoke_all(&account).unwrap(), 2);
    assert!(manager.validate(&s1.token).is_err());
    assert!(manager.validate(&s2.token).is_err());
    assert_eq!(manager.validate(&s3.token).unwrap(), other);
}

#[test]
fn purge_removes_only_expired_sessions() {
    let storage = Storage::in_memory().unwrap();
    let account = Uuid::new_v4();

    let expired = SessionManager::new(&storage, 0).issue(&account).unwrap();
    let live = SessionManager::new(&storage, 3600).issue(&account).unwrap();

    let purged = SessionManager::new(&storage, 3600).purge_expired().unwrap();
    assert_eq!(purged, 1);
    assert!(matches!(
        SessionManager::new(&storage, 3600).validate(&expired.token),
        Err(SessionError::Unknown)
    ));
    assert!(SessionManager::new(&storage, 3600)
        .validate(&live.token)
        .is_ok());
}
