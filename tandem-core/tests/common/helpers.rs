// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Service construction and account setup helpers.

use tandem_core::{
    EntryRecord, KeyLoginRequest, KeyType, ListRecord, Meaning, RegisterRequest, Session, Tandem,
    TandemConfig,
};
use uuid::Uuid;

use super::fixtures::{ProofBuilder, EC_PUBLIC_PEM};

/// A fresh in-memory service with a random server identity.
pub fn test_service() -> Tandem {
    Tandem::in_memory(TandemConfig::new(Uuid::new_v4())).expect("in-memory service")
}

/// A fresh in-memory service with custom configuration.
pub fn test_service_with(config: TandemConfig) -> Tandem {
    Tandem::in_memory(config).expect("in-memory service")
}

/// Registers a new account with the primary EC key; returns its id.
pub fn register_account(service: &Tandem) -> Uuid {
    let account = Uuid::new_v4();
    let proof = ProofBuilder::register(account, service.server_info().id).build();
    service
        .register(&RegisterRequest {
            key: EC_PUBLIC_PEM.to_string(),
            keytype: KeyType::EcPem,
            proof,
        })
        .expect("registration")
}

/// Logs an account in with the primary EC key.
pub fn login(service: &Tandem, account: Uuid) -> Session {
    let proof = ProofBuilder::login(account, service.server_info().id).build();
    service
        .login_with_key(&KeyLoginRequest {
            iss: account,
            proof,
        })
        .expect("key login")
}

/// Registers an account and logs it in, in one step.
pub fn account_with_session(service: &Tandem) -> (Uuid, Session) {
    let account = register_account(service);
    let session = login(service, account);
    (account, session)
}

/// A list record with the given change timestamp and a payload derived
/// from `label`.
pub fn list_record(uuid: Uuid, label: &str, changed: u64) -> ListRecord {
    ListRecord {
        uuid,
        name: format!("{label} vocabulary"),
        name_a: "de".to_string(),
        name_b: "en".to_string(),
        changed,
        created: changed.saturating_sub(100),
    }
}

/// An entry record under `list` with one meaning.
pub fn entry_record(uuid: Uuid, list: Uuid, tip: &str, changed: u64) -> EntryRecord {
    EntryRecord {
        uuid,
        list,
        tip: tip.to_string(),
        meanings: vec![Meaning {
            value: format!("{tip} (translated)"),
            is_a: true,
        }],
        changed,
    }
}
