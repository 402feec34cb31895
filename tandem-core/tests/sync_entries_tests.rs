// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for entry synchronization, including deletions that outlive their
//! owning list.

mod common;

use std::collections::HashMap;

use common::fixtures::unix_now;
use common::helpers::*;
use tandem_core::{
    EntryChangedRequest, EntryDeletedRequest, EntryDeletion, EntryRecord, ListDeletedRequest,
    ListDeletion, Meaning, Tandem,
};
use uuid::Uuid;

fn changed_request(client: &str, entries: Vec<EntryRecord>) -> EntryChangedRequest {
    EntryChangedRequest {
        client: client.to_string(),
        since: None,
        entries,
    }
}

fn deleted_request(client: &str, entries: Vec<EntryDeletion>) -> EntryDeletedRequest {
    EntryDeletedRequest {
        client: client.to_string(),
        since: None,
        entries,
    }
}

/// Creates a live list for the session's account and returns its id.
fn seed_list(service: &Tandem, token: &str, changed: u64) -> Uuid {
    let uuid = Uuid::new_v4();
    let response = service
        .sync_lists_changed(
            token,
            tandem_core::ListChangedRequest {
                client: "seed".to_string(),
                since: None,
                lists: vec![list_record(uuid, "seed", changed)],
            },
        )
        .unwrap();
    assert!(response.failures.is_empty());
    uuid
}

/// Current server-side view of all live entries.
fn fetch_entries(service: &Tandem, token: &str) -> HashMap<Uuid, EntryRecord> {
    service
        .sync_entries_changed(token, changed_request("probe", vec![]))
        .unwrap()
        .delta
}

#[test]
fn entry_under_live_list_is_stored_verbatim() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);

    let mut entry = entry_record(Uuid::new_v4(), list, "haus", base + 1);
    entry.meanings = vec![
        Meaning { value: "house".to_string(), is_a: true },
        Meaning { value: "home".to_string(), is_a: false },
    ];

    let response = service
        .sync_entries_changed(&session.token, changed_request("phone", vec![entry.clone()]))
        .unwrap();
    assert_eq!(response.records.get(&entry.uuid), Some(&entry));

    // Another device reads back the identical payload
    assert_eq!(fetch_entries(&service, &session.token).get(&entry.uuid), Some(&entry));
}

#[test]
fn later_entry_change_wins_in_either_order() {
    let base = unix_now() - 1_000;
    let entry_id = Uuid::new_v4();

    for reversed in [false, true] {
        let service = test_service();
        let (_account, session) = account_with_session(&service);
        let list = seed_list(&service, &session.token, base);

        let older = entry_record(entry_id, list, "older tip", base + 10);
        let newer = entry_record(entry_id, list, "newer tip", base + 20);
        let arrival = if reversed {
            vec![newer.clone(), older.clone()]
        } else {
            vec![older.clone(), newer.clone()]
        };
        for record in arrival {
            service
                .sync_entries_changed(&session.token, changed_request("device", vec![record]))
                .unwrap();
        }
        assert_eq!(
            fetch_entries(&service, &session.token).get(&entry_id),
            Some(&newer)
        );
    }
}

#[test]
fn equal_entry_timestamps_keep_stored() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);
    let entry_id = Uuid::new_v4();

    let stored = entry_record(entry_id, list, "first", base + 5);
    let rival = entry_record(entry_id, list, "second", base + 5);
    service
        .sync_entries_changed(&session.token, changed_request("a", vec![stored.clone()]))
        .unwrap();
    let response = service
        .sync_entries_changed(&session.token, changed_request("b", vec![rival]))
        .unwrap();

    assert_eq!(response.records.get(&entry_id), Some(&stored));
}

#[test]
fn entry_for_unknown_list_is_reported_not_stored() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;

    let entry = entry_record(Uuid::new_v4(), Uuid::new_v4(), "orphan", base);
    let response = service
        .sync_entries_changed(&session.token, changed_request("phone", vec![entry.clone()]))
        .unwrap();

    assert_eq!(response.missing_list, vec![entry.uuid]);
    assert!(response.records.is_empty());
    assert!(fetch_entries(&service, &session.token).is_empty());
}

#[test]
fn entry_change_under_tombstoned_list_is_discarded() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);

    service
        .sync_lists_deleted(
            &session.token,
            ListDeletedRequest {
                client: "phone".to_string(),
                since: None,
                lists: vec![ListDeletion { list, time: base + 50 }],
            },
        )
        .unwrap();

    let entry = entry_record(Uuid::new_v4(), list, "too late", base + 100);
    let response = service
        .sync_entries_changed(&session.token, changed_request("tablet", vec![entry.clone()]))
        .unwrap();
    assert_eq!(response.deleted, vec![entry.uuid]);
    assert!(fetch_entries(&service, &session.token).is_empty());
}

#[test]
fn deleted_entry_never_comes_back() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);

    let entry = entry_record(Uuid::new_v4(), list, "short lived", base + 1);
    service
        .sync_entries_changed(&session.token, changed_request("phone", vec![entry.clone()]))
        .unwrap();
    service
        .sync_entries_deleted(
            &session.token,
            deleted_request("phone", vec![EntryDeletion { list, entry: entry.uuid, time: base + 10 }]),
        )
        .unwrap();
    assert!(fetch_entries(&service, &session.token).is_empty());

    let revived = entry_record(entry.uuid, list, "revived", base + 100);
    let response = service
        .sync_entries_changed(&session.token, changed_request("tablet", vec![revived]))
        .unwrap();
    assert_eq!(response.deleted, vec![entry.uuid]);
    assert!(fetch_entries(&service, &session.token).is_empty());
}

#[test]
fn entry_deletion_tolerates_missing_list() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;

    // The server has never seen this list at all
    let response = service
        .sync_entries_deleted(
            &session.token,
            deleted_request(
                "phone",
                vec![EntryDeletion { list: Uuid::new_v4(), entry: Uuid::new_v4(), time: base }],
            ),
        )
        .unwrap();
    assert!(response.failures.is_empty());
}

#[test]
fn entry_deletion_after_list_deletion_succeeds() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);

    let entry = entry_record(Uuid::new_v4(), list, "stranded", base + 1);
    service
        .sync_entries_changed(&session.token, changed_request("phone", vec![entry.clone()]))
        .unwrap();
    service
        .sync_lists_deleted(
            &session.token,
            ListDeletedRequest {
                client: "phone".to_string(),
                since: None,
                lists: vec![ListDeletion { list, time: base + 5 }],
            },
        )
        .unwrap();

    // The other device deletes the entry after the list is already gone
    let response = service
        .sync_entries_deleted(
            &session.token,
            deleted_request(
                "tablet",
                vec![EntryDeletion { list, entry: entry.uuid, time: base + 10 }],
            ),
        )
        .unwrap();
    assert!(response.failures.is_empty());
    assert!(fetch_entries(&service, &session.token).is_empty());
}

#[test]
fn resubmitting_entry_batches_is_idempotent() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);

    let changed = vec![
        entry_record(Uuid::new_v4(), list, "eins", base + 1),
        entry_record(Uuid::new_v4(), list, "zwei", base + 2),
    ];
    let first = service
        .sync_entries_changed(&session.token, changed_request("phone", changed.clone()))
        .unwrap();
    let second = service
        .sync_entries_changed(&session.token, changed_request("phone", changed))
        .unwrap();
    assert_eq!(first, second);

    let deletions = vec![EntryDeletion { list, entry: first.records.keys().next().copied().unwrap(), time: base + 10 }];
    let first = service
        .sync_entries_deleted(&session.token, deleted_request("phone", deletions.clone()))
        .unwrap();
    let second = service
        .sync_entries_deleted(&session.token, deleted_request("phone", deletions))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn oversized_entries_fail_alone() {
    let service = test_service();
    let (_account, session) = account_with_session(&service);
    let base = unix_now() - 1_000;
    let list = seed_list(&service, &session.token, base);

    let sound = entry_record(Uuid::new_v4(), list, "fine", base + 1);
    let mut bloated = entry_record(Uuid::new_v4(), list, "bloated", base + 2);
    bloated.meanings = (0..65)
        .map(|i| Meaning { value: format!("meaning {i}"), is_a: true })
        .collect();

    let response = service
        .sync_entries_changed(
            &session.token,
            changed_request("phone", vec![bloated.clone(), sound.clone()]),
        )
        .unwrap();

    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].id, bloated.uuid);
    assert_eq!(response.records.get(&sound.uuid), Some(&sound));
    assert_eq!(fetch_entries(&service, &session.token).len(), 1);
}
