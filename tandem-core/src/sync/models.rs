// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync request and response types.
//!
//! These mirror the JSON bodies of the sync endpoints one to one. List and
//! entry payload fields (`name`, `name_a`, `name_b`, `tip`, `meanings`) are
//! opaque to the server: they are stored and returned verbatim, never
//! inspected by the merge logic.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A list record as submitted by and returned to clients.
///
/// `uuid` is the globally unique merge key. `changed` is the client-side
/// modification timestamp driving last-writer-wins merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecord {
    pub uuid: Uuid,
    pub name: String,
    pub name_a: String,
    pub name_b: String,
    pub changed: u64,
    pub created: u64,
}

/// One meaning attached to an entry. Stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meaning {
    pub value: String,
    pub is_a: bool,
}

/// An entry record, owned by a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub uuid: Uuid,
    pub list: Uuid,
    pub tip: String,
    pub meanings: Vec<Meaning>,
    pub changed: u64,
}

/// A list deletion event: the list identifier and the client-side time of
/// deletion, which becomes (or raises) the tombstone time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListDeletion {
    pub list: Uuid,
    pub time: u64,
}

/// An entry deletion event, keyed by `(list, entry)`. The owning list does
/// not need to exist anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryDeletion {
    pub list: Uuid,
    pub entry: Uuid,
    pub time: u64,
}

/// A single record that was rejected from a batch. The rest of the batch
/// still applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListChangedRequest {
    /// Device identifier, recorded as write provenance only.
    pub client: String,
    /// Lower bound for the returned delta; `None` returns the full view.
    pub since: Option<u64>,
    pub lists: Vec<ListRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListChangedResponse {
    /// Authoritative post-merge state for every submitted identifier that
    /// is still live.
    pub records: HashMap<Uuid, ListRecord>,
    /// Submitted identifiers discarded because a tombstone exists.
    pub deleted: Vec<Uuid>,
    /// Other lists of the account changed at or after `since`.
    pub delta: HashMap<Uuid, ListRecord>,
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDeletedRequest {
    pub client: String,
    pub since: Option<u64>,
    pub lists: Vec<ListDeletion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListDeletedResponse {
    /// List tombstones of the account the caller did not just submit.
    pub deleted: HashSet<Uuid>,
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryChangedRequest {
    pub client: String,
    pub since: Option<u64>,
    pub entries: Vec<EntryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryChangedResponse {
    /// Authoritative post-merge state for every submitted identifier that
    /// is still live.
    pub records: HashMap<Uuid, EntryRecord>,
    /// Submitted identifiers discarded because the entry or its list is
    /// tombstoned.
    pub deleted: Vec<Uuid>,
    /// Submitted identifiers whose owning list the server has never seen.
    pub missing_list: Vec<Uuid>,
    /// Other entries of the account changed at or after `since`.
    pub delta: HashMap<Uuid, EntryRecord>,
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDeletedRequest {
    pub client: String,
    pub since: Option<u64>,
    pub entries: Vec<EntryDeletion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDeletedResponse {
    /// Entry tombstones of the account the caller did not just submit.
    pub deleted: Vec<EntryDeletion>,
    pub failures: Vec<RecordFailure>,
}
