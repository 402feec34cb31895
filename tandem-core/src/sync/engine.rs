// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Engine
//!
//! Applies changed/deleted batches to storage under the merge rules and
//! assembles the authoritative view to send back. Every batch runs inside
//! one storage transaction; the caller serializes access to storage, which
//! makes each read-compare-write atomic per entity identifier.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use super::models::*;
use crate::api::TandemConfig;
use crate::storage::{Storage, StorageError};

/// Sync error types.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Applies sync batches for one account.
pub struct SyncEngine<'a> {
    storage: &'a Storage,
    config: &'a TandemConfig,
}

impl<'a> SyncEngine<'a> {
    pub fn new(storage: &'a Storage, config: &'a TandemConfig) -> Self {
        SyncEngine { storage, config }
    }

    /// Merges a batch of changed list records.
    ///
    /// Absent identifiers are inserted; existing ones replaced only when
    /// the incoming `changed` is strictly greater (ties keep the stored
    /// version, so retransmissions are no-ops). Tombstoned identifiers are
    /// never resurrected. The response carries the post-merge state of
    /// every submitted identifier plus a catch-up delta.
    pub fn lists_changed(
        &self,
        account: &Uuid,
        request: ListChangedRequest,
    ) -> Result<ListChangedResponse, SyncError> {
        let now = current_timestamp();
        self.storage.transaction(|storage| {
            storage.touch_last_seen(account, now)?;

            let mut records = HashMap::new();
            let mut deleted = Vec::new();
            let mut failures = Vec::new();
            let mut submitted = HashSet::with_capacity(request.lists.len());

            for record in request.lists {
                submitted.insert(record.uuid);
                if let Err(error) = self.validate_list(&record, now) {
                    trace!(list = %record.uuid, %error, "rejecting list record");
                    failures.push(RecordFailure {
                        id: record.uuid,
                        error,
                    });
                    continue;
                }
                if storage.list_tombstone_time(account, &record.uuid)?.is_some() {
                    trace!(list = %record.uuid, "ignoring change to tombstoned list");
                    deleted.push(record.uuid);
                    continue;
                }
                match storage.load_list(account, &record.uuid)? {
                    None => {
                        storage.upsert_list(account, &record, &request.client)?;
                        records.insert(record.uuid, record);
                    }
                    Some(stored) if record.changed > stored.changed => {
                        storage.upsert_list(account, &record, &request.client)?;
                        records.insert(record.uuid, record);
                    }
                    Some(stored) => {
                        trace!(list = %stored.uuid, "keeping stored list over outdated change");
                        records.insert(stored.uuid, stored);
                    }
                }
            }

            let mut delta = HashMap::new();
            for record in storage.lists_changed_since(account, request.since)? {
                if !submitted.contains(&record.uuid) {
                    delta.insert(record.uuid, record);
                }
            }

            debug!(
                merged = records.len(),
                tombstoned = deleted.len(),
                delta = delta.len(),
                failed = failures.len(),
                client = %request.client,
                "lists changed batch applied"
            );
            Ok(ListChangedResponse {
                records,
                deleted,
                delta,
                failures,
            })
        })
    }

    /// Applies a batch of list deletions.
    ///
    /// Each deletion creates a tombstone or raises an existing one to the
    /// maximum deletion time, and removes any live record. Repeating a
    /// deletion, or deleting with an earlier time, is a no-op.
    pub fn lists_deleted(
        &self,
        account: &Uuid,
        request: ListDeletedRequest,
    ) -> Result<ListDeletedResponse, SyncError> {
        let now = current_timestamp();
        self.storage.transaction(|storage| {
            storage.touch_last_seen(account, now)?;

            let mut failures = Vec::new();
            let mut submitted = HashSet::with_capacity(request.lists.len());

            for deletion in request.lists {
                submitted.insert(deletion.list);
                if let Err(error) = self.validate_time(deletion.time, now) {
                    failures.push(RecordFailure {
                        id: deletion.list,
                        error,
                    });
                    continue;
                }
                storage.upsert_list_tombstone(
                    account,
                    &deletion.list,
                    deletion.time,
                    &request.client,
                )?;
                storage.delete_list(account, &deletion.list)?;
            }

            let deleted = storage
                .list_tombstones_since(account, request.since)?
                .into_iter()
                .map(|t| t.list)
                .filter(|list| !submitted.contains(list))
                .collect();

            debug!(failed = failures.len(), client = %request.client, "lists deleted batch applied");
            Ok(ListDeletedResponse { deleted, failures })
        })
    }

    /// Merges a batch of changed entry records.
    ///
    /// Same rules as lists, with two extra gates: a change is discarded
    /// when the entry or its owning list is tombstoned, and reported as
    /// `missing_list` when the server has never seen the list.
    pub fn entries_changed(
        &self,
        account: &Uuid,
        request: EntryChangedRequest,
    ) -> Result<EntryChangedResponse, SyncError> {
        let now = current_timestamp();
        self.storage.transaction(|storage| {
            storage.touch_last_seen(account, now)?;

            let mut records = HashMap::new();
            let mut deleted = Vec::new();
            let mut missing_list = Vec::new();
            let mut failures = Vec::new();
            let mut submitted = HashSet::with_capacity(request.entries.len());

            for record in request.entries {
                submitted.insert(record.uuid);
                if let Err(error) = self.validate_entry(&record, now) {
                    trace!(entry = %record.uuid, %error, "rejecting entry record");
                    failures.push(RecordFailure {
                        id: record.uuid,
                        error,
                    });
                    continue;
                }
                if storage
                    .entry_tombstone_time(account, &record.list, &record.uuid)?
                    .is_some()
                {
                    trace!(entry = %record.uuid, "ignoring change to tombstoned entry");
                    deleted.push(record.uuid);
                    continue;
                }
                if storage.list_tombstone_time(account, &record.list)?.is_some() {
                    trace!(entry = %record.uuid, list = %record.list, "ignoring entry under tombstoned list");
                    deleted.push(record.uuid);
                    continue;
                }
                if !storage.list_exists(account, &record.list)? {
                    trace!(entry = %record.uuid, list = %record.list, "entry for unknown list");
                    missing_list.push(record.uuid);
                    continue;
                }
                match storage.load_entry(account, &record.uuid)? {
                    None => {
                        storage.upsert_entry(account, &record, &request.client)?;
                        records.insert(record.uuid, record);
                    }
                    Some(stored) if record.changed > stored.changed => {
                        storage.upsert_entry(account, &record, &request.client)?;
                        records.insert(record.uuid, record);
                    }
                    Some(stored) => {
                        trace!(entry = %stored.uuid, "keeping stored entry over outdated change");
                        records.insert(stored.uuid, stored);
                    }
                }
            }

            let mut delta = HashMap::new();
            for record in storage.entries_changed_since(account, request.since)? {
                if !submitted.contains(&record.uuid) {
                    delta.insert(record.uuid, record);
                }
            }

            debug!(
                merged = records.len(),
                tombstoned = deleted.len(),
                missing = missing_list.len(),
                failed = failures.len(),
                client = %request.client,
                "entries changed batch applied"
            );
            Ok(EntryChangedResponse {
                records,
                deleted,
                missing_list,
                delta,
                failures,
            })
        })
    }

    /// Applies a batch of entry deletions.
    ///
    /// Keyed by `(list, entry)`; the owning list does not need to exist or
    /// be live anymore - deletions must land even after their list is gone.
    pub fn entries_deleted(
        &self,
        account: &Uuid,
        request: EntryDeletedRequest,
    ) -> Result<EntryDeletedResponse, SyncError> {
        let now = current_timestamp();
        self.storage.transaction(|storage| {
            storage.touch_last_seen(account, now)?;

            let mut failures = Vec::new();
            let mut submitted = HashSet::with_capacity(request.entries.len());

            for deletion in request.entries {
                submitted.insert(deletion.entry);
                if let Err(error) = self.validate_time(deletion.time, now) {
                    failures.push(RecordFailure {
                        id: deletion.entry,
                        error,
                    });
                    continue;
                }
                storage.upsert_entry_tombstone(account, &deletion, &request.client)?;
                storage.delete_entry(account, &deletion.entry)?;
            }

            let deleted = storage
                .entry_tombstones_since(account, request.since)?
                .into_iter()
                .filter(|t| !submitted.contains(&t.entry))
                .collect();

            debug!(failed = failures.len(), client = %request.client, "entries deleted batch applied");
            Ok(EntryDeletedResponse { deleted, failures })
        })
    }

    fn validate_list(&self, record: &ListRecord, now: u64) -> Result<(), String> {
        self.validate_time(record.changed, now)?;
        for (field, value) in [
            ("name", &record.name),
            ("name_a", &record.name_a),
            ("name_b", &record.name_b),
        ] {
            if value.len() > self.config.max_field_len {
                return Err(format!(
                    "{field} exceeds {} bytes",
                    self.config.max_field_len
                ));
            }
        }
        Ok(())
    }

    fn validate_entry(&self, record: &EntryRecord, now: u64) -> Result<(), String> {
        self.validate_time(record.changed, now)?;
        if record.tip.len() > self.config.max_field_len {
            return Err(format!("tip exceeds {} bytes", self.config.max_field_len));
        }
        if record.meanings.len() > self.config.max_meanings {
            return Err(format!(
                "more than {} meanings",
                self.config.max_meanings
            ));
        }
        for meaning in &record.meanings {
            if meaning.value.len() > self.config.max_field_len {
                return Err(format!(
                    "meaning exceeds {} bytes",
                    self.config.max_field_len
                ));
            }
        }
        Ok(())
    }

    fn validate_time(&self, time: u64, now: u64) -> Result<(), String> {
        if time > now + self.config.clock_skew_grace_secs {
            return Err(format!("timestamp {time} is in the future (server time {now})"));
        }
        Ok(())
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
