// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry and entry-tombstone storage operations.
//!
//! Entry meanings are stored verbatim as one JSON text column; the server
//! never inspects them. Entry tombstones are keyed by (list, entry) so a
//! deletion can land after its owning list is gone.

use rusqlite::params;
use uuid::Uuid;

use super::accounts::parse_uuid;
use super::{Storage, StorageError};
use crate::sync::{EntryDeletion, EntryRecord, Meaning};

impl Storage {
    // === Entry Operations ===

    /// Loads a live entry record of an account.
    pub fn load_entry(
        &self,
        account: &Uuid,
        entry: &Uuid,
    ) -> Result<Option<EntryRecord>, StorageError> {
        let result = self.conn.query_row(
            "SELECT uuid, list_id, tip, meanings_json, changed
             FROM entries WHERE uuid = ?1 AND account_id = ?2",
            params![entry.to_string(), account.to_string()],
            row_to_entry,
        );
        match result {
            Ok(row) => Ok(Some(finish_entry(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Inserts or replaces a live entry record.
    pub fn upsert_entry(
        &self,
        account: &Uuid,
        record: &EntryRecord,
        client: &str,
    ) -> Result<(), StorageError> {
        let meanings = serde_json::to_string(&record.meanings)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO entries (uuid, list_id, account_id, tip, meanings_json, changed, last_writer)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(uuid) DO UPDATE SET
                 list_id = excluded.list_id,
                 tip = excluded.tip,
                 meanings_json = excluded.meanings_json,
                 changed = excluded.changed,
                 last_writer = excluded.last_writer
             WHERE entries.account_id = excluded.account_id",
            params![
                record.uuid.to_string(),
                record.list.to_string(),
                account.to_string(),
                record.tip,
                meanings,
                record.changed as i64,
                client,
            ],
        )?;
        Ok(())
    }

    /// Removes a live entry record. Returns whether a row was removed.
    pub fn delete_entry(&self, account: &Uuid, entry: &Uuid) -> Result<bool, StorageError> {
        let rows = self.conn.execute(
            "DELETE FROM entries WHERE uuid = ?1 AND account_id = ?2",
            params![entry.to_string(), account.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// All live entries of an account changed at or after `since`.
    pub fn entries_changed_since(
        &self,
        account: &Uuid,
        since: Option<u64>,
    ) -> Result<Vec<EntryRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, list_id, tip, meanings_json, changed
             FROM entries WHERE account_id = ?1 AND changed >= ?2",
        )?;
        let rows = stmt.query_map(
            params![account.to_string(), since.unwrap_or(0) as i64],
            row_to_entry,
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(finish_entry(row?)?);
        }
        Ok(entries)
    }

    // === Entry Tombstones ===

    /// Deletion time of an entry tombstone, if one exists.
    pub fn entry_tombstone_time(
        &self,
        account: &Uuid,
        list: &Uuid,
        entry: &Uuid,
    ) -> Result<Option<u64>, StorageError> {
        let result = self.conn.query_row(
            "SELECT deleted_at FROM entry_tombstones
             WHERE account_id = ?1 AND list_id = ?2 AND entry_id = ?3",
            params![account.to_string(), list.to_string(), entry.to_string()],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(t) => Ok(Some(t as u64)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Creates an entry tombstone or raises an existing one to the maximum
    /// of the stored and submitted deletion times.
    pub fn upsert_entry_tombstone(
        &self,
        account: &Uuid,
        deletion: &EntryDeletion,
        client: &str,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO entry_tombstones (account_id, list_id, entry_id, deleted_at, last_writer)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(account_id, list_id, entry_id) DO UPDATE SET
                 deleted_at = excluded.deleted_at,
                 last_writer = excluded.last_writer
             WHERE excluded.deleted_at > entry_tombstones.deleted_at",
            params![
                account.to_string(),
                deletion.list.to_string(),
                deletion.entry.to_string(),
                deletion.time as i64,
                client,
            ],
        )?;
        Ok(())
    }

    /// All entry tombstones of an account with deletion time at or after `since`.
    pub fn entry_tombstones_since(
        &self,
        account: &Uuid,
        since: Option<u64>,
    ) -> Result<Vec<EntryDeletion>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT list_id, entry_id, deleted_at FROM entry_tombstones
             WHERE account_id = ?1 AND deleted_at >= ?2",
        )?;
        let rows = stmt.query_map(
            params![account.to_string(), since.unwrap_or(0) as i64],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;

        let mut tombstones = Vec::new();
        for row in rows {
            let (list, entry, time) = row?;
            tombstones.push(EntryDeletion {
                list: parse_uuid(&list)?,
                entry: parse_uuid(&entry)?,
                time: time as u64,
            });
        }
        Ok(tombstones)
    }
}

type EntryRow = (String, String, String, String, i64);

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn finish_entry(row: EntryRow) -> Result<EntryRecord, StorageError> {
    let (uuid, list, tip, meanings_json, changed) = row;
    let meanings: Vec<Meaning> = serde_json::from_str(&meanings_json)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(EntryRecord {
        uuid: parse_uuid(&uuid)?,
        list: parse_uuid(&list)?,
        tip,
        meanings,
        changed: changed as u64,
    })
}
