// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! List and list-tombstone storage operations.
//!
//! Every query is scoped to one account; list identifiers are globally
//! unique, so the primary key doubles as the merge-key uniqueness
//! constraint. Tombstone upserts keep the maximum deletion time, which is
//! what makes repeated deletions idempotent.

use rusqlite::params;
use uuid::Uuid;

use super::accounts::parse_uuid;
use super::{Storage, StorageError};
use crate::sync::{ListDeletion, ListRecord};

impl Storage {
    // === List Operations ===

    /// Loads a live list record of an account.
    pub fn load_list(&self, account: &Uuid, list: &Uuid) -> Result<Option<ListRecord>, StorageError> {
        let result = self.conn.query_row(
            "SELECT uuid, name, name_a, name_b, changed, created
             FROM lists WHERE uuid = ?1 AND account_id = ?2",
            params![list.to_string(), account.to_string()],
            row_to_list,
        );
        match result {
            Ok(row) => Ok(Some(finish_list(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Inserts or replaces a live list record.
    ///
    /// The update clause is guarded on the owning account so a colliding
    /// identifier from another account can never be overwritten; `created`
    /// is kept from the first insert.
    pub fn upsert_list(
        &self,
        account: &Uuid,
        record: &ListRecord,
        client: &str,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO lists (uuid, account_id, name, name_a, name_b, changed, created, last_writer)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(uuid) DO UPDATE SET
                 name = excluded.name,
                 name_a = excluded.name_a,
                 name_b = excluded.name_b,
                 changed = excluded.changed,
                 last_writer = excluded.last_writer
             WHERE lists.account_id = excluded.account_id",
            params![
                record.uuid.to_string(),
                account.to_string(),
                record.name,
                record.name_a,
                record.name_b,
                record.changed as i64,
                record.created as i64,
                client,
            ],
        )?;
        Ok(())
    }

    /// Removes a live list record. Returns whether a row was removed.
    pub fn delete_list(&self, account: &Uuid, list: &Uuid) -> Result<bool, StorageError> {
        let rows = self.conn.execute(
            "DELETE FROM lists WHERE uuid = ?1 AND account_id = ?2",
            params![list.to_string(), account.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Whether a live list with this identifier exists for the account.
    pub fn list_exists(&self, account: &Uuid, list: &Uuid) -> Result<bool, StorageError> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM lists WHERE uuid = ?1 AND account_id = ?2",
            params![list.to_string(), account.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// All live lists of an account changed at or after `since`.
    pub fn lists_changed_since(
        &self,
        account: &Uuid,
        since: Option<u64>,
    ) -> Result<Vec<ListRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, name_a, name_b, changed, created
             FROM lists WHERE account_id = ?1 AND changed >= ?2",
        )?;
        let rows = stmt.query_map(
            params![account.to_string(), since.unwrap_or(0) as i64],
            row_to_list,
        )?;

        let mut lists = Vec::new();
        for row in rows {
            lists.push(finish_list(row?)?);
        }
        Ok(lists)
    }

    // === List Tombstones ===

    /// Deletion time of a list tombstone, if one exists.
    pub fn list_tombstone_time(
        &self,
        account: &Uuid,
        list: &Uuid,
    ) -> Result<Option<u64>, StorageError> {
        let result = self.conn.query_row(
            "SELECT deleted_at FROM list_tombstones WHERE account_id = ?1 AND list_id = ?2",
            params![account.to_string(), list.to_string()],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(t) => Ok(Some(t as u64)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Creates a list tombstone or raises an existing one to the maximum of
    /// the stored and submitted deletion times. Provenance follows the
    /// winning time.
    pub fn upsert_list_tombstone(
        &self,
        account: &Uuid,
        list: &Uuid,
        time: u64,
        client: &str,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO list_tombstones (account_id, list_id, deleted_at, last_writer)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(account_id, list_id) DO UPDATE SET
                 deleted_at = excluded.deleted_at,
                 last_writer = excluded.last_writer
             WHERE excluded.deleted_at > list_tombstones.deleted_at",
            params![account.to_string(), list.to_string(), time as i64, client],
        )?;
        Ok(())
    }

    /// All list tombstones of an account with deletion time at or after `since`.
    pub fn list_tombstones_since(
        &self,
        account: &Uuid,
        since: Option<u64>,
    ) -> Result<Vec<ListDeletion>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT list_id, deleted_at FROM list_tombstones
             WHERE account_id = ?1 AND deleted_at >= ?2",
        )?;
        let rows = stmt.query_map(
            params![account.to_string(), since.unwrap_or(0) as i64],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut tombstones = Vec::new();
        for row in rows {
            let (list, time) = row?;
            tombstones.push(ListDeletion {
                list: parse_uuid(&list)?,
                time: time as u64,
            });
        }
        Ok(tombstones)
    }
}

type ListRow = (String, String, String, String, i64, i64);

fn row_to_list(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn finish_list(row: ListRow) -> Result<ListRecord, StorageError> {
    let (uuid, name, name_a, name_b, changed, created) = row;
    Ok(ListRecord {
        uuid: parse_uuid(&uuid)?,
        name,
        name_a,
        name_b,
        changed: changed as u64,
        created: created as u64,
    })
}
