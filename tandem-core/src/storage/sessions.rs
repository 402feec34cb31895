// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session storage operations.

use rusqlite::params;
use uuid::Uuid;

use super::accounts::parse_uuid;
use super::{Storage, StorageError};

/// A stored session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub token: String,
    pub account_id: Uuid,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl Storage {
    // === Session Operations ===

    /// Persists a freshly issued session.
    pub fn insert_session(&self, session: &SessionRecord) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO sessions (token, account_id, issued_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.token,
                    session.account_id.to_string(),
                    session.issued_at as i64,
                    session.expires_at as i64,
                ],
            )
            .map_err(|e| StorageError::on_conflict(e, "session token"))?;
        Ok(())
    }

    /// Loads a session by token.
    pub fn load_session(&self, token: &str) -> Result<Option<SessionRecord>, StorageError> {
        let result = self.conn.query_row(
            "SELECT token, account_id, issued_at, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        );
        match result {
            Ok((token, account_id, issued_at, expires_at)) => Ok(Some(SessionRecord {
                token,
                account_id: parse_uuid(&account_id)?,
                issued_at: issued_at as u64,
                expires_at: expires_at as u64,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Deletes a session by token. Returns whether a row was removed.
    pub fn delete_session(&self, token: &str) -> Result<bool, StorageError> {
        let rows = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(rows > 0)
    }

    /// Revokes every session of an account. Returns the number removed.
    pub fn delete_account_sessions(&self, id: &Uuid) -> Result<usize, StorageError> {
        let rows = self.conn.execute(
            "DELETE FROM sessions WHERE account_id = ?1",
            params![id.to_string()],
        )?;
        Ok(rows)
    }

    /// Removes sessions whose expiry has passed. Returns the number removed.
    pub fn purge_expired_sessions(&self, now: u64) -> Result<usize, StorageError> {
        let rows = self.conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![now as i64],
        )?;
        Ok(rows)
    }
}
