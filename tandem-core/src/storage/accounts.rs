// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Account and credential storage operations.

use rusqlite::params;
use uuid::Uuid;

use super::{Storage, StorageError};

/// Data for a new account row plus its initial key, written atomically.
#[derive(Debug)]
pub struct NewAccount {
    pub uuid: Uuid,
    pub name: String,
    pub delete_after: Option<u32>,
    pub key_pem: Vec<u8>,
    pub key_type: i64,
    pub created_at: u64,
}

/// A stored account row.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub uuid: Uuid,
    pub name: String,
    pub created_at: u64,
    pub last_seen: u64,
    pub delete_after: Option<u32>,
    pub locked: Option<String>,
}

/// Key material on file for an account.
///
/// The key-type tag is returned raw; mapping it back to a supported key
/// family (and rejecting unknown tags) is the caller's decision.
#[derive(Debug, Clone)]
pub struct StoredKey {
    pub pem: Vec<u8>,
    pub key_type: i64,
}

impl Storage {
    // === Account Operations ===

    /// Creates an account together with its authentication key.
    ///
    /// Both rows are written in one transaction; a half-registered account
    /// (row without key, or key without row) can never be observed. A
    /// duplicate account identifier fails with [`StorageError::AlreadyExists`].
    pub fn create_account(&self, account: &NewAccount) -> Result<(), StorageError> {
        self.transaction(|s| {
            s.conn
                .execute(
                    "INSERT INTO accounts (uuid, name, created_at, last_seen, delete_after, locked)
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
                    params![
                        account.uuid.to_string(),
                        account.name,
                        account.created_at as i64,
                        account.created_at as i64,
                        account.delete_after,
                    ],
                )
                .map_err(|e| StorageError::on_conflict(e, "account"))?;
            s.conn
                .execute(
                    "INSERT INTO account_keys (account_id, key_pem, key_type) VALUES (?1, ?2, ?3)",
                    params![account.uuid.to_string(), account.key_pem, account.key_type],
                )
                .map_err(|e| StorageError::on_conflict(e, "account key"))?;
            Ok(())
        })
    }

    /// Loads an account by its identifier.
    pub fn load_account(&self, id: &Uuid) -> Result<Option<AccountRecord>, StorageError> {
        let result = self.conn.query_row(
            "SELECT uuid, name, created_at, last_seen, delete_after, locked
             FROM accounts WHERE uuid = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<u32>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        );
        match result {
            Ok((uuid, name, created_at, last_seen, delete_after, locked)) => {
                Ok(Some(AccountRecord {
                    uuid: parse_uuid(&uuid)?,
                    name,
                    created_at: created_at as u64,
                    last_seen: last_seen as u64,
                    delete_after,
                    locked,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Returns the authentication key on file for an account.
    pub fn account_key(&self, id: &Uuid) -> Result<Option<StoredKey>, StorageError> {
        let result = self.conn.query_row(
            "SELECT key_pem, key_type FROM account_keys WHERE account_id = ?1",
            params![id.to_string()],
            |row| {
                Ok(StoredKey {
                    pem: row.get(0)?,
                    key_type: row.get(1)?,
                })
            },
        );
        match result {
            Ok(key) => Ok(Some(key)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Binds an email/password credential to an account.
    ///
    /// An email already owned by a *different* account fails with
    /// [`StorageError::AlreadyExists`]; rebinding the same account replaces
    /// its credential.
    pub fn bind_login(
        &self,
        id: &Uuid,
        email: &str,
        password_hash: &str,
        now: u64,
    ) -> Result<(), StorageError> {
        self.transaction(|s| {
            let owner: Option<String> = match s.conn.query_row(
                "SELECT account_id FROM account_logins WHERE email = ?1",
                params![email],
                |row| row.get(0),
            ) {
                Ok(v) => Some(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(StorageError::Database(e)),
            };
            if let Some(owner) = owner {
                if owner != id.to_string() {
                    return Err(StorageError::AlreadyExists("email".into()));
                }
            }
            s.conn
                .execute(
                    "INSERT INTO account_logins (account_id, email, password_hash, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(account_id) DO UPDATE SET
                         email = excluded.email,
                         password_hash = excluded.password_hash",
                    params![id.to_string(), email, password_hash, now as i64],
                )
                .map_err(|e| StorageError::on_conflict(e, "email"))?;
            Ok(())
        })
    }

    /// Looks up the account id and password hash bound to an email.
    pub fn login_by_email(&self, email: &str) -> Result<Option<(Uuid, String)>, StorageError> {
        let result = self.conn.query_row(
            "SELECT account_id, password_hash FROM account_logins WHERE email = ?1",
            params![email],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );
        match result {
            Ok((id, hash)) => Ok(Some((parse_uuid(&id)?, hash))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Updates an account's last-seen timestamp.
    pub fn touch_last_seen(&self, id: &Uuid, now: u64) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE accounts SET last_seen = ?1 WHERE uuid = ?2",
            params![now as i64, id.to_string()],
        )?;
        Ok(())
    }
}

pub(super) fn parse_uuid(raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::Serialization(format!("invalid uuid: {e}")))
}
