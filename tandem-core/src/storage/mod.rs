// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! Durable state for accounts, credentials, sessions and sync data.
//! Uses SQLite; one [`Storage`] owns one connection. Callers that share a
//! `Storage` across request handlers serialize access to it (see the
//! `Tandem` facade), which is what makes the read-compare-write merge in
//! the sync engine atomic per entity.

mod accounts;
mod entries;
mod error;
mod lists;
mod sessions;

pub mod migration;

pub use accounts::{AccountRecord, NewAccount, StoredKey};
pub use error::StorageError;
pub use sessions::SessionRecord;

use std::path::Path;

use rusqlite::Connection;

/// SQLite-based storage implementation.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let storage = Storage { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        let storage = Storage { conn };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Applies connection-level PRAGMAs so behavior does not depend on the
    /// build-time defaults of the linked SQLite. The schema declares
    /// `REFERENCES` clauses for documentation, but the code does not rely on
    /// SQLite enforcing them (some builds ship with `SQLITE_DEFAULT_FOREIGN_KEYS=1`).
    fn configure(conn: &Connection) -> Result<(), StorageError> {
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(())
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StorageError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn)
    }

    /// Runs `f` inside a SQLite transaction, committing on `Ok` and rolling
    /// back on `Err`.
    pub(crate) fn transaction<T, E>(
        &self,
        f: impl FnOnce(&Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE;")
            .map_err(|e| E::from(StorageError::from(e)))?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT;")
                    .map_err(|e| E::from(StorageError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}
