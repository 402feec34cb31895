// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Versioned SQL migrations with transactional safety. The runner tracks
//! applied versions in a `schema_version` table and runs pending migrations
//! in order within a single transaction.

use rusqlite::Connection;

use super::StorageError;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// The SQL to run.
    pub sql: &'static str,
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations in a transaction.
    ///
    /// Creates the `schema_version` table if it doesn't exist, then applies
    /// any migrations whose version is greater than the current schema
    /// version. If any migration fails, all changes are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StorageError::Migration(format!(
                    "migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                )));
            }

            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);

            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now as i64],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "failed to record migration v{}: {}",
                    migration.version, e
                )));
            }
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Returns the current schema version, or 0 if no migrations have been applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap_or(None);

        Ok(version.unwrap_or(0))
    }
}

/// Returns all registered migrations in version order.
///
/// This is the single source of truth for the database schema.
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "accounts_and_auth",
            sql: MIGRATION_V1_ACCOUNTS,
        },
        Migration {
            version: 2,
            name: "sync_state",
            sql: MIGRATION_V2_SYNC,
        },
    ]
}

/// Migration v1: accounts, credential store and sessions.
///
/// Account identifiers are client-generated UUIDs; the primary key is the
/// unique constraint the registration path relies on. The email column is
/// the secondary unique lookup key once a password credential is bound.
const MIGRATION_V1_ACCOUNTS: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        uuid TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        last_seen INTEGER NOT NULL,
        delete_after INTEGER,
        locked TEXT
    );

    CREATE TABLE IF NOT EXISTS account_keys (
        account_id TEXT PRIMARY KEY REFERENCES accounts(uuid),
        key_pem BLOB NOT NULL,
        key_type INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS account_logins (
        account_id TEXT PRIMARY KEY REFERENCES accounts(uuid),
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        account_id TEXT NOT NULL REFERENCES accounts(uuid),
        issued_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions(account_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);
";

/// Migration v2: per-account sync state - live lists and entries plus the
/// permanent tombstones that outrank them. `last_writer` columns carry the
/// submitting device identifier as provenance only.
const MIGRATION_V2_SYNC: &str = "
    CREATE TABLE IF NOT EXISTS lists (
        uuid TEXT PRIMARY KEY,
        account_id TEXT NOT NULL REFERENCES accounts(uuid),
        name TEXT NOT NULL,
        name_a TEXT NOT NULL,
        name_b TEXT NOT NULL,
        changed INTEGER NOT NULL,
        created INTEGER NOT NULL,
        last_writer TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entries (
        uuid TEXT PRIMARY KEY,
        list_id TEXT NOT NULL,
        account_id TEXT NOT NULL REFERENCES accounts(uuid),
        tip TEXT NOT NULL,
        meanings_json TEXT NOT NULL,
        changed INTEGER NOT NULL,
        last_writer TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS list_tombstones (
        account_id TEXT NOT NULL,
        list_id TEXT NOT NULL,
        deleted_at INTEGER NOT NULL,
        last_writer TEXT NOT NULL,
        PRIMARY KEY (account_id, list_id)
    );

    CREATE TABLE IF NOT EXISTS entry_tombstones (
        account_id TEXT NOT NULL,
        list_id TEXT NOT NULL,
        entry_id TEXT NOT NULL,
        deleted_at INTEGER NOT NULL,
        last_writer TEXT NOT NULL,
        PRIMARY KEY (account_id, list_id, entry_id)
    );

    CREATE INDEX IF NOT EXISTS idx_lists_account_changed ON lists(account_id, changed);
    CREATE INDEX IF NOT EXISTS idx_entries_account_changed ON entries(account_id, changed);
    CREATE INDEX IF NOT EXISTS idx_entries_list ON entries(list_id);
    CREATE INDEX IF NOT EXISTS idx_list_tombstones_time ON list_tombstones(account_id, deleted_at);
    CREATE INDEX IF NOT EXISTS idx_entry_tombstones_time ON entry_tombstones(account_id, deleted_at);
";
