// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Storage error types.

use thiserror::Error;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

impl StorageError {
    /// Maps a SQLite unique-constraint failure to [`StorageError::AlreadyExists`],
    /// leaving every other error untouched.
    pub(crate) fn on_conflict(err: rusqlite::Error, what: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::AlreadyExists(what.to_string())
            }
            e => StorageError::Database(e),
        }
    }
}
