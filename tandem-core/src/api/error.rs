// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the Tandem facade.

use thiserror::Error;

use crate::account::AccountError;
use crate::assertion::AssertionError;
use crate::session::SessionError;
use crate::storage::StorageError;
use crate::sync::SyncError;

/// Unified error type for Tandem operations.
#[derive(Error, Debug)]
pub enum TandemError {
    /// Assertion validation failed.
    #[error("assertion error: {0}")]
    Assertion(#[from] AssertionError),

    /// Account operation failed.
    #[error("account error: {0}")]
    Account(#[from] AccountError),

    /// Session operation failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Sync operation failed.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for Tandem operations.
pub type TandemResult<T> = Result<T, TandemError>;
