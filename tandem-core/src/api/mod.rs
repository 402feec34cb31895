// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tandem API Layer
//!
//! High-level facade for the Tandem server core. A transport layer (HTTP
//! router, test harness, embedded host) talks to [`Tandem`] and nothing
//! else; the facade authenticates sessions and dispatches to the account
//! service and sync engine.
//!
//! # Module Structure
//!
//! - `error` - Unified error type for the facade
//! - `config` - Configuration types
//! - `tandem` - Main Tandem orchestrator

mod config;
mod error;
mod tandem;

pub use config::TandemConfig;
pub use error::{TandemError, TandemResult};
pub use tandem::{ServerInfo, Tandem};
