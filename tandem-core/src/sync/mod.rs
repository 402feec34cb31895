// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Multi-Device Synchronization Module
//!
//! Reconciles changed and deleted list/entry records submitted by the
//! devices of one account. Merge is last-writer-wins on the client-side
//! `changed` timestamp - strictly greater wins, ties keep the stored
//! version - and tombstones are terminal: once an identifier is deleted it
//! never comes back. Each record in a batch succeeds or fails on its own.

mod engine;
mod models;

pub use engine::{SyncEngine, SyncError};
pub use models::{
    EntryChangedRequest, EntryChangedResponse, EntryDeletedRequest, EntryDeletedResponse,
    EntryDeletion, EntryRecord, ListChangedRequest, ListChangedResponse, ListDeletedRequest,
    ListDeletedResponse, ListDeletion, ListRecord, Meaning, RecordFailure,
};
