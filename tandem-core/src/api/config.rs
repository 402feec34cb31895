// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types.

use uuid::Uuid;

/// Default session time-to-live: 14 days.
const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;
/// Default assertion clock leeway in seconds.
const DEFAULT_ASSERTION_LEEWAY_SECS: u64 = 5;
/// Default tolerance for client `changed` timestamps ahead of server time.
const DEFAULT_CLOCK_SKEW_GRACE_SECS: u64 = 5;
/// Default maximum byte length of a single payload field.
const DEFAULT_MAX_FIELD_LEN: usize = 255;
/// Default maximum number of meanings per entry.
const DEFAULT_MAX_MEANINGS: usize = 64;

/// Service configuration.
///
/// `server_id` is the server's own identity: the value assertions must name
/// in their `aud` claim. It is published via `server_info` so clients can
/// target their proofs.
#[derive(Debug, Clone)]
pub struct TandemConfig {
    pub server_id: Uuid,
    pub session_ttl_secs: u64,
    pub assertion_leeway_secs: u64,
    pub clock_skew_grace_secs: u64,
    pub max_field_len: usize,
    pub max_meanings: usize,
}

impl TandemConfig {
    /// Creates a configuration with the given server identity and defaults
    /// for everything else.
    pub fn new(server_id: Uuid) -> Self {
        TandemConfig {
            server_id,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            assertion_leeway_secs: DEFAULT_ASSERTION_LEEWAY_SECS,
            clock_skew_grace_secs: DEFAULT_CLOCK_SKEW_GRACE_SECS,
            max_field_len: DEFAULT_MAX_FIELD_LEN,
            max_meanings: DEFAULT_MAX_MEANINGS,
        }
    }
}

impl Default for TandemConfig {
    /// Random server identity; real deployments pass their stable one.
    fn default() -> Self {
        TandemConfig::new(Uuid::new_v4())
    }
}
