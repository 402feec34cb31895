// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proof-of-Possession Assertions
//!
//! Validates the short-lived, self-signed JWS claim sets clients submit to
//! prove control of a private key. An assertion never grants anything by
//! itself: for registration it is checked against the key submitted in the
//! same request, for login against the key already on file for the claimed
//! account. Validation is pure - no side effects, no storage access.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

/// Assertion validation error types.
#[derive(Error, Debug)]
pub enum AssertionError {
    #[error("unsupported key type")]
    UnsupportedKeyType,

    #[error("audience does not include this server")]
    AudienceMismatch,

    #[error("assertion expired")]
    Expired,

    #[error("assertion not yet valid")]
    NotYetValid,

    #[error("purpose mismatch")]
    PurposeMismatch,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("key material rejected: {0}")]
    InvalidKey(String),

    #[error("malformed assertion: {0}")]
    Malformed(String),
}

/// The purpose an assertion was issued for, carried in its `sub` claim.
///
/// `Register` assertions are verified against the caller-supplied key,
/// `Login` assertions against the stored one. The two must stay distinct
/// code paths so a "registration" can never impersonate an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Register,
    Login,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Register => "register",
            Purpose::Login => "login",
        }
    }
}

/// Supported key material formats for account keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    EcPem,
    RsaPem,
}

impl KeyType {
    /// Storage tag for this key type.
    pub fn tag(self) -> i64 {
        match self {
            KeyType::EcPem => 1,
            KeyType::RsaPem => 2,
        }
    }

    /// Reverses [`KeyType::tag`]. Unknown tags yield `None`.
    pub fn from_tag(tag: i64) -> Option<Self> {
        match tag {
            1 => Some(KeyType::EcPem),
            2 => Some(KeyType::RsaPem),
            _ => None,
        }
    }

    /// Signature algorithms accepted for this key family.
    ///
    /// EC and RSA families are validated with disjoint lists; mixing them in
    /// one validation would let a caller downgrade the expected scheme.
    fn algorithms(self) -> Vec<Algorithm> {
        match self {
            KeyType::EcPem => vec![Algorithm::ES256, Algorithm::ES384],
            KeyType::RsaPem => vec![Algorithm::RS256, Algorithm::RS384, Algorithm::RS512],
        }
    }
}

/// The claim set carried by a proof-of-possession assertion.
///
/// `iss` is the account identifier the caller asserts control over, `sub`
/// the purpose string, `aud` an array that must contain the server identity.
/// `name` and `delete_after` are registration metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub aud: Vec<String>,
    pub nbf: u64,
    pub iat: u64,
    pub exp: u64,
    pub sub: String,
    pub iss: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_after: Option<u32>,
}

/// Validates proof-of-possession assertions against a key, the server
/// identity and a narrow time window.
#[derive(Debug, Clone)]
pub struct AssertionVerifier {
    server_id: String,
    leeway: u64,
}

impl AssertionVerifier {
    /// Creates a verifier for the given server identity.
    ///
    /// `leeway_secs` is the clock tolerance applied to `exp` and `nbf`;
    /// the window is kept narrow so a captured assertion is useless once
    /// the few-second validity has passed.
    pub fn new(server_id: Uuid, leeway_secs: u64) -> Self {
        AssertionVerifier {
            server_id: server_id.to_string(),
            leeway: leeway_secs,
        }
    }

    /// Validates `token` against `key_pem` for the given purpose.
    ///
    /// Checks run in a fixed order so callers get the most specific error:
    /// claim-set decode, validity window, audience, purpose, then signature.
    /// Returns the claim set on success.
    pub fn verify(
        &self,
        token: &str,
        key_pem: &[u8],
        key_type: KeyType,
        purpose: Purpose,
    ) -> Result<AssertionClaims, AssertionError> {
        let claims = decode_claims_unverified(token)?;
        let now = current_timestamp();

        if claims.exp.saturating_add(self.leeway) < now {
            trace!(exp = claims.exp, now, "assertion expired");
            return Err(AssertionError::Expired);
        }
        if claims.nbf > now.saturating_add(self.leeway) {
            trace!(nbf = claims.nbf, now, "assertion not yet valid");
            return Err(AssertionError::NotYetValid);
        }
        if !claims.aud.iter().any(|a| a == &self.server_id) {
            debug!(?claims.aud, "assertion audience does not name this server");
            return Err(AssertionError::AudienceMismatch);
        }
        if claims.sub != purpose.as_str() {
            return Err(AssertionError::PurposeMismatch);
        }
        if purpose == Purpose::Register && claims.name.is_none() {
            return Err(AssertionError::Malformed("missing name claim".into()));
        }

        let key = match key_type {
            KeyType::EcPem => DecodingKey::from_ec_pem(key_pem),
            KeyType::RsaPem => DecodingKey::from_rsa_pem(key_pem),
        }
        .map_err(|e| AssertionError::InvalidKey(e.to_string()))?;

        let algorithms = key_type.algorithms();
        let mut validation = Validation::new(algorithms[0]);
        validation.algorithms = algorithms;
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_audience(&[self.server_id.as_str()]);
        validation.sub = Some(purpose.as_str().to_owned());
        validation.set_required_spec_claims(&["exp", "nbf", "aud", "sub"]);

        let data = decode::<AssertionClaims>(token, &key, &validation).map_err(map_jwt_error)?;
        trace!(iss = %data.claims.iss, sub = %data.claims.sub, "assertion verified");
        Ok(data.claims)
    }
}

/// Decodes the claim set without checking the signature.
///
/// Used to order claim checks ahead of signature verification; never trust
/// the result without a subsequent verified decode.
fn decode_claims_unverified(token: &str) -> Result<AssertionClaims, AssertionError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AssertionError::Malformed("not a compact JWS".into()));
    };
    let raw = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AssertionError::Malformed(e.to_string()))?;
    serde_json::from_slice(&raw).map_err(|e| AssertionError::Malformed(e.to_string()))
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AssertionError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AssertionError::Expired,
        ErrorKind::ImmatureSignature => AssertionError::NotYetValid,
        ErrorKind::InvalidAudience => AssertionError::AudienceMismatch,
        ErrorKind::InvalidSubject => AssertionError::PurposeMismatch,
        ErrorKind::InvalidSignature => AssertionError::InvalidSignature,
        ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            AssertionError::InvalidKey(err.to_string())
        }
        _ => AssertionError::Malformed(err.to_string()),
    }
}

/// Returns the current Unix timestamp in seconds.
/// Falls back to 0 if the system clock is before UNIX_EPOCH (should never happen).
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
