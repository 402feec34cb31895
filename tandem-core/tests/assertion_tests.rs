// SPDX-FileCopyrightText: 2026 Tandem Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for proof-of-possession assertion validation.

mod common;

use common::fixtures::*;
use jsonwebtoken::Algorithm;
use tandem_core::{AssertionError, AssertionVerifier, KeyType, Purpose};
use uuid::Uuid;

const LEEWAY: u64 = 5;

fn verifier(server_id: Uuid) -> AssertionVerifier {
    AssertionVerifier::new(server_id, LEEWAY)
}

#[test]
fn valid_register_assertion_returns_claims() {
    let server_id = Uuid::new_v4();
    let account = Uuid::new_v4();
    let proof = ProofBuilder::register(account, server_id)
        .delete_after(Some(30))
        .build();

    let claims = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap();

    assert_eq!(claims.iss, account);
    assert_eq!(claims.sub, "register");
    assert_eq!(claims.name.as_deref(), Some("Test User"));
    assert_eq!(claims.delete_after, Some(30));
}

#[test]
fn expired_assertion_fails() {
    let server_id = Uuid::new_v4();
    let now = unix_now();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .window(now - 120, now - 60)
        .build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::Expired));
}

#[test]
fn expired_assertion_fails_even_with_bad_signature() {
    // Expiry is checked before the signature: a stale capture is rejected
    // as expired no matter what key signed it.
    let server_id = Uuid::new_v4();
    let now = unix_now();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .window(now - 120, now - 60)
        .signed_with(EC_ALT_PRIVATE_PEM, Algorithm::ES256)
        .build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::Expired));
}

#[test]
fn not_yet_valid_assertion_fails() {
    let server_id = Uuid::new_v4();
    let now = unix_now();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .window(now + 60, now + 120)
        .build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::NotYetValid));
}

#[test]
fn audience_mismatch_fails_despite_valid_signature() {
    let server_id = Uuid::new_v4();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .audience(vec![Uuid::new_v4().to_string()])
        .build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::AudienceMismatch));
}

#[test]
fn audience_array_may_contain_other_servers() {
    let server_id = Uuid::new_v4();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .audience(vec![Uuid::new_v4().to_string(), server_id.to_string()])
        .build();

    assert!(verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .is_ok());
}

#[test]
fn purpose_mismatch_fails() {
    let server_id = Uuid::new_v4();
    let proof = ProofBuilder::new("login", Uuid::new_v4(), server_id).build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::PurposeMismatch));
}

#[test]
fn wrong_key_fails_signature_check() {
    let server_id = Uuid::new_v4();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .signed_with(EC_ALT_PRIVATE_PEM, Algorithm::ES256)
        .build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::InvalidSignature));
}

#[test]
fn register_without_name_claim_is_malformed() {
    let server_id = Uuid::new_v4();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id)
        .name(None)
        .build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::Malformed(_)));
}

#[test]
fn login_without_name_claim_is_fine() {
    let server_id = Uuid::new_v4();
    let account = Uuid::new_v4();
    let proof = ProofBuilder::login(account, server_id).name(None).build();

    let claims = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Login,
        )
        .unwrap();
    assert_eq!(claims.iss, account);
    assert_eq!(claims.name, None);
}

#[test]
fn garbage_token_is_malformed() {
    let server_id = Uuid::new_v4();
    let err = verifier(server_id)
        .verify(
            "not-a-jws-at-all",
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::EcPem,
            Purpose::Login,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::Malformed(_)));
}

#[test]
fn rsa_assertion_verifies_with_rsa_key_type() {
    let server_id = Uuid::new_v4();
    let account = Uuid::new_v4();
    let proof = ProofBuilder::register(account, server_id)
        .signed_with(RSA_PRIVATE_PEM, Algorithm::RS256)
        .build();

    let claims = verifier(server_id)
        .verify(
            &proof,
            RSA_PUBLIC_PEM.as_bytes(),
            KeyType::RsaPem,
            Purpose::Register,
        )
        .unwrap();
    assert_eq!(claims.iss, account);
}

#[test]
fn ec_key_declared_as_rsa_is_rejected() {
    let server_id = Uuid::new_v4();
    let proof = ProofBuilder::register(Uuid::new_v4(), server_id).build();

    let err = verifier(server_id)
        .verify(
            &proof,
            EC_PUBLIC_PEM.as_bytes(),
            KeyType::RsaPem,
            Purpose::Register,
        )
        .unwrap_err();
    assert!(matches!(err, AssertionError::InvalidKey(_)));
}
