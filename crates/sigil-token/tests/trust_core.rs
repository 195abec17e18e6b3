//! End-to-end tests for the key store, issuer and verifier together.
//!
//! Run with: cargo test --package sigil-token --test trust_core

use sigil_token::{
    ClaimValue, ErrorKind, ExtraClaims, IssueOptions, KeySource, KeyStore, TokenIssuer,
    TokenVerifier,
};
use tempfile::tempdir;

const ISSUER: &str = "https://jwt-factory/";

/// `create` followed by `get` yields the same pair; a second `create` replaces it.
#[test]
fn test_create_then_get_and_overwrite() {
    let dir = tempdir().unwrap();
    let store = KeyStore::new(dir.path());

    let first = store.create("servicea").unwrap();
    assert_eq!(
        store.get("servicea").unwrap().public_key_pem(),
        first.public_key_pem()
    );

    let second = store.create("servicea").unwrap();
    assert_ne!(first.public_key_pem(), second.public_key_pem());
    assert_eq!(
        store.get("servicea").unwrap().public_key_pem(),
        second.public_key_pem()
    );
    assert_eq!(store.identities(), vec!["servicea"]);
}

/// A token signed before a snapshot still verifies after a fresh load.
#[test]
fn test_snapshot_survives_restart() {
    let dir = tempdir().unwrap();
    let keys_dir = dir.path().join("keys");
    let issuer = TokenIssuer::with_validity_secs(ISSUER, 3600);
    let verifier = TokenVerifier::new(ISSUER);

    let token = {
        let store = KeyStore::new(&keys_dir);
        let pair = store.create("servicea").unwrap();
        let extra = ExtraClaims::from([("scope".to_string(), ClaimValue::from("read"))]);
        let token = issuer
            .issue(&pair, "servicea", "serviceb", &extra, IssueOptions::default())
            .unwrap();
        store.snapshot_to_durable_store().unwrap();
        token
    };

    let restarted = KeyStore::open(&keys_dir).unwrap();
    let result = verifier.verify_with(
        &token,
        Some("serviceb"),
        Some("servicea"),
        KeySource::Store {
            store: &restarted,
            identity: "servicea",
        },
    );
    assert!(result.is_valid(), "{:?}", result);
    assert_eq!(
        result.claims.unwrap().extra.get("scope"),
        Some(&ClaimValue::from("read"))
    );

    let ghost = verifier.verify_with(
        &token,
        Some("serviceb"),
        Some("servicea"),
        KeySource::Store {
            store: &restarted,
            identity: "ghost",
        },
    );
    assert_eq!(ghost.error_kind(), Some(ErrorKind::UnknownIdentity));
}
