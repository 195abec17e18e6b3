//! Shared key material for unit tests.
//!
//! RSA generation is expensive, so each test process generates two pairs
//! once and hands out clones.

use crate::keys::KeyPair;
use std::sync::LazyLock;

static SIGNER: LazyLock<KeyPair> =
    LazyLock::new(|| KeyPair::generate("servicea").expect("test keypair"));

static OTHER: LazyLock<KeyPair> =
    LazyLock::new(|| KeyPair::generate("serviceb").expect("test keypair"));

/// Key pair for identity `servicea`.
pub fn signer() -> KeyPair {
    SIGNER.clone()
}

/// Key pair for identity `serviceb`.
pub fn other() -> KeyPair {
    OTHER.clone()
}
