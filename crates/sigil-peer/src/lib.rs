//! # sigil-peer
//!
//! A participant service in a Sigil deployment.
//!
//! Every participant is both a caller and a callee. As a caller it obtains a
//! token addressed to a target and presents it as `Authorization: Bearer`.
//! As a callee it checks that the claimed caller is trusted and verifies the
//! token with `aud` set to its own identity.
//!
//! | Model | Token source | Verification |
//! |-------|--------------|--------------|
//! | **authority** | `POST {authority}/issueToken/{me}` | `POST {authority}/verify/{caller}` |
//! | **direct** | Signed locally with own private key | Caller's public key from `keys_dir` |
//!
//! Each model has a single-target and a fan-out flow. Fan-out legs run
//! concurrently and fail independently.

pub mod api;
pub mod authority_client;
pub mod bearer;
pub mod direct;
pub mod error;
pub mod flows;
pub mod server;
pub mod state;

pub use api::create_router;
pub use authority_client::{HttpAuthorityClient, TokenAuthority};
pub use direct::DirectTrust;
pub use error::PeerError;
pub use flows::{CallOutcome, FanOutReport, TrustModel};
pub use server::PeerServer;
pub use state::PeerState;
