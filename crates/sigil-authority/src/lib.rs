//! # sigil-authority
//!
//! The central token authority.
//!
//! The authority holds a key pair for every registered participant and acts
//! as a trusted third party: a caller asks it for a token signed with the
//! caller's key, and the callee asks it whether a presented token is good.
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `POST /keys/{identity}` | Generate and store a key pair |
//! | `POST /issueToken/{identity}?expired=true` | Issue a token signed with that identity's key |
//! | `POST /verify/{identity}` | Verify a token against that identity's key |
//! | `GET /utils/publicKey/{identity}` | Fetch a public key |
//! | `GET /utils/keys` | List identities |
//! | `POST /utils/dump` | Write all keys to the key directory |

pub mod api;
pub mod authority;
pub mod error;
pub mod server;

pub use api::create_router;
pub use authority::Authority;
pub use error::AuthorityError;
pub use server::AuthorityServer;
