#![deny(missing_docs)]

//! # User/Group Models
//!
//! Core data types for the user/group administration client.
//!
//! ## Session data flow
//!
//! ```text
//! Credential ──POST /login──▶ token
//!                              │ decode middle segment
//!                              ▼
//!                           ClaimSet { exp, User: UserClaims }
//!                              │ PersistedSession::from_claims
//!                              ▼
//!                           PersistedSession ──▶ SessionField keys in the store
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`claims`] | `ClaimSet` and `UserClaims` as carried inside a token |
//! | [`credential`] | Login credential sent to the backend |
//! | [`session`] | `PersistedSession`, `SessionField` storage keys, `GroupIds` codec |
//! | [`resource`] | `User` and `Group` resources exchanged with the CRUD endpoints |

pub mod claims;
pub mod credential;
pub mod error;
pub mod resource;
pub mod session;

// Re-export all public types at crate root for convenience.
pub use claims::*;
pub use credential::*;
pub use error::*;
pub use resource::*;
pub use session::*;
