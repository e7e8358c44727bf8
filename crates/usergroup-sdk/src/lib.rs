//! # User/Group SDK
//!
//! Client-side session management for the user/group administration
//! backend.
//!
//! The SDK provides:
//!
//! * [`SessionManager`]: log in, persist the decoded identity, answer
//!   "is there a valid session and who is it", log out.
//! * [`SessionStore`]: the storage contract the manager writes to, with
//!   [`MemorySessionStore`] and [`UnavailableSessionStore`] built in.
//! * [`claims::decode`]: local, unverified decoding of a token payload.
//! * [`UserApi`] / [`GroupApi`]: CRUD wrappers that attach the bearer
//!   credential to every request.
//! * [`ClientConfig`]: backend URL and storage namespace from the
//!   environment.
//!
//! Data types from [`usergroup_models`] are re-exported for convenience.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use usergroup_sdk::{password_hash, ClientConfig, MemorySessionStore, SessionManager};
//!
//! # async fn run() -> Result<(), usergroup_sdk::SdkError> {
//! let config = ClientConfig::from_env()?;
//! let session = SessionManager::from_config(MemorySessionStore::new(&config.app), &config);
//!
//! session
//!     .acquire(&config.backend_url, "admin", &password_hash("admin"))
//!     .await?;
//!
//! if session.is_current_user_admin() {
//!     println!("{} may administer users", session.current_user_name());
//! }
//! session.logout(&config.backend_url).await?;
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod password;
pub mod resources;
pub mod routes;
pub mod session;
pub mod store;

pub use config::ClientConfig;
pub use error::{AuthError, MalformedTokenError, SdkError, StoreError};
pub use password::password_hash;
pub use resources::{GroupApi, UserApi};
pub use routes::ApiRoutes;
pub use session::{RemoteStatus, SessionManager};
pub use store::{MemorySessionStore, SessionStore, UnavailableSessionStore};

// Re-export data types from usergroup-models for ergonomic usage.
pub use usergroup_models::{
    ClaimSet, Credential, Group, GroupIds, NewGroup, NewUser, PersistedSession, SessionField,
    User, UserClaims,
};
