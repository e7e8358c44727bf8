//! Session acquisition, persistence and validity.
//!
//! [`SessionManager`] owns the whole authenticated-identity lifecycle on
//! the client side:
//!
//! 1. [`acquire`](SessionManager::acquire) posts the credential to
//!    `/login`, decodes the returned token locally and writes every derived
//!    field to the injected [`SessionStore`].
//! 2. Reads ([`is_session_valid`](SessionManager::is_session_valid),
//!    [`authorization_header_value`](SessionManager::authorization_header_value)
//!    and the `current_user_*` accessors) go back to the store on every
//!    call and fail closed to a sentinel value. An expired session found
//!    during a read is removed on the spot.
//! 3. [`logout`](SessionManager::logout) notifies the backend and clears
//!    the store.
//!
//! Nothing is cached in memory: a session cleared by other code sharing
//! the store is noticed on the next read.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use usergroup_sdk::{password_hash, MemorySessionStore, SessionManager};
//!
//! # async fn run() -> Result<(), usergroup_sdk::AuthError> {
//! let session = SessionManager::new(MemorySessionStore::new("MyApp"));
//! session
//!     .acquire("http://localhost:8080", "admin", &password_hash("secret"))
//!     .await?;
//!
//! assert!(session.is_session_valid());
//! println!("logged in as {}", session.current_user_login());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{error, info, trace, warn};
use usergroup_models::{parse_epoch_seconds, Credential, GroupIds, PersistedSession, SessionField};

use crate::claims;
use crate::config::ClientConfig;
use crate::error::{server_message, AuthError, MalformedTokenError, StoreError};
use crate::routes::{ApiRoutes, DEFAULT_RESTRICTED_PREFIX};
use crate::store::SessionStore;

/// Fields that must all be present for a session to count as valid.
const REQUIRED_FIELDS: [SessionField; 4] = [
    SessionField::Token,
    SessionField::UserId,
    SessionField::IsAdmin,
    SessionField::Email,
];

/// Body of a successful `POST /login`.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Successful answer of the backend's token status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStatus {
    /// HTTP status code (2xx).
    pub status: u16,
    /// Expiry reported by the backend, if the body carried a usable `exp`.
    pub expires_at: Option<DateTime<Utc>>,
    /// Full response body.
    pub data: serde_json::Value,
}

/// Client-side session manager.
///
/// Generic over its storage so tests and non-browser hosts can inject
/// their own medium.
pub struct SessionManager<S> {
    store: S,
    http: reqwest::Client,
    restricted_prefix: String,
}

impl<S: SessionStore> SessionManager<S> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Manager over `store` using the default restricted prefix (`api`).
    pub fn new(store: S) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            restricted_prefix: DEFAULT_RESTRICTED_PREFIX.to_string(),
        }
    }

    /// Manager over `store` using the restricted prefix from `config`.
    pub fn from_config(store: S, config: &ClientConfig) -> Self {
        Self::new(store).with_restricted_prefix(&config.restricted_prefix)
    }

    /// Use a different path segment for authenticated endpoints.
    #[must_use]
    pub fn with_restricted_prefix(mut self, prefix: &str) -> Self {
        self.restricted_prefix = prefix.to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots…).
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn routes(&self, base_url: &str) -> ApiRoutes {
        ApiRoutes::new(base_url, &self.restricted_prefix)
    }

    // ------------------------------------------------------------------
    // Acquisition
    // ------------------------------------------------------------------

    /// Log in and persist the resulting session.
    ///
    /// On any failure the store is left untouched. On hosts without
    /// storage the decoded session is still returned but nothing is
    /// persisted, so later reads report "no session".
    pub async fn acquire(
        &self,
        base_url: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<PersistedSession, AuthError> {
        self.acquire_with(base_url, &Credential::new(username, password_hash))
            .await
    }

    /// [`acquire`](Self::acquire) with a prebuilt [`Credential`].
    pub async fn acquire_with(
        &self,
        base_url: &str,
        credential: &Credential,
    ) -> Result<PersistedSession, AuthError> {
        let url = self.routes(base_url).login();
        trace!(url = %url, username = %credential.username, "acquiring session");

        let response = match self.http.post(&url).json(credential).send().await {
            Ok(response) => response,
            Err(source) => {
                error!(url = %url, error = %source, "login request got no response");
                return Err(AuthError::NetworkFailure { url, source });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), "login rejected");
            return Err(AuthError::ServerRejected {
                url,
                status: status.as_u16(),
                message: server_message(&body),
            });
        }
        if status != StatusCode::OK {
            warn!(url = %url, status = status.as_u16(), "login answered with a non-200 success status");
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let claims = claims::decode(&body.token)?;
        let session = PersistedSession::from_claims(&body.token, &claims)
            .map_err(MalformedTokenError::from)?;

        info!(
            user_id = session.user_id,
            login = %session.login,
            expires_at = %session.expires_at,
            "session acquired"
        );

        match self.persist(&session) {
            Ok(()) => {}
            Err(AuthError::UnsupportedStorage) => {
                warn!("no session storage on this host; session is not persisted");
            }
            Err(e) => return Err(e),
        }

        Ok(session)
    }

    fn persist(&self, session: &PersistedSession) -> Result<(), AuthError> {
        if !self.store.is_available() {
            return Err(AuthError::UnsupportedStorage);
        }
        match self.store.write(session) {
            Ok(()) => Ok(()),
            Err(StoreError::Unavailable) => Err(AuthError::UnsupportedStorage),
            Err(e) => {
                // Never leave a half-written session behind.
                self.store.remove_all();
                Err(AuthError::Storage(e))
            }
        }
    }

    // ------------------------------------------------------------------
    // Remote checks
    // ------------------------------------------------------------------

    /// Ask the backend whether the current token is still honored.
    ///
    /// Independent of local expiry: the backend may reject a token that
    /// looks valid locally (deactivated account, server-side logout…).
    pub async fn check_remote_status(&self, base_url: &str) -> Result<RemoteStatus, AuthError> {
        let url = self.routes(base_url).status();
        trace!(url = %url, "checking remote token status");

        let response = match self.authorized(self.http.get(&url)).send().await {
            Ok(response) => response,
            Err(source) => {
                error!(url = %url, error = %source, "status request got no response");
                return Err(AuthError::NetworkFailure { url, source });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), "token rejected by backend");
            return Err(AuthError::ServerRejected {
                url,
                status: status.as_u16(),
                message: server_message(&body),
            });
        }

        let data: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
        let expires_at = data
            .get("exp")
            .and_then(serde_json::Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        match expires_at {
            Some(exp) => info!(expires_at = %exp, "backend reports token valid"),
            None => info!("backend reports token valid without expiry"),
        }

        Ok(RemoteStatus {
            status: status.as_u16(),
            expires_at,
            data,
        })
    }

    /// Notify the backend and clear the local session.
    ///
    /// The local session is cleared whatever the remote outcome; a remote
    /// failure is still reported to the caller.
    pub async fn logout(&self, base_url: &str) -> Result<(), AuthError> {
        let url = self.routes(base_url).logout();
        trace!(url = %url, "logging out");

        let result = match self.authorized(self.http.get(&url)).send().await {
            Err(source) => {
                error!(url = %url, error = %source, "logout request got no response");
                Err(AuthError::NetworkFailure { url, source })
            }
            Ok(response) if !response.status().is_success() => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                error!(url = %url, status, "logout rejected");
                Err(AuthError::ServerRejected {
                    url,
                    status,
                    message: server_message(&body),
                })
            }
            Ok(_) => {
                info!("logged out");
                Ok(())
            }
        };

        self.invalidate();
        result
    }

    /// Attach the bearer credential, if any, to an outgoing request.
    pub(crate) fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let header = self.authorization_header_value();
        if header.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, header)
        }
    }

    // ------------------------------------------------------------------
    // Local state
    // ------------------------------------------------------------------

    /// Whether a usable session is stored. Never touches the network.
    ///
    /// Requires token, user id, admin flag and e-mail. An expired session
    /// is removed and reported invalid. A session without any expiry field
    /// is reported valid; only [`check_remote_status`](Self::check_remote_status)
    /// can tell whether the backend still accepts it.
    pub fn is_session_valid(&self) -> bool {
        if !self.store.is_available() {
            return false;
        }
        if REQUIRED_FIELDS
            .iter()
            .any(|field| self.store.read_field(*field).is_none())
        {
            return false;
        }

        let Some(raw) = self.store.read_field(SessionField::Expiration) else {
            warn!("stored session has no expiry; treating it as valid");
            return true;
        };

        match parse_epoch_seconds(&raw) {
            Ok(expires_at) if Utc::now() > expires_at => {
                warn!(expired_at = %expires_at, "session expired");
                self.invalidate();
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "stored expiry is unreadable; clearing session");
                self.invalidate();
                false
            }
        }
    }

    /// Remove every stored session field. Idempotent.
    pub fn invalidate(&self) {
        trace!("clearing stored session");
        self.store.remove_all();
    }

    /// `"Bearer {token}"` when a valid session exists, else `""`.
    ///
    /// Resource wrappers call this before every request.
    pub fn authorization_header_value(&self) -> String {
        self.valid_field(SessionField::Token)
            .map(|token| format!("Bearer {token}"))
            .unwrap_or_default()
    }

    /// Every stored field, if the session is valid and fully decodable.
    pub fn current_session(&self) -> Option<PersistedSession> {
        if !self.is_session_valid() {
            return None;
        }
        match PersistedSession::from_fields(|field| self.store.read_field(field)) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "stored session cannot be decoded");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    /// Current user id, `0` without a valid session.
    pub fn current_user_id(&self) -> i64 {
        self.valid_field(SessionField::UserId)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Current user e-mail, `""` without a valid session.
    pub fn current_user_email(&self) -> String {
        self.valid_field(SessionField::Email).unwrap_or_default()
    }

    /// Current user display name, `""` without a valid session.
    pub fn current_user_name(&self) -> String {
        self.valid_field(SessionField::Name).unwrap_or_default()
    }

    /// Current user login, `""` without a valid session.
    pub fn current_user_login(&self) -> String {
        self.valid_field(SessionField::Login).unwrap_or_default()
    }

    /// Current user external id, `""` without a valid session.
    pub fn current_user_external_id(&self) -> String {
        self.valid_field(SessionField::ExternalId)
            .unwrap_or_default()
    }

    /// Whether the current user is an administrator; `false` without a
    /// valid session.
    pub fn is_current_user_admin(&self) -> bool {
        self.valid_field(SessionField::IsAdmin)
            .is_some_and(|v| v == "true")
    }

    /// First group of the current user, `None` without groups or session.
    pub fn current_user_primary_group_id(&self) -> Option<i64> {
        self.group_ids().and_then(|ids| ids.primary())
    }

    /// All groups of the current user, `None` without groups or session.
    pub fn current_user_group_ids(&self) -> Option<Vec<i64>> {
        self.group_ids().map(GroupIds::into_vec)
    }

    /// Whether the current user belongs to at least one real group.
    pub fn has_any_groups(&self) -> bool {
        self.group_ids().is_some_and(|ids| ids.has_any())
    }

    fn valid_field(&self, field: SessionField) -> Option<String> {
        if self.is_session_valid() {
            self.store.read_field(field)
        } else {
            None
        }
    }

    fn group_ids(&self) -> Option<GroupIds> {
        let raw = self.valid_field(SessionField::Groups)?;
        match raw.parse::<GroupIds>() {
            Ok(ids) if ids.is_empty() => None,
            Ok(ids) => Some(ids),
            Err(e) => {
                warn!(error = %e, "ignoring malformed stored group ids");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
