//! Canonical endpoint paths of the user/group backend.
//!
//! All URLs requested by the SDK are built through [`ApiRoutes`] so the
//! session manager and the resource wrappers agree on a single layout.
//!
//! # Path layout
//!
//! ```text
//! {base}/login                       ← public, POST credentials
//! {base}/{prefix}/status             ← bearer, token liveness
//! {base}/{prefix}/logout             ← bearer
//! {base}/{prefix}/users[/{id}]       ← bearer, user CRUD
//! {base}/{prefix}/groups[/{id}]      ← bearer, group CRUD
//! ```

/// Default path segment guarding authenticated endpoints.
pub const DEFAULT_RESTRICTED_PREFIX: &str = "api";

/// URL builder for one backend.
///
/// # Examples
///
/// ```
/// use usergroup_sdk::ApiRoutes;
///
/// let routes = ApiRoutes::new("http://localhost:8080/", "api");
/// assert_eq!(routes.login(), "http://localhost:8080/login");
/// assert_eq!(routes.status(), "http://localhost:8080/api/status");
/// assert_eq!(routes.user(7), "http://localhost:8080/api/users/7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    base_url: String,
    restricted_prefix: String,
}

impl ApiRoutes {
    /// Routes for `base_url`, with restricted endpoints under `restricted_prefix`.
    ///
    /// Trailing slashes on the base and surrounding slashes on the prefix
    /// are ignored.
    pub fn new(base_url: &str, restricted_prefix: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            restricted_prefix: restricted_prefix.trim_matches('/').to_string(),
        }
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The normalized restricted prefix.
    pub fn restricted_prefix(&self) -> &str {
        &self.restricted_prefix
    }

    // ------------------------------------------------------------------
    // Session endpoints
    // ------------------------------------------------------------------

    /// Public login endpoint.
    pub fn login(&self) -> String {
        format!("{}/login", self.base_url)
    }

    /// Token liveness endpoint.
    pub fn status(&self) -> String {
        self.restricted("status")
    }

    /// Server-side logout endpoint.
    pub fn logout(&self) -> String {
        self.restricted("logout")
    }

    // ------------------------------------------------------------------
    // Resource endpoints
    // ------------------------------------------------------------------

    /// User collection.
    pub fn users(&self) -> String {
        self.restricted("users")
    }

    /// A single user.
    pub fn user(&self, id: i64) -> String {
        format!("{}/{id}", self.users())
    }

    /// Group collection.
    pub fn groups(&self) -> String {
        self.restricted("groups")
    }

    /// A single group.
    pub fn group(&self, id: i64) -> String {
        format!("{}/{id}", self.groups())
    }

    fn restricted(&self, path: &str) -> String {
        if self.restricted_prefix.is_empty() {
            format!("{}/{path}", self.base_url)
        } else {
            format!("{}/{}/{path}", self.base_url, self.restricted_prefix)
        }
    }
}
