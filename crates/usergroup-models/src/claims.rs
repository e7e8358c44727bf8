//! Identity claims carried in the payload segment of a session token.
//!
//! The backend signs a compact token whose middle segment is a JSON
//! object of the form:
//!
//! ```text
//! {
//!   "exp": 1735689600,
//!   "User": {
//!     "user_id": 7, "external_id": "E-7", "name": "…", "login": "…",
//!     "email": "…", "is_admin": false, "groups_id": [3, 9]
//!   }
//! }
//! ```
//!
//! `exp`, `user_id`, `login` and `email` are required; the rest default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// ClaimSet
// ---------------------------------------------------------------------------

/// Decoded token payload.
///
/// Produced once per successful login and never mutated afterwards; a new
/// login yields a new `ClaimSet` that replaces the previous session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    /// Expiry as seconds since the Unix epoch.
    #[serde(rename = "exp")]
    pub expires_at_epoch_seconds: i64,
    /// Identity of the authenticated user.
    #[serde(rename = "User")]
    pub user: UserClaims,
}

impl ClaimSet {
    /// Convert the `exp` claim to an absolute UTC timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use usergroup_models::{ClaimSet, UserClaims};
    ///
    /// let claims = ClaimSet {
    ///     expires_at_epoch_seconds: 0,
    ///     user: UserClaims::new(1, "root", "root@example.com"),
    /// };
    /// assert_eq!(claims.expires_at().unwrap().to_rfc3339(), "1970-01-01T00:00:00+00:00");
    /// ```
    pub fn expires_at(&self) -> Result<DateTime<Utc>, ModelError> {
        DateTime::from_timestamp(self.expires_at_epoch_seconds, 0).ok_or_else(|| {
            ModelError::InvalidExpiry {
                value: self.expires_at_epoch_seconds.to_string(),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// UserClaims
// ---------------------------------------------------------------------------

/// The `User` object embedded in the token payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    /// Backend primary key of the user.
    pub user_id: i64,
    /// Identifier of the user in an external directory.
    #[serde(default)]
    pub external_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Account login.
    pub login: String,
    /// Contact e-mail.
    pub email: String,
    /// Whether the user holds administration rights.
    #[serde(default)]
    pub is_admin: bool,
    /// Groups the user belongs to. `null` and absence both decode as empty.
    #[serde(
        default,
        rename = "groups_id",
        alias = "groups",
        deserialize_with = "null_as_empty"
    )]
    pub group_ids: Vec<i64>,
}

impl UserClaims {
    /// Minimal claims with only the required fields set.
    pub fn new(user_id: i64, login: &str, email: &str) -> Self {
        Self {
            user_id,
            external_id: String::new(),
            name: String::new(),
            login: login.to_string(),
            email: email.to_string(),
            is_admin: false,
            group_ids: Vec::new(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<i64>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
