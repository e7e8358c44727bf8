//! Login credential sent to the backend.

use serde::{Deserialize, Serialize};

/// Username and password hash presented to `POST /login`.
///
/// The hash is computed by the caller (see the SDK's `password_hash`);
/// the plain password never leaves the client. A `Credential` lives only
/// for the duration of a login request and is never persisted.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account login.
    pub username: String,
    /// Hex-encoded SHA-256 of the password.
    pub password_hash: String,
}

impl Credential {
    /// Build a credential from a login and an already-hashed password.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

// Keep the hash out of logs and panic messages.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_backend_field_names() {
        let cred = Credential::new("bob", "abc123");
        let json = serde_json::to_value(&cred).unwrap();
        assert_eq!(json["username"], "bob");
        assert_eq!(json["password_hash"], "abc123");
    }

    #[test]
    fn debug_redacts_hash() {
        let cred = Credential::new("bob", "abc123");
        let dbg = format!("{cred:?}");
        assert!(dbg.contains("bob"));
        assert!(!dbg.contains("abc123"));
    }
}
