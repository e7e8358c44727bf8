//! User and group resources exchanged with the CRUD endpoints.
//!
//! Only `id` and `name` (plus `login`/`email` for users) are required on
//! the wire; every other attribute is optional so that list endpoints,
//! which return abbreviated records, decode into the same types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user account as returned by `/users` endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Backend primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// E-mail address.
    #[serde(default)]
    pub email: String,
    /// Account login.
    #[serde(default)]
    pub username: String,
    /// External directory id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Groups the user belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups_id: Option<Vec<i64>>,
    /// Administration flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Whether the account is locked.
    #[serde(default)]
    pub is_locked: bool,
    /// Whether the account is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Body of `POST /users`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// E-mail address.
    pub email: String,
    /// Account login.
    pub username: String,
    /// Hex SHA-256 of the initial password.
    pub password_hash: String,
    /// External directory id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Administration flag.
    #[serde(default)]
    pub is_admin: bool,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("external_id", &self.external_id)
            .field("is_admin", &self.is_admin)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A group as returned by `/groups` endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Backend primary key.
    pub id: i64,
    /// Unique group name.
    pub name: String,
    /// Whether the group is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// Id of the creating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<i64>,
    /// Reason given when the group was deactivated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivation_reason: Option<String>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Body of `POST /groups`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    /// Unique group name.
    pub name: String,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn abbreviated_group_decodes() {
        let g: Group = serde_json::from_value(json!({ "id": 2, "name": "ops" })).unwrap();
        assert_eq!(g.id, 2);
        assert!(g.is_active);
        assert!(g.comment.is_none());
    }

    #[test]
    fn user_optional_fields_are_skipped() {
        let u: User = serde_json::from_value(json!({
            "id": 1, "name": "Root", "email": "root@x", "username": "root"
        }))
        .unwrap();
        let back = serde_json::to_value(&u).unwrap();
        assert!(back.get("external_id").is_none());
        assert_eq!(back["is_active"], true);
    }

    #[test]
    fn new_user_debug_hides_hash() {
        let u = NewUser {
            name: "Carlos".into(),
            email: "c@gil.town".into(),
            username: "cgil".into(),
            password_hash: "4acf0b39".into(),
            external_id: None,
            is_admin: false,
        };
        assert!(!format!("{u:?}").contains("4acf0b39"));
    }
}
