//! Locally persisted session state.
//!
//! A [`PersistedSession`] is the flattened form of a [`ClaimSet`] plus the
//! raw token, written field by field into a key/value store under the
//! names given by [`SessionField`].
//!
//! # Storage keys
//!
//! ```text
//! {app}_goapi_jwt_session_token   raw token
//! {app}_goapi_idgouser            user id
//! {app}_goapi_user_external_id    external id
//! {app}_goapi_name                display name
//! {app}_goapi_username            login
//! {app}_goapi_email               e-mail
//! {app}_goapi_isadmin             "true" / "false"
//! {app}_goapi_groups              "3" or "3,7,9"
//! {app}_goapi_date_expiration     expiry, epoch seconds
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::claims::ClaimSet;
use crate::error::ModelError;

// ---------------------------------------------------------------------------
// SessionField
// ---------------------------------------------------------------------------

/// One named field of a persisted session.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum SessionField {
    /// The raw token as returned by the backend.
    #[strum(serialize = "jwt_session_token")]
    Token,
    /// Backend user id.
    #[strum(serialize = "idgouser")]
    UserId,
    /// External directory id.
    #[strum(serialize = "user_external_id")]
    ExternalId,
    /// Display name.
    #[strum(serialize = "name")]
    Name,
    /// Account login.
    #[strum(serialize = "username")]
    Login,
    /// E-mail address.
    #[strum(serialize = "email")]
    Email,
    /// Administration flag.
    #[strum(serialize = "isadmin")]
    IsAdmin,
    /// Delimited group-id list.
    #[strum(serialize = "groups")]
    Groups,
    /// Expiry timestamp.
    #[strum(serialize = "date_expiration")]
    Expiration,
}

impl SessionField {
    /// Storage key for this field, namespaced by an application identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use usergroup_models::SessionField;
    ///
    /// assert_eq!(SessionField::Token.key("App"), "App_goapi_jwt_session_token");
    /// ```
    pub fn key(self, app: &str) -> String {
        format!("{app}_goapi_{self}")
    }

    /// Every field, in write order.
    pub fn all() -> impl Iterator<Item = SessionField> {
        SessionField::iter()
    }
}

// ---------------------------------------------------------------------------
// GroupIds
// ---------------------------------------------------------------------------

/// Group membership as stored: a comma-joined list of integers.
///
/// An empty list is stored as the empty string. On read, `""` and the
/// literal `"null"` both decode to an empty list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupIds(Vec<i64>);

impl GroupIds {
    /// Wrap a list of group ids.
    pub fn new(ids: Vec<i64>) -> Self {
        Self(ids)
    }

    /// The ids in stored order.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Consume into the inner list.
    pub fn into_vec(self) -> Vec<i64> {
        self.0
    }

    /// `true` when no id is stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first listed group, taken as the user's primary group.
    pub fn primary(&self) -> Option<i64> {
        self.0.first().copied()
    }

    /// Whether the user belongs to at least one real group.
    ///
    /// Several ids always count as membership; a single id counts only when
    /// it is positive, so a stored `"0"` means "no group".
    pub fn has_any(&self) -> bool {
        match self.0.as_slice() {
            [] => false,
            [single] => *single > 0,
            _ => true,
        }
    }
}

impl fmt::Display for GroupIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for GroupIds {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::default());
        }
        trimmed
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<i64>().map_err(|_| ModelError::InvalidGroupIds {
                    value: s.to_string(),
                    reason: format!("element \"{part}\" is not an integer"),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<i64>> for GroupIds {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids)
    }
}

// ---------------------------------------------------------------------------
// PersistedSession
// ---------------------------------------------------------------------------

/// Everything written to the session store after a successful login.
///
/// Either all fields are present in the store or none are.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    /// Raw token, sent back as the bearer credential.
    pub token: String,
    /// Backend user id.
    pub user_id: i64,
    /// External directory id.
    pub external_id: String,
    /// Display name.
    pub name: String,
    /// Account login.
    pub login: String,
    /// E-mail address.
    pub email: String,
    /// Administration flag.
    pub is_admin: bool,
    /// Group membership.
    pub group_ids: GroupIds,
    /// Absolute expiry, UTC.
    pub expires_at: DateTime<Utc>,
}

impl PersistedSession {
    /// Flatten a token and its decoded claims.
    pub fn from_claims(token: &str, claims: &ClaimSet) -> Result<Self, ModelError> {
        let user = &claims.user;
        Ok(Self {
            token: token.to_string(),
            user_id: user.user_id,
            external_id: user.external_id.clone(),
            name: user.name.clone(),
            login: user.login.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            group_ids: GroupIds::new(user.group_ids.clone()),
            expires_at: claims.expires_at()?,
        })
    }

    /// Stored string value of a single field.
    pub fn field(&self, field: SessionField) -> String {
        match field {
            SessionField::Token => self.token.clone(),
            SessionField::UserId => self.user_id.to_string(),
            SessionField::ExternalId => self.external_id.clone(),
            SessionField::Name => self.name.clone(),
            SessionField::Login => self.login.clone(),
            SessionField::Email => self.email.clone(),
            SessionField::IsAdmin => self.is_admin.to_string(),
            SessionField::Groups => self.group_ids.to_string(),
            SessionField::Expiration => self.expires_at.timestamp().to_string(),
        }
    }

    /// All `(field, value)` pairs, in write order.
    pub fn fields(&self) -> Vec<(SessionField, String)> {
        SessionField::all().map(|f| (f, self.field(f))).collect()
    }

    /// Rebuild a session from stored values.
    ///
    /// `read` is queried once per field. Any missing or undecodable value
    /// fails the whole rebuild.
    pub fn from_fields<F>(mut read: F) -> Result<Self, ModelError>
    where
        F: FnMut(SessionField) -> Option<String>,
    {
        let mut get = |field: SessionField| {
            read(field).ok_or_else(|| ModelError::MissingField {
                field: field.to_string(),
            })
        };

        let user_id_raw = get(SessionField::UserId)?;
        let expiry_raw = get(SessionField::Expiration)?;
        let expires_at = parse_epoch_seconds(&expiry_raw)?;

        Ok(Self {
            token: get(SessionField::Token)?,
            user_id: user_id_raw
                .trim()
                .parse()
                .map_err(|_| ModelError::InvalidField {
                    field: SessionField::UserId.to_string(),
                    value: user_id_raw.clone(),
                })?,
            external_id: get(SessionField::ExternalId)?,
            name: get(SessionField::Name)?,
            login: get(SessionField::Login)?,
            email: get(SessionField::Email)?,
            is_admin: get(SessionField::IsAdmin)? == "true",
            group_ids: get(SessionField::Groups)?.parse()?,
            expires_at,
        })
    }
}

/// Parse a stored expiry value (epoch seconds) into a UTC timestamp.
pub fn parse_epoch_seconds(raw: &str) -> Result<DateTime<Utc>, ModelError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| ModelError::InvalidExpiry {
            value: raw.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::claims::UserClaims;

    fn sample_claims() -> ClaimSet {
        ClaimSet {
            expires_at_epoch_seconds: 1_700_000_000,
            user: UserClaims {
                user_id: 42,
                external_id: "X42".into(),
                name: "Zoë".into(),
                login: "zoe".into(),
                email: "zoe@example.com".into(),
                is_admin: true,
                group_ids: vec![3, 7, 9],
            },
        }
    }

    #[test]
    fn field_keys_are_prefixed() {
        assert_eq!(SessionField::UserId.key("App"), "App_goapi_idgouser");
        assert_eq!(SessionField::Login.key("App"), "App_goapi_username");
        assert_eq!(SessionField::Expiration.key("App"), "App_goapi_date_expiration");
    }

    #[test]
    fn field_round_trips_through_name() {
        assert_eq!("isadmin".parse::<SessionField>().unwrap(), SessionField::IsAdmin);
        assert!("nope".parse::<SessionField>().is_err());
    }

    #[test]
    fn all_fields_are_listed() {
        assert_eq!(SessionField::all().count(), 9);
    }

    #[test]
    fn group_ids_single_and_many() {
        let one: GroupIds = "3".parse().unwrap();
        assert_eq!(one.as_slice(), &[3]);
        assert_eq!(one.primary(), Some(3));
        assert!(one.has_any());

        let many: GroupIds = "3,7,9".parse().unwrap();
        assert_eq!(many.as_slice(), &[3, 7, 9]);
        assert_eq!(many.primary(), Some(3));
        assert_eq!(many.to_string(), "3,7,9");
    }

    #[test]
    fn group_ids_zero_means_no_group() {
        let zero: GroupIds = "0".parse().unwrap();
        assert!(!zero.has_any());
        assert_eq!(zero.primary(), Some(0));
    }

    #[test]
    fn group_ids_empty_and_null() {
        assert!("".parse::<GroupIds>().unwrap().is_empty());
        assert!("null".parse::<GroupIds>().unwrap().is_empty());
        assert_eq!(GroupIds::default().to_string(), "");
    }

    #[test]
    fn group_ids_malformed() {
        assert!(matches!(
            "3,abc".parse::<GroupIds>(),
            Err(ModelError::InvalidGroupIds { .. })
        ));
    }

    #[test]
    fn session_fields_from_claims() {
        let session = PersistedSession::from_claims("tok", &sample_claims()).unwrap();
        let fields: HashMap<_, _> = session.fields().into_iter().collect();

        assert_eq!(fields[&SessionField::Token], "tok");
        assert_eq!(fields[&SessionField::UserId], "42");
        assert_eq!(fields[&SessionField::IsAdmin], "true");
        assert_eq!(fields[&SessionField::Groups], "3,7,9");
        assert_eq!(fields[&SessionField::Expiration], "1700000000");
        assert_eq!(fields[&SessionField::Name], "Zoë");
    }

    #[test]
    fn session_rebuilds_from_fields() {
        let session = PersistedSession::from_claims("tok", &sample_claims()).unwrap();
        let stored: HashMap<_, _> = session.fields().into_iter().collect();
        let back = PersistedSession::from_fields(|f| stored.get(&f).cloned()).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn rebuild_fails_on_missing_field() {
        let session = PersistedSession::from_claims("tok", &sample_claims()).unwrap();
        let mut stored: HashMap<_, _> = session.fields().into_iter().collect();
        stored.remove(&SessionField::Email);
        let err = PersistedSession::from_fields(|f| stored.get(&f).cloned()).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingField {
                field: "email".into()
            }
        );
    }

    #[test]
    fn parse_epoch_seconds_rejects_garbage() {
        assert!(parse_epoch_seconds("tomorrow").is_err());
        assert_eq!(parse_epoch_seconds("0").unwrap().timestamp(), 0);
    }
}
