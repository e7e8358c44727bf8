//! HS512 session tokens.
//!
//! The payload is a [`ClaimSet`]: `exp` plus the `User` object the client
//! decodes locally.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use usergroup_models::{ClaimSet, User, UserClaims};

use crate::error::MockError;

/// Sign a token for `user`, valid for `ttl` from now.
pub fn issue(secret: &str, ttl: Duration, user: &User) -> Result<String, MockError> {
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or(MockError::TokenLifetime(ttl))?;
    let claims = ClaimSet {
        expires_at_epoch_seconds: expires_at.timestamp(),
        user: UserClaims {
            user_id: user.id,
            external_id: user.external_id.clone().unwrap_or_default(),
            name: user.name.clone(),
            login: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            group_ids: user.groups_id.clone().unwrap_or_default(),
        },
    };

    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Check signature and expiry, returning the embedded claims.
pub fn verify(secret: &str, token: &str) -> Result<ClaimSet, MockError> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.leeway = 0;

    decode::<ClaimSet>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| MockError::Unauthorized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "Zoë Müller",
            "email": "zoe@example.com",
            "username": "zoe",
            "groups_id": [2, 5],
        }))
        .unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let token = issue("s3cret", Duration::minutes(5), &user()).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = verify("s3cret", &token).unwrap();
        assert_eq!(claims.user.user_id, 4);
        assert_eq!(claims.user.name, "Zoë Müller");
        assert_eq!(claims.user.group_ids, vec![2, 5]);
        assert!(claims.expires_at_epoch_seconds > Utc::now().timestamp());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("s3cret", Duration::minutes(5), &user()).unwrap();
        assert!(matches!(
            verify("other", &token),
            Err(MockError::Unauthorized(_))
        ));
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        let ttl = Duration::try_minutes(1_000_000_000_000).unwrap();
        assert!(matches!(
            issue("s3cret", ttl, &user()),
            Err(MockError::TokenLifetime(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue("s3cret", Duration::minutes(-10), &user()).unwrap();
        assert!(verify("s3cret", &token).is_err());
    }
}
