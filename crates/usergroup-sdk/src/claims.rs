//! Local decoding of session-token claims.
//!
//! Tokens are compact `header.payload.signature` strings. Only the payload
//! is read: it is base64url-decoded, validated as UTF-8, then parsed as a
//! JSON [`ClaimSet`]. The signature is **not** checked; authenticity is the
//! backend's concern, and `SessionManager::check_remote_status` is the
//! authoritative validity probe.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use usergroup_models::ClaimSet;

use crate::error::MalformedTokenError;

/// URL-safe alphabet, accepting the segment with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claim segment of a token.
///
/// Fails with [`MalformedTokenError`] if the token does not have exactly
/// three segments, if the middle segment is not base64url, if the bytes are
/// not UTF-8, or if the payload lacks `exp`, `User.user_id`, `User.login`
/// or `User.email` (or has them with the wrong type).
///
/// # Examples
///
/// ```
/// use usergroup_sdk::claims::decode;
///
/// // {"exp":1,"User":{"user_id":1,"login":"a","email":"a@b"}}
/// let token = "e30.eyJleHAiOjEsIlVzZXIiOnsidXNlcl9pZCI6MSwibG9naW4iOiJhIiwiZW1haWwiOiJhQGIifX0.sig";
/// let claims = decode(token).unwrap();
/// assert_eq!(claims.user.login, "a");
/// ```
pub fn decode(token: &str) -> Result<ClaimSet, MalformedTokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(MalformedTokenError::SegmentCount(segments.len()));
    };

    let bytes = URL_SAFE_LENIENT.decode(payload)?;
    // Strict UTF-8 so multi-byte characters in names survive intact.
    let text = String::from_utf8(bytes)?;
    let claims: ClaimSet = serde_json::from_str(&text)?;
    claims.expires_at()?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
    use serde_json::json;

    use super::*;

    fn token_with_payload(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS512","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    fn sample_payload(name: &str) -> serde_json::Value {
        json!({
            "exp": 1_900_000_000,
            "User": {
                "user_id": 12,
                "external_id": "EXT-12",
                "name": name,
                "login": "jdoe",
                "email": "jdoe@example.com",
                "is_admin": false,
                "groups_id": [2, 5]
            }
        })
    }

    #[test]
    fn decodes_ascii_claims() {
        let claims = decode(&token_with_payload(&sample_payload("John Doe"))).unwrap();
        assert_eq!(claims.expires_at_epoch_seconds, 1_900_000_000);
        assert_eq!(claims.user.user_id, 12);
        assert_eq!(claims.user.external_id, "EXT-12");
        assert_eq!(claims.user.name, "John Doe");
        assert_eq!(claims.user.login, "jdoe");
        assert_eq!(claims.user.email, "jdoe@example.com");
        assert!(!claims.user.is_admin);
        assert_eq!(claims.user.group_ids, vec![2, 5]);
    }

    #[test]
    fn preserves_non_ascii_text() {
        let name = "Zoë Müller-Ñúñez 日本語";
        let claims = decode(&token_with_payload(&sample_payload(name))).unwrap();
        assert_eq!(claims.user.name, name);
    }

    #[test]
    fn accepts_padded_segment() {
        let header = URL_SAFE.encode("{}");
        let body = URL_SAFE.encode(sample_payload("Al").to_string());
        let claims = decode(&format!("{header}.{body}.sig")).unwrap();
        assert_eq!(claims.user.name, "Al");
    }

    #[test]
    fn rejects_two_segments() {
        let err = decode("aGVhZGVy.cGF5bG9hZA").unwrap_err();
        assert!(matches!(err, MalformedTokenError::SegmentCount(2)));
    }

    #[test]
    fn rejects_four_segments() {
        let err = decode("a.b.c.d").unwrap_err();
        assert!(matches!(err, MalformedTokenError::SegmentCount(4)));
    }

    #[test]
    fn rejects_non_base64_segment() {
        let err = decode("e30.!!not*base64!!.sig").unwrap_err();
        assert!(matches!(err, MalformedTokenError::Base64(_)));
    }

    #[test]
    fn rejects_non_utf8_segment() {
        let body = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        let err = decode(&format!("e30.{body}.sig")).unwrap_err();
        assert!(matches!(err, MalformedTokenError::Utf8(_)));
    }

    #[test]
    fn rejects_non_json_payload() {
        let body = URL_SAFE_NO_PAD.encode("just some text");
        let err = decode(&format!("e30.{body}.sig")).unwrap_err();
        assert!(matches!(err, MalformedTokenError::Payload(_)));
    }

    #[test]
    fn rejects_missing_required_claim() {
        let token = token_with_payload(&json!({
            "exp": 1,
            "User": { "user_id": 1, "login": "x" }
        }));
        assert!(matches!(
            decode(&token).unwrap_err(),
            MalformedTokenError::Payload(_)
        ));
    }

    #[test]
    fn rejects_wrongly_typed_claim() {
        let token = token_with_payload(&json!({
            "exp": "tomorrow",
            "User": { "user_id": 1, "login": "x", "email": "x@y" }
        }));
        assert!(matches!(
            decode(&token).unwrap_err(),
            MalformedTokenError::Payload(_)
        ));
    }

    #[test]
    fn rejects_unrepresentable_expiry() {
        let token = token_with_payload(&json!({
            "exp": i64::MAX,
            "User": { "user_id": 1, "login": "x", "email": "x@y" }
        }));
        assert!(matches!(
            decode(&token).unwrap_err(),
            MalformedTokenError::Claim(_)
        ));
    }
}
