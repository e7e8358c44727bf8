//! SDK error types.
//!
//! * [`MalformedTokenError`]: a token could not be decoded into claims.
//! * [`AuthError`]: failure of a session operation (login, status, logout).
//! * [`StoreError`]: a session store backend failed.
//! * [`SdkError`]: the error returned by the resource wrappers and by
//!   configuration; wraps [`AuthError`].
//!
//! Local session reads never produce an error: they fail closed to a
//! sentinel value instead.

use usergroup_models::ModelError;

/// Structural failure while decoding a token's claim segment.
#[derive(Debug, thiserror::Error)]
pub enum MalformedTokenError {
    /// The token is not made of exactly three dot-separated segments.
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    /// The claim segment is not valid base64url.
    #[error("claim segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not valid UTF-8 text.
    #[error("claim segment is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The text is not a JSON claim object, or a required claim is missing
    /// or has the wrong type.
    #[error("invalid claim payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A claim value is out of range (e.g. an unrepresentable expiry).
    #[error("invalid claim value: {0}")]
    Claim(#[from] ModelError),
}

/// Failure of a [`SessionStore`](crate::store::SessionStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The host has no persistent key/value storage.
    #[error("session storage is not available on this host")]
    Unavailable,

    /// The storage medium failed (I/O, encoding…).
    #[error("session storage failed: {0}")]
    Backend(String),
}

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No response reached the client (connection refused, DNS, timeout…).
    #[error("no response from {url}: {source}")]
    NetworkFailure {
        /// The URL that was requested.
        url: String,
        /// The transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} answered with status {status}: {message}")]
    ServerRejected {
        /// The URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body.
        message: String,
    },

    /// The host has no usable session storage.
    #[error("session storage is not available on this host")]
    UnsupportedStorage,

    /// The session could not be written to storage.
    #[error("could not persist session: {0}")]
    Storage(StoreError),

    /// The returned token could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(#[from] MalformedTokenError),

    /// A 2xx response body did not have the expected shape.
    #[error("unexpected response body from {url}: {reason}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },
}

impl AuthError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error type for resource and configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Session-level failure.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The server answered a resource request with a non-2xx status.
    #[error("{method} {url} answered with status {status}: {message}")]
    Rejected {
        /// Operation name, e.g. `getUser`.
        method: &'static str,
        /// The URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body.
        message: String,
    },

    /// HTTP request failure with no usable response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Extract a human-readable message from an error response body.
///
/// JSON object bodies yield their `message` (or `error`) field; anything
/// else is returned verbatim.
pub(crate) fn server_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(|v| v.as_str())
            .map_or_else(|| body.to_string(), str::to_string),
        Ok(serde_json::Value::String(s)) => s,
        _ => body.to_string(),
    }
}
