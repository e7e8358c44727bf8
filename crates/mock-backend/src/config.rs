//! Mock backend configuration.

use chrono::Duration;

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    /// Port to listen on (default `8080`).
    pub listen_port: u16,
    /// HMAC secret used to sign and verify tokens.
    pub jwt_secret: String,
    /// Token lifetime in minutes. Negative values issue already-expired tokens.
    pub token_ttl_minutes: i64,
}

impl MockConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable               | Default                | Description            |
    /// |------------------------|------------------------|------------------------|
    /// | `MOCK_BACKEND_PORT`    | `8080`                 | HTTP listen port       |
    /// | `JWT_SECRET`           | `usergroup-dev-secret` | HS512 signing secret   |
    /// | `JWT_DURATION_MINUTES` | `60`                   | Token lifetime         |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_port = lookup("MOCK_BACKEND_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let jwt_secret =
            lookup("JWT_SECRET").unwrap_or_else(|| "usergroup-dev-secret".to_string());
        let token_ttl_minutes = lookup("JWT_DURATION_MINUTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            listen_port,
            jwt_secret,
            token_ttl_minutes,
        }
    }

    /// Token lifetime, or `None` when the minute count overflows a duration.
    pub fn token_ttl(&self) -> Option<Duration> {
        Duration::try_minutes(self.token_ttl_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = MockConfig::from_lookup(|_| None);
        assert_eq!(cfg.listen_port, 8080);
        assert_eq!(cfg.token_ttl_minutes, 60);
        assert!(!cfg.jwt_secret.is_empty());
    }

    #[test]
    fn unparsable_values_fall_back() {
        let cfg = MockConfig::from_lookup(|key| match key {
            "MOCK_BACKEND_PORT" => Some("eighty".into()),
            "JWT_DURATION_MINUTES" => Some("-5".into()),
            _ => None,
        });
        assert_eq!(cfg.listen_port, 8080);
        assert_eq!(cfg.token_ttl_minutes, -5);
        assert_eq!(cfg.token_ttl(), Some(Duration::minutes(-5)));
    }

    #[test]
    fn overflowing_lifetime_has_no_duration() {
        let cfg = MockConfig::from_lookup(|key| match key {
            "JWT_DURATION_MINUTES" => Some(i64::MAX.to_string()),
            _ => None,
        });
        assert_eq!(cfg.token_ttl(), None);
    }
}
