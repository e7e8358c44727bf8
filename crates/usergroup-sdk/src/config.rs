//! Client configuration.
//!
//! Selects the backend to talk to and the namespace used for stored
//! session fields. Built from environment variables at startup and handed
//! to the session manager and resource wrappers.

use crate::error::SdkError;
use crate::routes::{ApiRoutes, DEFAULT_RESTRICTED_PREFIX};

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Default application identifier used to prefix storage keys.
pub const DEFAULT_APP: &str = "GoCloudK8sUserGroupFront";

/// Settings shared by every client-side component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend (scheme, host, port, optional path).
    pub backend_url: String,
    /// Application identifier, prefix of every storage key.
    pub app: String,
    /// Path segment guarding authenticated endpoints.
    pub restricted_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            app: DEFAULT_APP.to_string(),
            restricted_prefix: DEFAULT_RESTRICTED_PREFIX.to_string(),
        }
    }
}

impl ClientConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                      | Default                     | Description                  |
    /// |-------------------------------|-----------------------------|------------------------------|
    /// | `USERGROUP_BACKEND_URL`       | `http://localhost:8080`     | Backend base URL             |
    /// | `USERGROUP_APP`               | `GoCloudK8sUserGroupFront`  | Storage key prefix           |
    /// | `USERGROUP_RESTRICTED_PREFIX` | `api`                       | Authenticated path segment   |
    pub fn from_env() -> Result<Self, SdkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SdkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            backend_url: lookup("USERGROUP_BACKEND_URL").unwrap_or(defaults.backend_url),
            app: lookup("USERGROUP_APP").unwrap_or(defaults.app),
            restricted_prefix: lookup("USERGROUP_RESTRICTED_PREFIX")
                .unwrap_or(defaults.restricted_prefix),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), SdkError> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(SdkError::Config(format!(
                "backend URL must start with http:// or https://, got \"{}\"",
                self.backend_url
            )));
        }
        if self.app.trim().is_empty() {
            return Err(SdkError::Config("application identifier is empty".into()));
        }
        Ok(())
    }

    /// Endpoint builder for this configuration.
    pub fn routes(&self) -> ApiRoutes {
        ApiRoutes::new(&self.backend_url, &self.restricted_prefix)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.routes().login(), "http://localhost:8080/login");
    }

    #[test]
    fn overrides_apply() {
        let cfg = ClientConfig::from_lookup(lookup_from(&[
            ("USERGROUP_BACKEND_URL", "https://goeland.io/"),
            ("USERGROUP_APP", "Demo"),
            ("USERGROUP_RESTRICTED_PREFIX", "secure"),
        ]))
        .unwrap();
        assert_eq!(cfg.app, "Demo");
        assert_eq!(cfg.routes().status(), "https://goeland.io/secure/status");
    }

    #[test]
    fn rejects_non_http_url() {
        let err = ClientConfig::from_lookup(lookup_from(&[(
            "USERGROUP_BACKEND_URL",
            "ftp://example.org",
        )]))
        .unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn rejects_empty_app() {
        let err = ClientConfig::from_lookup(lookup_from(&[("USERGROUP_APP", "  ")])).unwrap_err();
        assert!(err.to_string().contains("application identifier"));
    }
}
