//! Credential shapes and values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authentication shape an endpoint requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    /// `.ROBLOSECURITY` session cookie
    Cookie,
    /// Open Cloud `x-api-key`
    ApiKey,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Cookie => f.write_str("cookie"),
            CredentialKind::ApiKey => f.write_str("api key"),
        }
    }
}

/// Credential values, used both for process-wide configuration and as a
/// per-call override
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn cookie(cookie: impl Into<String>) -> Self {
        Self {
            cookie: Some(cookie.into()),
            api_key: None,
        }
    }

    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self {
            cookie: None,
            api_key: Some(api_key.into()),
        }
    }

    /// Credential value for the given shape, ignoring empty strings
    pub fn get(&self, kind: CredentialKind) -> Option<&str> {
        let value = match kind {
            CredentialKind::Cookie => self.cookie.as_deref(),
            CredentialKind::ApiKey => self.api_key.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.get(CredentialKind::Cookie).is_none() && self.get(CredentialKind::ApiKey).is_none()
    }
}

// Secrets never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_ignores_empty_values() {
        let creds = Credentials {
            cookie: Some(String::new()),
            api_key: Some("key".to_string()),
        };
        assert_eq!(creds.get(CredentialKind::Cookie), None);
        assert_eq!(creds.get(CredentialKind::ApiKey), Some("key"));
        assert!(!creds.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::cookie("super-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
