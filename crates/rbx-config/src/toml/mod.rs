//! rbx.toml configuration parsing and serialization

use serde::{Deserialize, Serialize};
use rbx_core::error::RbxError;
use rbx_core::types::Credentials;

use crate::cache::CacheRules;
use crate::ConfigResult;

/// Anti-forgery attempt bound used when the configuration does not set one
pub const DEFAULT_CSRF_RETRIES: u32 = 2;

/// Process-wide client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Default credentials used when a call has no override
    #[serde(default, skip_serializing_if = "Credentials::is_empty")]
    pub credentials: Credentials,

    /// Maximum transport invocations per call while negotiating the
    /// anti-forgery token, first attempt included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_retries: Option<u32>,

    /// Cache rule tree
    #[serde(default, skip_serializing_if = "CacheRules::is_empty")]
    pub cache: CacheRules,
}

impl ClientConfig {
    /// Effective anti-forgery attempt bound
    pub fn csrf_retries(&self) -> u32 {
        self.csrf_retries.unwrap_or(DEFAULT_CSRF_RETRIES)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        if self.csrf_retries == Some(0) {
            return Err(RbxError::ConfigValidation {
                field: "csrf_retries".to_string(),
                reason: "must allow at least one attempt".to_string(),
            });
        }

        for (group, rule) in self.cache.iter() {
            for settings in rule.directives().filter_map(|d| d.settings()) {
                if settings.adapter.is_empty() {
                    return Err(RbxError::ConfigValidation {
                        field: format!("cache.{group}.adapter"),
                        reason: "adapter name cannot be empty".to_string(),
                    });
                }
                if settings.lifetime_secs == Some(0) {
                    return Err(RbxError::ConfigValidation {
                        field: format!("cache.{group}.lifetime_secs"),
                        reason: "lifetime must be greater than zero; use \"disabled\" to turn caching off".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Parse TOML string to ClientConfig
pub fn parse_rbx_toml(content: &str) -> ConfigResult<ClientConfig> {
    let config: ClientConfig = ::toml::from_str(content).map_err(|e| RbxError::ConfigParse {
        file: "rbx.toml".to_string(),
        message: e.to_string(),
    })?;

    config.validate()?;

    Ok(config)
}

/// Serialize ClientConfig to TOML string
pub fn serialize_rbx_toml(config: &ClientConfig) -> ConfigResult<String> {
    ::toml::to_string_pretty(config).map_err(|e| RbxError::ConfigParse {
        file: "rbx.toml".to_string(),
        message: format!("TOML serialization error: {e}"),
    })
}
