//! rbx.json configuration parsing
//!
//! Same shape as `rbx.toml`, for projects that keep their settings in JSON.

use rbx_core::error::RbxError;

use crate::toml::ClientConfig;
use crate::ConfigResult;

/// Parse JSON string to ClientConfig
pub fn parse_rbx_json(content: &str) -> ConfigResult<ClientConfig> {
    let config: ClientConfig = serde_json::from_str(content).map_err(|e| RbxError::ConfigParse {
        file: "rbx.json".to_string(),
        message: e.to_string(),
    })?;

    config.validate()?;

    Ok(config)
}

/// Serialize ClientConfig to JSON string
pub fn serialize_rbx_json(config: &ClientConfig) -> ConfigResult<String> {
    serde_json::to_string_pretty(config).map_err(|e| RbxError::ConfigParse {
        file: "rbx.json".to_string(),
        message: format!("JSON serialization error: {e}"),
    })
}
