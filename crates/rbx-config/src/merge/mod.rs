//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use rbx_core::error::RbxError;
use tracing::debug;

use crate::loader::{FileReader, TokioFileReader};
use crate::toml::ClientConfig;
use crate::ConfigResult;

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Filesystem access
    reader: Arc<dyn FileReader>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project rbx.toml file
    ProjectToml(Utf8PathBuf),
    /// Project rbx.json file (fallback)
    ProjectJson(Utf8PathBuf),
    /// No file found, built-in defaults
    Defaults,
}

impl ConfigLoader {
    /// Create a new configuration loader reading through `tokio::fs`
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self::with_reader(cwd, Arc::new(TokioFileReader))
    }

    /// Create a loader with an explicit file reader
    pub fn with_reader(cwd: Utf8PathBuf, reader: Arc<dyn FileReader>) -> Self {
        Self { cwd, reader }
    }

    /// Load project configuration with fallbacks
    pub async fn load_project_config(&self) -> ConfigResult<(ClientConfig, ConfigSource)> {
        // First, try to find rbx.toml
        if let Some(path) = self.resolve_config_path("rbx.toml") {
            let config = self.load_file(&path).await?;
            return Ok((config, ConfigSource::ProjectToml(path)));
        }

        // Fall back to rbx.json if no rbx.toml
        if let Some(path) = self.resolve_config_path("rbx.json") {
            let config = self.load_file(&path).await?;
            return Ok((config, ConfigSource::ProjectJson(path)));
        }

        debug!("No rbx.toml or rbx.json found above {}, using defaults", self.cwd);
        Ok((ClientConfig::default(), ConfigSource::Defaults))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(filename);
            if self.reader.exists(&config_path) {
                return Some(config_path);
            }
            current = dir.parent();
        }

        None
    }

    /// Load global configuration (~/.rbx/config.toml)
    pub async fn load_global_config(&self) -> ConfigResult<Option<(ClientConfig, ConfigSource)>> {
        let home_dir = dirs::home_dir().ok_or_else(|| RbxError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;

        let global_config_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| RbxError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })?
            .join(".rbx")
            .join("config.toml");

        if self.reader.exists(&global_config_path) {
            let config = self.load_file(&global_config_path).await?;
            Ok(Some((config, ConfigSource::Global(global_config_path))))
        } else {
            Ok(None)
        }
    }

    /// Read and parse a single file, choosing the format by extension
    pub async fn load_file(&self, path: &Utf8Path) -> ConfigResult<ClientConfig> {
        let content = self
            .reader
            .read_to_string(path)
            .await
            .map_err(|e| RbxError::io(format!("Failed to read {}", path), e))?;

        let parsed = match path.extension() {
            Some("json") => crate::json::parse_rbx_json(&content),
            _ => crate::toml::parse_rbx_toml(&content),
        };

        // Report the real path rather than the bare file name.
        parsed.map_err(|err| match err {
            RbxError::ConfigParse { message, .. } => RbxError::ConfigParse {
                file: path.to_string(),
                message,
            },
            other => other,
        })
    }
}

impl ConfigLayering {
    /// Merge multiple configuration layers
    pub fn merge_configs(
        global_config: Option<ClientConfig>,
        project_config: ClientConfig,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<ClientConfig> {
        let mut merged = project_config;

        // Apply global config as base (if present)
        if let Some(global) = global_config {
            if merged.credentials.cookie.is_none() {
                merged.credentials.cookie = global.credentials.cookie;
            }
            if merged.credentials.api_key.is_none() {
                merged.credentials.api_key = global.credentials.api_key;
            }
            if merged.csrf_retries.is_none() {
                merged.csrf_retries = global.csrf_retries;
            }

            // Merge global cache rules that aren't overridden
            for (key, rule) in global.cache.iter() {
                merged.cache.insert_if_absent(key.to_string(), rule.clone());
            }
        }

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        merged.validate()?;

        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut ClientConfig, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "RBX_COOKIE" => {
                    config.credentials.cookie = Some(value.clone());
                }
                "RBX_API_KEY" => {
                    config.credentials.api_key = Some(value.clone());
                }
                "RBX_CSRF_RETRIES" => {
                    config.csrf_retries = Some(parse_retries("RBX_CSRF_RETRIES", value)?);
                }
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut ClientConfig, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "cookie" => {
                    config.credentials.cookie = Some(value.clone());
                }
                "api-key" => {
                    config.credentials.api_key = Some(value.clone());
                }
                "csrf-retries" => {
                    config.csrf_retries = Some(parse_retries("--csrf-retries", value)?);
                }
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("RBX_"))
            .collect()
    }
}

fn parse_retries(field: &str, value: &str) -> ConfigResult<u32> {
    value.parse().map_err(|e| RbxError::ConfigValidation {
        field: field.to_string(),
        reason: format!("Invalid attempt count '{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheDirective, CacheSettings, WILDCARD};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory reader that records which paths were read
    #[derive(Default)]
    struct MemoryReader {
        files: HashMap<Utf8PathBuf, String>,
        reads: Mutex<Vec<Utf8PathBuf>>,
    }

    #[async_trait]
    impl FileReader for MemoryReader {
        fn exists(&self, path: &Utf8Path) -> bool {
            self.files.contains_key(path)
        }

        async fn read_to_string(&self, path: &Utf8Path) -> std::io::Result<String> {
            self.reads.lock().unwrap().push(path.to_path_buf());
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
        }
    }

    #[tokio::test]
    async fn test_resolve_config_path_walks_up() {
        let mut reader = MemoryReader::default();
        reader
            .files
            .insert(Utf8PathBuf::from("/work/rbx.toml"), "csrf_retries = 3".to_string());
        let loader = ConfigLoader::with_reader(Utf8PathBuf::from("/work/app/src"), Arc::new(reader));

        assert_eq!(
            loader.resolve_config_path("rbx.toml"),
            Some(Utf8PathBuf::from("/work/rbx.toml"))
        );
        assert_eq!(loader.resolve_config_path("rbx.json"), None);
    }

    #[tokio::test]
    async fn test_load_project_config_reads_through_injected_reader() {
        let mut reader = MemoryReader::default();
        reader
            .files
            .insert(Utf8PathBuf::from("/work/rbx.toml"), "csrf_retries = 3".to_string());
        let reader = Arc::new(reader);
        let loader = ConfigLoader::with_reader(Utf8PathBuf::from("/work"), reader.clone());

        let (config, source) = loader.load_project_config().await.unwrap();
        assert_eq!(config.csrf_retries(), 3);
        assert_eq!(source, ConfigSource::ProjectToml(Utf8PathBuf::from("/work/rbx.toml")));
        assert_eq!(*reader.reads.lock().unwrap(), vec![Utf8PathBuf::from("/work/rbx.toml")]);
    }

    #[tokio::test]
    async fn test_load_project_config_json_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

        tokio::fs::write(temp_path.join("rbx.json"), r#"{ "csrf_retries": 4 }"#)
            .await
            .unwrap();

        let loader = ConfigLoader::new(temp_path.clone());
        let (config, source) = loader.load_project_config().await.unwrap();

        assert_eq!(config.csrf_retries(), 4);
        assert_eq!(source, ConfigSource::ProjectJson(temp_path.join("rbx.json")));
    }

    #[tokio::test]
    async fn test_load_project_config_defaults_when_missing() {
        let loader = ConfigLoader::with_reader(Utf8PathBuf::from("/empty"), Arc::new(MemoryReader::default()));
        let (config, source) = loader.load_project_config().await.unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[tokio::test]
    async fn test_parse_error_names_full_path() {
        let mut reader = MemoryReader::default();
        reader
            .files
            .insert(Utf8PathBuf::from("/work/rbx.toml"), "csrf_retries = [".to_string());
        let loader = ConfigLoader::with_reader(Utf8PathBuf::from("/work"), Arc::new(reader));

        match loader.load_project_config().await.unwrap_err() {
            RbxError::ConfigParse { file, .. } => assert_eq!(file, "/work/rbx.toml"),
            other => panic!("Expected ConfigParse error, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_configs() {
        let mut global_config = ClientConfig::default();
        global_config.credentials.cookie = Some("global-cookie".to_string());
        global_config.credentials.api_key = Some("global-key".to_string());
        global_config.cache.set_group(WILDCARD, CacheSettings::default());
        global_config.cache.set_group("users", CacheSettings::new("disk"));

        let mut project_config = ClientConfig::default();
        project_config.credentials.cookie = Some("project-cookie".to_string());
        project_config.cache.set_group("users", CacheDirective::disabled());

        let env_overrides = HashMap::from([
            ("RBX_CSRF_RETRIES".to_string(), "4".to_string()),
        ]);

        let cli_overrides = HashMap::from([
            ("api-key".to_string(), "cli-key".to_string()),
        ]);

        let merged = ConfigLayering::merge_configs(
            Some(global_config),
            project_config,
            env_overrides,
            cli_overrides,
        ).unwrap();

        // Project config should take precedence over global
        assert_eq!(merged.credentials.cookie.as_deref(), Some("project-cookie"));
        assert!(merged.cache.resolve("users", "userInfo").is_none());

        // Global cache rules should be merged
        assert_eq!(merged.cache.resolve("groups", "groupInfo"), Some(&CacheSettings::default()));

        // Environment override should be applied
        assert_eq!(merged.csrf_retries(), 4);

        // CLI override should be applied (highest priority)
        assert_eq!(merged.credentials.api_key.as_deref(), Some("cli-key"));
    }

    #[test]
    fn test_invalid_env_retries_rejected() {
        let env_overrides = HashMap::from([
            ("RBX_CSRF_RETRIES".to_string(), "lots".to_string()),
        ]);
        let err = ConfigLayering::merge_configs(None, ClientConfig::default(), env_overrides, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, RbxError::ConfigValidation { ref field, .. } if field == "RBX_CSRF_RETRIES"));
    }

    #[test]
    fn test_cli_zero_retries_rejected() {
        let cli_overrides = HashMap::from([
            ("csrf-retries".to_string(), "0".to_string()),
        ]);
        let result = ConfigLayering::merge_configs(None, ClientConfig::default(), HashMap::new(), cli_overrides);
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_env_overrides() {
        std::env::set_var("RBX_API_KEY", "env-key");
        std::env::set_var("NOT_RBX_VAR", "ignored");

        let overrides = ConfigLayering::collect_env_overrides();

        assert!(overrides.contains_key("RBX_API_KEY"));
        assert!(!overrides.contains_key("NOT_RBX_VAR"));

        std::env::remove_var("RBX_API_KEY");
        std::env::remove_var("NOT_RBX_VAR");
    }
}
