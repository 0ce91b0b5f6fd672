//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking a [`CommandContext`].

use std::collections::HashMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use rbx_cache::FileCache;
use rbx_client::RequestEngine;
use rbx_config::{ClientConfig, ConfigLayering, ConfigLoader, ConfigSource};
use rbx_core::error::{RbxError, RbxResult};
use tracing::{info, warn};

pub mod call;
pub mod check;

#[cfg(test)]
mod tests;

use crate::output::OutputHandler;
use crate::Commands;

/// Adapter name the CLI backs with an on-disk cache
pub const DISK_ADAPTER: &str = "disk";

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    /// Command line overrides, highest priority layer
    pub overrides: HashMap<String, String>,
    /// Explicit configuration file
    pub config_path: Option<Utf8PathBuf>,
}

impl CommandContext {
    pub fn new(overrides: HashMap<String, String>, config_path: Option<Utf8PathBuf>) -> RbxResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| RbxError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| RbxError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("current directory is not valid UTF-8: {e}"),
        })?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            overrides,
            config_path,
        })
    }

    /// Load and layer global, project, environment and flag configuration
    pub async fn load_config(&self) -> RbxResult<(ClientConfig, ConfigSource)> {
        let loader = ConfigLoader::new(self.cwd.clone());

        let (project, source) = match &self.config_path {
            Some(path) => {
                let path = self.cwd.join(path);
                let config = loader.load_file(&path).await?;
                let source = match path.extension() {
                    Some("json") => ConfigSource::ProjectJson(path),
                    _ => ConfigSource::ProjectToml(path),
                };
                (config, source)
            }
            None => loader.load_project_config().await?,
        };

        let global = match loader.load_global_config().await {
            Ok(global) => global.map(|(config, _)| config),
            Err(err) => {
                warn!(error = %err, "skipping global configuration");
                None
            }
        };

        let config = ConfigLayering::merge_configs(
            global,
            project,
            ConfigLayering::collect_env_overrides(),
            self.overrides.clone(),
        )?;

        Ok((config, source))
    }
}

/// Build an engine for `config`, backing the `"disk"` adapter with a file cache
pub fn build_engine(config: ClientConfig) -> RbxResult<RequestEngine> {
    let mut builder = RequestEngine::builder(config.clone());

    if config.cache.adapter_names().contains(&DISK_ADAPTER) {
        let root = default_cache_dir()?;
        info!(path = %root, "using on-disk response cache");
        builder = builder.adapter(Arc::new(FileCache::named(DISK_ADAPTER, &root)?));
    }

    builder.build()
}

fn default_cache_dir() -> RbxResult<Utf8PathBuf> {
    let base = dirs::cache_dir().ok_or_else(|| RbxError::ConfigValidation {
        field: "cache_dir".to_string(),
        reason: "Could not determine the user cache directory".to_string(),
    })?;
    let base = Utf8PathBuf::try_from(base).map_err(|e| RbxError::ConfigValidation {
        field: "cache_dir".to_string(),
        reason: format!("Invalid cache directory path: {e}"),
    })?;
    Ok(base.join("rbx").join("responses"))
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> RbxResult<()> {
    match command {
        Commands::Call(args) => {
            info!("Calling {} {}", args.method, args.path);
            call::execute(args, ctx).await
        }
        Commands::Check { group, endpoint } => {
            info!("Checking configuration");
            check::execute(group, endpoint, ctx).await
        }
    }
}

/// Human-readable description of where configuration came from
pub fn describe_source(source: &ConfigSource, cwd: &Utf8Path) -> String {
    let relative = |path: &Utf8Path| -> String {
        path.strip_prefix(cwd)
            .map(|p| p.to_string())
            .unwrap_or_else(|_| path.to_string())
    };

    match source {
        ConfigSource::ProjectToml(path) | ConfigSource::ProjectJson(path) | ConfigSource::Global(path) => {
            relative(path)
        }
        ConfigSource::Defaults => "built-in defaults".to_string(),
    }
}
