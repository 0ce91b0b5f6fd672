//! Configuration loading for rbxapi
//!
//! This crate handles parsing and validation of `rbx.toml` and `rbx.json`
//! files, layering them with environment and command-line overrides, and
//! resolving which cache settings apply to a given endpoint.

pub mod cache;
pub mod json;
pub mod loader;
pub mod merge;
pub mod toml;

// Re-export main types
pub use crate::cache::{CacheDirective, CacheRules, CacheSentinel, CacheSettings, GroupCacheRule, WILDCARD};
pub use crate::loader::{FileReader, TokioFileReader};
pub use crate::merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use crate::toml::{ClientConfig, DEFAULT_CSRF_RETRIES};

use rbx_core::error::RbxError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, RbxError>;
