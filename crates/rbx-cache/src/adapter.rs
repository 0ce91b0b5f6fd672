//! The contract between the request engine and a cache store.

use async_trait::async_trait;
use rbx_config::CacheSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CacheResult;

/// What the engine stores per key: the formatted data and the raw body it
/// was produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub data: Value,
    pub body: Value,
}

/// A pluggable key/value store
///
/// Implementations must tolerate concurrent `get`/`set` on the same key. A
/// `get` returns either a complete value or nothing; last `set` wins.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// Name under which cache rules refer to this adapter
    fn name(&self) -> &str;

    /// Whether the engine should hand over a digest instead of the
    /// canonical key text
    fn hashes_keys(&self) -> bool {
        false
    }

    /// Look up a key; a missing or expired key is `Ok(None)`
    async fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>>;

    /// Store a value, honouring `settings.lifetime_secs` when present
    async fn set(&self, settings: &CacheSettings, key: &str, value: CachedResponse) -> CacheResult<()>;
}
