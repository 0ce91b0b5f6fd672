//! Directory-backed response cache
//!
//! Each key is one JSON file under `root/<2 hex>/<digest>.json`. Writes go to
//! a temporary sibling first and are renamed into place, so readers see
//! either the previous file or the complete new one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use rbx_config::CacheSettings;
use rbx_core::error::RbxError;
use rbx_core::utils::blake3_hash;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{CacheAdapter, CachedResponse};
use crate::CacheResult;

/// On-disk representation of one entry
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    stored_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lifetime_secs: Option<u64>,
    value: CachedResponse,
}

impl FileEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.lifetime_secs {
            // A negative age means the clock went backwards; treat as stale.
            Some(secs) => match now.signed_duration_since(self.stored_at).to_std() {
                Ok(age) => age < Duration::from_secs(secs),
                Err(_) => false,
            },
            None => true,
        }
    }
}

/// Remove an expired entry unless a concurrent `set` already replaced it
async fn remove_if_unchanged(path: &Utf8Path, expected: &[u8]) {
    if let Ok(current) = tokio::fs::read(path).await {
        if current == expected {
            debug!(path = %path, "removing expired cache entry");
            let _ = tokio::fs::remove_file(path).await;
        }
    }
}

/// Response cache persisted as one file per key
#[derive(Debug)]
pub struct FileCache {
    /// Adapter name used by cache rules
    name: String,
    /// Root directory for entries
    root_path: Utf8PathBuf,
    /// Suffix source for temporary files
    write_counter: AtomicU64,
}

impl FileCache {
    /// Create a file cache registered as `"disk"`
    pub fn new<P: AsRef<Utf8Path>>(root_path: P) -> CacheResult<Self> {
        Self::named("disk", root_path)
    }

    /// Create a file cache registered under a custom name
    pub fn named<P: AsRef<Utf8Path>>(name: impl Into<String>, root_path: P) -> CacheResult<Self> {
        let root_path = root_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&root_path)
            .map_err(|e| RbxError::io(format!("Failed to create cache directory {}", root_path), e))?;

        Ok(Self {
            name: name.into(),
            root_path,
            write_counter: AtomicU64::new(0),
        })
    }

    /// Get the root path of the cache
    pub fn root_path(&self) -> &Utf8Path {
        &self.root_path
    }

    /// Path of the file holding `key`
    ///
    /// Keys that are not already plain hex digests are hashed so arbitrary
    /// text never reaches the filesystem.
    fn entry_path(&self, key: &str) -> Utf8PathBuf {
        let digest = if key.len() >= 8 && key.chars().all(|c| c.is_ascii_hexdigit()) {
            key.to_ascii_lowercase()
        } else {
            blake3_hash(key.as_bytes())
        };
        self.root_path.join(&digest[0..2]).join(format!("{digest}.json"))
    }

    /// Remove every stored entry
    pub async fn clear(&self) -> CacheResult<()> {
        match tokio::fs::remove_dir_all(&self.root_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(RbxError::io(format!("Failed to clear {}", self.root_path), e)),
        }
        tokio::fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| RbxError::io(format!("Failed to recreate {}", self.root_path), e))
    }
}

#[async_trait]
impl CacheAdapter for FileCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn hashes_keys(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> CacheResult<Option<CachedResponse>> {
        let path = self.entry_path(key);

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RbxError::io(format!("Failed to read cache entry {}", path), e)),
        };

        let entry: FileEntry = serde_json::from_slice(&content).map_err(|e| {
            RbxError::io(
                format!("Corrupt cache entry {}", path),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        if entry.is_fresh(Utc::now()) {
            return Ok(Some(entry.value));
        }

        remove_if_unchanged(&path, &content).await;
        Ok(None)
    }

    async fn set(&self, settings: &CacheSettings, key: &str, value: CachedResponse) -> CacheResult<()> {
        let path = self.entry_path(key);
        let parent = path.parent().unwrap_or(self.root_path.as_path());

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RbxError::io(format!("Failed to create {}", parent), e))?;

        let entry = FileEntry {
            stored_at: Utc::now(),
            lifetime_secs: settings.lifetime_secs,
            value,
        };
        let content = serde_json::to_vec(&entry).map_err(|e| {
            RbxError::io(
                "Failed to serialize cache entry".to_string(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        let sequence = self.write_counter.fetch_add(1, Ordering::Relaxed);
        let temp_path = parent.join(format!(
            "{}.{}.{}.tmp",
            path.file_name().unwrap_or("entry"),
            std::process::id(),
            sequence
        ));

        tokio::fs::write(&temp_path, &content)
            .await
            .map_err(|e| RbxError::io(format!("Failed to write {}", temp_path), e))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(RbxError::io(format!("Failed to move cache entry into {}", path), e));
        }

        Ok(())
    }
}
