//! Response caching for rbxapi
//!
//! This crate defines the `CacheAdapter` contract the request engine talks
//! to, plus two adapters: an in-memory map with lazy expiry and a
//! directory of JSON files that survives restarts.

pub mod adapter;
pub mod file;
pub mod memory;

// Re-export main types
pub use adapter::{CacheAdapter, CachedResponse};
pub use file::FileCache;
pub use memory::{CacheEntry, CacheStats, MemoryCache};

use rbx_core::error::RbxError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, RbxError>;
