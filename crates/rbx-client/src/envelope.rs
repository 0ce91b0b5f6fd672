//! Uniform result envelope returned by every call

use rbx_cache::CachedResponse;
use rbx_core::HttpResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field Roblox list endpoints use to point at the following page
pub const NEXT_PAGE_CURSOR: &str = "nextPageCursor";

/// Where the data of a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachedResultType {
    /// Fetched from the network; caching off or the write failed
    Live,
    /// Served from a cache adapter without touching the network
    Cached,
    /// Fetched from the network and written to the cache
    LiveThenCached,
}

/// Result of one executed call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// Raw HTTP response; absent for cache hits
    pub response: Option<HttpResponse>,
    /// Formatted value, or the body when the endpoint has no formatter
    pub data: Value,
    /// Decoded body as the network or cache returned it
    pub body: Value,
    pub cached_result_type: CachedResultType,
}

impl ApiResponse {
    pub(crate) fn from_cache(hit: CachedResponse) -> Self {
        Self {
            response: None,
            data: hit.data,
            body: hit.body,
            cached_result_type: CachedResultType::Cached,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached_result_type == CachedResultType::Cached
    }

    /// Deserialize `data` into a concrete type
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }

    /// Cursor of the next page, if the body advertises one
    pub fn next_cursor(&self) -> Option<&str> {
        self.body
            .get(NEXT_PAGE_CURSOR)
            .and_then(Value::as_str)
            .filter(|cursor| !cursor.is_empty())
    }
}

/// Decode raw response text: empty is `null`, JSON is parsed, anything else
/// is kept as a string
pub fn decode_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
