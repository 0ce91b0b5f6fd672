//! Cache key derivation
//!
//! The key is the canonical JSON encoding of everything that identifies a
//! logical call. Equal calls produce equal text and distinct calls never
//! share one. Adapters that opt into hashing receive a digest instead.

use rbx_cache::CacheAdapter;
use rbx_core::utils::{canonical_json, KeyHasher};
use rbx_core::{ParamValue, SearchParams};
use serde_json::{json, Map, Value};

use crate::registry::EndpointDescriptor;

/// Structural cache key of one call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(descriptor: &EndpointDescriptor) -> Self {
        let identity = json!({
            "group": descriptor.group(),
            "endpoint": descriptor.name(),
            "method": descriptor.method().as_str(),
            "path": descriptor.path(),
            "search": search_value(descriptor.search()),
            "body": descriptor.body().cloned().unwrap_or(Value::Null),
        });
        CacheKey(canonical_json(&identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form handed to `adapter`: the canonical text, or its digest when the
    /// adapter asks for hashed keys
    pub fn for_adapter(&self, adapter: &dyn CacheAdapter, hasher: &dyn KeyHasher) -> String {
        if adapter.hashes_keys() {
            hasher.hash_hex(self.0.as_bytes())
        } else {
            self.0.clone()
        }
    }
}

fn search_value(search: &SearchParams) -> Value {
    let map: Map<String, Value> = search
        .iter()
        .map(|(name, value)| {
            let value = match value {
                ParamValue::Scalar(v) => Value::String(v.clone()),
                ParamValue::List(vs) => Value::Array(vs.iter().cloned().map(Value::String).collect()),
            };
            (name.to_string(), value)
        })
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ApiGroup;
    use proptest::prelude::*;
    use rbx_cache::{FileCache, MemoryCache};
    use rbx_core::utils::Blake3Hasher;

    fn users() -> ApiGroup {
        ApiGroup::new("users", "https://users.roblox.com").unwrap()
    }

    #[test]
    fn test_query_insertion_order_does_not_matter() {
        let a = users().get("search", "/v1/users/search").query("a", 1).query("b", 2).build();
        let b = users().get("search", "/v1/users/search").query("b", 2).query("a", 1).build();
        assert_eq!(CacheKey::derive(&a), CacheKey::derive(&b));
    }

    #[test]
    fn test_body_key_order_does_not_matter() {
        let a = users()
            .post("usernames", "/v1/usernames/users")
            .body(serde_json::from_str(r#"{"x":1,"y":[1,2]}"#).unwrap())
            .build();
        let b = users()
            .post("usernames", "/v1/usernames/users")
            .body(serde_json::from_str(r#"{"y":[1,2],"x":1}"#).unwrap())
            .build();
        assert_eq!(CacheKey::derive(&a), CacheKey::derive(&b));
    }

    #[test]
    fn test_distinct_calls_get_distinct_keys() {
        let group = users();
        let other = ApiGroup::new("friends", "https://users.roblox.com").unwrap();
        let keys = [
            CacheKey::derive(&group.get("userInfo", "/v1/users/1").build()),
            CacheKey::derive(&group.get("userInfo", "/v1/users/2").build()),
            CacheKey::derive(&group.get("other", "/v1/users/1").build()),
            CacheKey::derive(&other.get("userInfo", "/v1/users/1").build()),
            CacheKey::derive(&group.post("userInfo", "/v1/users/1").build()),
            CacheKey::derive(&group.get("userInfo", "/v1/users/1").query("ids", vec!["a,b"]).build()),
            CacheKey::derive(&group.get("userInfo", "/v1/users/1").query("ids", vec!["a", "b"]).build()),
            CacheKey::derive(&group.get("userInfo", "/v1/users/1").query("ids", "a,b").build()),
        ];

        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_adapter_key_form() {
        let key = CacheKey::derive(&users().get("userInfo", "/v1/users/1").build());
        let temp_dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        let disk = FileCache::new(root).unwrap();

        assert_eq!(key.for_adapter(&MemoryCache::new(), &Blake3Hasher), key.as_str());

        let hashed = key.for_adapter(&disk, &Blake3Hasher);
        assert_eq!(hashed.len(), 64);
        assert_eq!(hashed, key.for_adapter(&disk, &Blake3Hasher));
    }

    proptest! {
        #[test]
        fn prop_key_is_deterministic_and_separates_values(
            id in 0u64..10_000,
            other in 0u64..10_000,
            keyword in "[a-zA-Z0-9 ,]{0,12}",
        ) {
            let make = |id: u64, keyword: &str| {
                users()
                    .get("userInfo", format!("/v1/users/{id}"))
                    .query("keyword", keyword)
                    .build()
            };

            prop_assert_eq!(CacheKey::derive(&make(id, &keyword)), CacheKey::derive(&make(id, &keyword)));
            if id != other {
                prop_assert_ne!(CacheKey::derive(&make(id, &keyword)), CacheKey::derive(&make(other, &keyword)));
            }
        }
    }
}
