//! Reusable response formatters

use std::collections::BTreeMap;
use std::sync::Arc;

use rbx_core::error::{RbxError, RbxResult};
use rbx_core::BoxError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::registry::Formatter;

/// Wrap a closure as a [`Formatter`]
pub fn from_fn<F>(f: F) -> Formatter
where
    F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Check the raw body against `T` and emit it in `T`'s serialized shape
pub fn typed<T>() -> Formatter
where
    T: DeserializeOwned + Serialize + 'static,
{
    Arc::new(|raw: &Value| -> Result<Value, BoxError> {
        let parsed: T = serde_json::from_value(raw.clone())?;
        Ok(serde_json::to_value(parsed)?)
    })
}

/// Rename top-level fields of an object, or of every object in an array
///
/// Each source field maps to its own target. Two sources sharing a target
/// would silently overwrite each other and are rejected here.
pub fn rename_fields(pairs: &[(&str, &str)]) -> RbxResult<Formatter> {
    let mut renames: BTreeMap<String, String> = BTreeMap::new();
    let mut targets: BTreeMap<&str, &str> = BTreeMap::new();

    for &(from, to) in pairs {
        if let Some(previous) = targets.insert(to, from) {
            return Err(RbxError::ConfigValidation {
                field: "rename_fields".to_string(),
                reason: format!("'{previous}' and '{from}' both map to '{to}'"),
            });
        }
        if renames.insert(from.to_string(), to.to_string()).is_some() {
            return Err(RbxError::ConfigValidation {
                field: "rename_fields".to_string(),
                reason: format!("'{from}' is renamed twice"),
            });
        }
    }

    Ok(Arc::new(move |raw: &Value| rename_value(raw, &renames)))
}

fn rename_value(raw: &Value, renames: &BTreeMap<String, String>) -> Result<Value, BoxError> {
    match raw {
        Value::Object(map) => Ok(Value::Object(rename_object(map, renames))),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(Value::Object(rename_object(map, renames))),
                other => Err(BoxError::from(format!("expected an object, found {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(format!("expected an object or array, found {other}").into()),
    }
}

fn rename_object(map: &Map<String, Value>, renames: &BTreeMap<String, String>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let key = renames.get(key).cloned().unwrap_or_else(|| key.clone());
            (key, value.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct User {
        id: u64,
        display_name: String,
    }

    #[test]
    fn test_typed_accepts_matching_shape() {
        let formatter = typed::<User>();
        let data = formatter(&json!({ "id": 1, "displayName": "Roblox", "extra": true })).unwrap();
        assert_eq!(data, json!({ "id": 1, "displayName": "Roblox" }));
    }

    #[test]
    fn test_typed_rejects_wrong_shape() {
        let formatter = typed::<User>();
        assert!(formatter(&json!({ "id": "one" })).is_err());
    }

    #[test]
    fn test_rename_fields_keeps_distinct_targets() {
        let formatter = rename_fields(&[
            ("created", "createdAt"),
            ("updated", "updatedAt"),
            ("deleted", "deletedAt"),
        ])
        .unwrap();

        let data = formatter(&json!({ "created": 1, "updated": 2, "deleted": 3, "id": 9 })).unwrap();
        assert_eq!(
            data,
            json!({ "createdAt": 1, "updatedAt": 2, "deletedAt": 3, "id": 9 })
        );
    }

    #[test]
    fn test_rename_fields_rejects_shared_target() {
        let err = rename_fields(&[("created", "timestamp"), ("updated", "timestamp")]).err().unwrap();
        assert!(matches!(err, RbxError::ConfigValidation { .. }));
        assert!(err.to_string().contains("timestamp"));
    }

    #[test]
    fn test_rename_fields_over_arrays() {
        let formatter = rename_fields(&[("name", "username")]).unwrap();
        assert_eq!(
            formatter(&json!([{ "name": "a" }, { "name": "b" }])).unwrap(),
            json!([{ "username": "a" }, { "username": "b" }])
        );
        assert!(formatter(&json!([1])).is_err());
        assert!(formatter(&json!("text")).is_err());
    }

    #[test]
    fn test_from_fn() {
        let formatter = from_fn(|raw| Ok(raw["data"].clone()));
        assert_eq!(formatter(&json!({ "data": 5 })).unwrap(), json!(5));
    }
}
