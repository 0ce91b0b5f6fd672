//! Canonical JSON encoding.
//!
//! Produces one textual form per structurally equal value: object keys are
//! emitted in sorted order regardless of insertion order, arrays keep their
//! element order, strings use JSON escaping. The encoding is injective, so
//! two values share a canonical form only when they are equal.

use serde_json::Value;

/// Encode a JSON value canonically
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push_str(&value.to_string());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":[1,2],"x":null}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":null,"y":[1,2]},"b":1}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"x":null,"y":[1,2]},"b":1}"#);
    }

    #[test]
    fn test_array_order_matters() {
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn test_strings_are_escaped() {
        // A key containing a quote must not be confused with a structural quote.
        let tricky = json!({ "a\",\"b": 1 });
        let plain = json!({ "a": 1, "b": 1 });
        assert_ne!(canonical_json(&tricky), canonical_json(&plain));
    }

    #[test]
    fn test_string_and_number_differ() {
        assert_ne!(canonical_json(&json!("1")), canonical_json(&json!(1)));
    }

    proptest! {
        #[test]
        fn prop_insertion_order_is_irrelevant(pairs in proptest::collection::btree_map("[a-z]{1,6}", 0i64..1000, 0..8)) {
            let forward: serde_json::Map<String, Value> =
                pairs.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
            let backward: serde_json::Map<String, Value> =
                pairs.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
            prop_assert_eq!(
                canonical_json(&Value::Object(forward)),
                canonical_json(&Value::Object(backward))
            );
        }

        #[test]
        fn prop_distinct_values_have_distinct_encodings(a in "[ -~]{0,12}", b in "[ -~]{0,12}") {
            prop_assume!(a != b);
            prop_assert_ne!(canonical_json(&json!({ "q": a })), canonical_json(&json!({ "q": b })));
        }
    }
}
