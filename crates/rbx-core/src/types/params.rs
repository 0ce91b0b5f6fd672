//! Search parameter types for endpoint descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single search parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Query-string form; lists are joined with commas
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Scalar(value) => value.clone(),
            ParamValue::List(values) => values.join(","),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

macro_rules! scalar_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_from_number!(i32, i64, u32, u64, usize);

impl<T: ToString> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for ParamValue {
    fn from(values: &[T]) -> Self {
        ParamValue::List(values.iter().map(ToString::to_string).collect())
    }
}

/// Ordered mapping of search parameter names to values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchParams(BTreeMap<String, ParamValue>);

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Name/value pairs in name order, ready for a query string
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), value.to_query_value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_are_sorted_and_joined() {
        let mut params = SearchParams::new();
        params.insert("userIds", vec![3u64, 1, 2]);
        params.insert("format", "Png");
        params.insert("isCircular", false);

        assert_eq!(
            params.query_pairs(),
            vec![
                ("format".to_string(), "Png".to_string()),
                ("isCircular".to_string(), "false".to_string()),
                ("userIds".to_string(), "3,1,2".to_string()),
            ]
        );
    }

    #[test]
    fn test_param_value_serde_shape() {
        let scalar: ParamValue = serde_json::from_str("\"10\"").unwrap();
        let list: ParamValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(scalar, ParamValue::Scalar("10".to_string()));
        assert_eq!(list, ParamValue::List(vec!["a".to_string(), "b".to_string()]));
    }
}
