//! String-keyed JSON payloads.
//!
//! # Example
//!
//! ```
//! use volley_core::Data;
//!
//! let data = Data::from([("msg", serde_json::json!("hello world")), ("num", 2019.into())]);
//! assert_eq!(data.encode(), r#"{"msg":"hello world","num":2019}"#);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// JSON object builder: unique string keys mapped to arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Data {
    fields: Map<String, Json>,
}

impl Data {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing any previous value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Json>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Field value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.fields.get(key)
    }

    /// Removes a field.
    pub fn remove(&mut self, key: &str) -> Option<Json> {
        self.fields.remove(key)
    }

    /// Merges `other` into `self`; fields of `other` win.
    pub fn merge(&mut self, other: Self) -> &mut Self {
        self.fields.extend(other.fields);
        self
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes as a JSON document. An empty object encodes to `{}`.
    #[must_use]
    pub fn encode(&self) -> String {
        Json::Object(self.fields.clone()).to_string()
    }

    /// Converts into a [`serde_json::Value`] object.
    #[must_use]
    pub fn into_value(self) -> Json {
        Json::Object(self.fields)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<Map<String, Json>> for Data {
    fn from(fields: Map<String, Json>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<Json>, const N: usize> From<[(K, V); N]> for Data {
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Json>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
