//! Ordered string pairs for query parameters, headers and form fields.
//!
//! A [`Value`] keeps its pairs in insertion order and allows repeated keys.
//! Two merge policies are available:
//!
//! - [`Value::merge`] overrides: keys present in the other container replace
//!   every existing entry with the same key.
//! - [`Value::append`] appends: all pairs are pushed, duplicates included.
//!
//! # Example
//!
//! ```
//! use volley_core::Value;
//!
//! let mut params = Value::from([("q", "rust lang"), ("page", "1")]);
//! params.add("tag", "http");
//! params.add("tag", "async");
//!
//! assert_eq!(params.encode(), "q=rust+lang&page=1&tag=http&tag=async");
//! ```

use std::fmt;

/// Ordered, multi-valued string mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    pairs: Vec<(String, String)>,
}

impl Value {
    /// Creates an empty container.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Sets `key` to a single `value`.
    ///
    /// The first existing entry for `key` is updated in place and any other
    /// entry with that key is removed; a new key is appended.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
                if let Some(pair) = self.pairs.get_mut(first) {
                    pair.1 = value;
                }
            }
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Appends a pair, keeping existing entries for the same key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// First value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Removes every entry for `key`, returning how many were removed.
    pub fn remove(&mut self, key: &str) -> usize {
        let before = self.pairs.len();
        self.pairs.retain(|(k, _)| k != key);
        before - self.pairs.len()
    }

    /// Returns `true` if at least one entry has this key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Number of pairs (repeated keys counted separately).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if the container holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `other` with override semantics.
    ///
    /// For each key of `other`, the existing entries are replaced by all of
    /// `other`'s values for that key. Keys not in `other` are untouched.
    pub fn merge(&mut self, other: Self) -> &mut Self {
        let mut replaced: Vec<String> = Vec::new();
        for (key, value) in other.pairs {
            if replaced.contains(&key) {
                self.add(key, value);
            } else {
                self.set(key.clone(), value);
                replaced.push(key);
            }
        }
        self
    }

    /// Merges `other` with append semantics: duplicates are kept.
    pub fn append(&mut self, other: Self) -> &mut Self {
        self.pairs.extend(other.pairs);
        self
    }

    /// Encodes as `application/x-www-form-urlencoded` (also used for query strings).
    ///
    /// An empty container encodes to an empty string.
    #[must_use]
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Value {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut value = Self::new();
        value.extend(iter);
        value
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Value {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Value {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
