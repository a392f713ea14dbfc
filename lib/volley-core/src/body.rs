//! JSON encoding and the content types volley sets by default.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Body encodings that get a default `Content-Type`.
///
/// Multipart bodies are absent: their header carries a per-request boundary
/// and comes from [`Form::content_type`](crate::Form::content_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
}

impl ContentType {
    /// Header value for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// Whether a `Content-Type` header value denotes this encoding.
    ///
    /// Parameters such as `charset` are ignored.
    #[must_use]
    pub fn matches(self, header: &str) -> bool {
        let essence = header.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode a value as a JSON request body.
///
/// ```
/// use volley_core::{Data, to_json};
///
/// let body = to_json(&Data::from([("msg", "hello world")])).expect("serialize");
/// assert_eq!(body.as_ref(), br#"{"msg":"hello world"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Decode a JSON response body.
///
/// Failures report where in the document decoding stopped, as a dotted
/// path such as `user.address.city`.
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| Error::json_deserialization(err.path().to_string(), err.inner().to_string()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn content_type_matches_ignores_parameters() {
        assert!(ContentType::Json.matches("application/json; charset=utf-8"));
        assert!(ContentType::Json.matches("Application/JSON"));
        assert!(!ContentType::Json.matches("application/x-www-form-urlencoded"));
        assert_eq!(
            ContentType::FormUrlEncoded.to_string(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn decode_reports_nested_path() {
        #[derive(Debug, Deserialize)]
        struct Inner {
            #[allow(dead_code)]
            num: u32,
        }

        #[derive(Debug, Deserialize)]
        struct Outer {
            #[allow(dead_code)]
            json: Inner,
        }

        let err = from_json::<Outer>(br#"{"json":{"num":"2019"}}"#).expect_err("string for u32");
        assert!(matches!(err, Error::JsonDeserialization { ref path, .. } if path == "json.num"));
        assert!(err.is_decode());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = from_json::<serde_json::Value>(b"<html>").expect_err("not json");
        assert!(err.is_decode());
    }
}
