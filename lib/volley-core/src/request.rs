//! Transport-ready HTTP requests.
//!
//! A [`Request`] is what a request builder renders into: the final URL
//! (query string included), the complete header map and the encoded body.
//!
//! # Example
//!
//! ```
//! use volley_core::{Method, Request};
//!
//! let url = "https://api.example.com/users?page=1".parse().expect("url");
//! let request = Request::new(Method::Get, url);
//!
//! assert_eq!(request.url().query(), Some("page=1"));
//! assert!(request.body().is_empty());
//! ```

use bytes::Bytes;
use http::HeaderMap;
use http::header::HeaderValue;

use crate::{Method, Result};

/// An HTTP request with method, URL, headers, and body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: url::Url,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self::from_parts(method, url, HeaderMap::new(), Bytes::new())
    }

    /// Assembles a request from its parts.
    #[must_use]
    pub fn from_parts(method: Method, url: url::Url, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request body (empty when there is none).
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HeaderMap, Bytes) {
        (self.method, self.url, self.headers, self.body)
    }

    /// Convert into an [`http::Request`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a valid HTTP URI.
    pub fn into_http(self) -> Result<http::Request<Bytes>> {
        let mut request = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(self.url.as_str())
            .body(self.body)
            .map_err(|e| crate::Error::invalid_request(e.to_string()))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

/// Parse a header value, mapping failure to [`crate::Error::InvalidHeader`].
pub fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| crate::Error::invalid_header(format!("value of '{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> url::Url {
        url::Url::parse(s).expect("valid URL")
    }

    #[test]
    fn request_parts_round_trip() {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        let request = Request::from_parts(
            Method::Post,
            url("https://api.example.com/users"),
            headers,
            Bytes::from_static(b"{}"),
        );

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.body().as_ref(), b"{}");

        let (method, url, headers, body) = request.into_parts();
        assert_eq!(method, Method::Post);
        assert_eq!(url.path(), "/users");
        assert_eq!(headers.len(), 1);
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn into_http_keeps_everything() {
        let mut request = Request::new(Method::Put, url("http://localhost:8080/a?b=c"));
        request
            .headers_mut()
            .insert("x-trace", HeaderValue::from_static("1"));

        let http_request = request.into_http().expect("http request");

        assert_eq!(http_request.method(), http::Method::PUT);
        assert_eq!(http_request.uri().to_string(), "http://localhost:8080/a?b=c");
        assert_eq!(http_request.headers()["x-trace"], "1");
    }

    #[test]
    fn header_value_rejects_control_characters() {
        assert!(header_value("x-ok", "fine").is_ok());
        let err = header_value("x-bad", "line\nbreak").expect_err("newline");
        assert!(err.to_string().contains("x-bad"));
    }
}
