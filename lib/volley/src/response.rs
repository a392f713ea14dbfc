//! Response wrapper with lazy body decoding.

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use url::Url;

use crate::middleware::EffectiveUrl;
use crate::transport::{HttpResponse, ResponseBody};
use crate::{Error, Result, from_json};

/// An HTTP response whose body has not been read yet.
///
/// The body can be decoded once, with [`bytes`](Self::bytes),
/// [`text`](Self::text) or [`json`](Self::json); later calls return
/// [`Error::BodyConsumed`]. Dropping the response releases the connection.
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Url,
    body: Option<ResponseBody>,
    deadline: Option<Instant>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("version", &self.version)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("consumed", &self.body.is_none())
            .finish_non_exhaustive()
    }
}

impl Response {
    pub(crate) fn new(response: HttpResponse, request_url: Url, deadline: Option<Instant>) -> Self {
        let (mut parts, body) = response.into_parts();
        let url = parts
            .extensions
            .remove::<EffectiveUrl>()
            .map_or(request_url, |effective| effective.0);

        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            url,
            body: Some(body),
            deadline,
        }
    }

    /// Status code as a number.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// HTTP version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// URL of the final request, after redirects.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 3xx
    #[must_use]
    pub fn is_redirection(&self) -> bool {
        self.status.is_redirection()
    }

    /// 4xx
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// 5xx
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Whether the body was already decoded.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.body.is_none()
    }

    /// Read the whole body.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        let body = self.body.take().ok_or(Error::BodyConsumed)?;
        let collect = body.collect();

        let collected = match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, collect)
                .await
                .map_err(|_| Error::Timeout)??,
            None => collect.await?,
        };
        Ok(collected.to_bytes())
    }

    /// Read the body as UTF-8 text.
    pub async fn text(&mut self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Deserialize the body as JSON.
    ///
    /// On failure the error names the path of the offending field.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.bytes().await?;
        from_json(&bytes)
    }
}
