//! `tracing` output for every hop a session sends.
//!
//! Each call runs inside an `http_request` span carrying the method and URL.
//! Error statuses and failures are raised to `warn` whatever the level.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http::HeaderMap;
use tower::{Layer, Service, ServiceExt};
use tracing::Instrument;

use crate::transport::HttpResponse;
use crate::{Error, Request, Result};

/// How much the logging layer reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// `debug` events, with header names and body sizes.
    Debug,
    /// `info` events with method, URL, status and latency.
    #[default]
    Info,
}

/// Layer producing [`Logging`] services.
///
/// ```
/// use volley::Session;
/// use volley::middleware::LoggingLayer;
///
/// let session = Session::builder().layer(LoggingLayer::debug()).build();
/// # let _ = session;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// Summary logging at `info`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detailed logging at `debug`.
    #[must_use]
    pub fn debug() -> Self {
        Self::with_level(LogLevel::Debug)
    }

    /// Logging at an explicit level.
    #[must_use]
    pub const fn with_level(level: LogLevel) -> Self {
        Self { level }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service emitting one event per request and one per outcome.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

/// Header names only; values may hold credentials or cookies.
fn header_names(headers: &HeaderMap) -> Vec<&str> {
    headers.keys().map(http::HeaderName::as_str).collect()
}

fn log_request(level: LogLevel, request: &Request) {
    match level {
        LogLevel::Debug => tracing::debug!(
            headers = ?header_names(request.headers()),
            body_len = request.body().len(),
            "request sent"
        ),
        LogLevel::Info => tracing::info!("request sent"),
    }
}

fn log_outcome(level: LogLevel, result: &Result<HttpResponse>, elapsed_ms: u64) {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, phase = ?err.phase(), elapsed_ms, "request failed");
            return;
        }
    };

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        tracing::warn!(status = status.as_u16(), elapsed_ms, "error status received");
        return;
    }
    match level {
        LogLevel::Debug => tracing::debug!(
            status = status.as_u16(),
            elapsed_ms,
            headers = ?header_names(response.headers()),
            "response received"
        ),
        LogLevel::Info => tracing::info!(status = status.as_u16(), elapsed_ms, "response received"),
    }
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = HttpResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = tracing::info_span!(
            "http_request",
            method = %request.method(),
            url = %request.url(),
        );
        let level = self.level;
        let inner = self.inner.clone();

        Box::pin(
            async move {
                log_request(level, &request);
                let started = Instant::now();
                let result = inner.oneshot(request).await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                log_outcome(level, &result, elapsed_ms);
                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::HeaderValue;
    use http_body_util::{BodyExt, Empty};

    use super::*;
    use crate::Method;

    #[test]
    fn levels() {
        assert_eq!(LoggingLayer::new().level, LogLevel::Info);
        assert_eq!(LoggingLayer::debug().level, LogLevel::Debug);
        assert_eq!(LoggingLayer::with_level(LogLevel::Info).level, LogLevel::Info);
    }

    #[test]
    fn only_header_names_are_logged() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        headers.insert("accept", HeaderValue::from_static("*/*"));

        let names = header_names(&headers);
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"authorization"));
        assert!(!format!("{names:?}").contains("secret"));
    }

    #[tokio::test]
    async fn passes_responses_through() {
        let inner = tower::service_fn(|_: Request| async {
            let body = Empty::<Bytes>::new()
                .map_err(|never| -> Error { match never {} })
                .boxed_unsync();
            Ok::<_, Error>(
                http::Response::builder()
                    .status(503)
                    .body(body)
                    .expect("response"),
            )
        });
        let request = Request::new(
            Method::Get,
            url::Url::parse("http://example.com/").expect("url"),
        );

        let response = LoggingLayer::debug()
            .layer(inner)
            .oneshot(request)
            .await
            .expect("error statuses pass through");
        assert_eq!(response.status(), 503);
    }
}
