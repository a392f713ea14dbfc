//! Follow redirect middleware.
//!
//! Follows 3xx responses with a `Location` header as the session's
//! [`RedirectPolicy`] allows, and records the final URL on the response.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::StatusCode;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION};
use tower::{Layer, Service, ServiceExt};
use url::Url;

use crate::redirect::{Attempt, RedirectPolicy};
use crate::transport::HttpResponse;
use crate::{Error, Method, Request, Result};

/// URL that produced the final response, stored in response extensions.
#[derive(Debug, Clone)]
pub(crate) struct EffectiveUrl(pub(crate) Url);

/// Layer that follows HTTP redirects.
#[derive(Debug, Clone, Default)]
pub struct FollowRedirectLayer {
    policy: RedirectPolicy,
}

impl FollowRedirectLayer {
    /// Create a layer with the given policy.
    #[must_use]
    pub const fn new(policy: RedirectPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// Service that follows HTTP redirects.
#[derive(Debug, Clone)]
pub struct FollowRedirect<S> {
    inner: S,
    policy: RedirectPolicy,
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// 301, 302 and 303 switch to GET (HEAD stays HEAD); 307 and 308 keep the method.
fn redirect_method(status: StatusCode, original: Method) -> Method {
    match status.as_u16() {
        307 | 308 => original,
        _ if original == Method::Head => Method::Head,
        _ => Method::Get,
    }
}

fn resolve_redirect_url(base_url: &Url, location: &str) -> Result<Url> {
    base_url.join(location).map_err(Error::InvalidUrl)
}

/// Credentials follow a redirect only to the same host, and never from
/// `https` down to `http`.
fn keeps_credentials(from: &Url, to: &Url) -> bool {
    let downgraded = from.scheme() == "https" && to.scheme() == "http";
    from.host_str() == to.host_str() && !downgraded
}

/// Request for the next hop, derived from the one that was redirected.
fn next_request(current: Request, status: StatusCode, next: Url) -> Request {
    let method = redirect_method(status, current.method());
    let keep_body = matches!(status.as_u16(), 307 | 308);
    let strip_credentials = !keeps_credentials(current.url(), &next);
    let (_, _, mut headers, body) = current.into_parts();

    let body = if keep_body {
        body
    } else {
        headers.remove(CONTENT_TYPE);
        headers.remove(CONTENT_LENGTH);
        Bytes::new()
    };
    if strip_credentials {
        headers.remove(AUTHORIZATION);
        headers.remove(COOKIE);
    }

    Request::from_parts(method, next, headers, body)
}

impl<S> Service<Request> for FollowRedirect<S>
where
    S: Service<Request, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = HttpResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            let mut current = request;
            let mut visited = vec![current.url().clone()];

            loop {
                let mut response = inner.ready().await?.call(current.clone()).await?;
                let status = response.status();

                let location = match response.headers().get(LOCATION) {
                    Some(value) if is_redirect(status) => Some(
                        value
                            .to_str()
                            .map_err(|_| {
                                Error::InvalidRedirect("Location header is not valid ASCII".into())
                            })?
                            .to_owned(),
                    ),
                    _ => None,
                };
                let Some(location) = location else {
                    response
                        .extensions_mut()
                        .insert(EffectiveUrl(current.url().clone()));
                    return Ok(response);
                };

                let next = resolve_redirect_url(current.url(), &location)?;

                if !policy.check(&Attempt::new(status, &next, &visited))? {
                    tracing::debug!(status = status.as_u16(), location = %next, "not following redirect");
                    response
                        .extensions_mut()
                        .insert(EffectiveUrl(current.url().clone()));
                    return Ok(response);
                }

                tracing::debug!(status = status.as_u16(), location = %next, "following redirect");
                drop(response);
                current = next_request(current, status, next.clone());
                visited.push(next);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use http::header::HeaderValue;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid URL")
    }

    #[test]
    fn is_redirect_statuses() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(StatusCode::from_u16(code).expect("status")));
        }
        for code in [200, 300, 304, 404, 500] {
            assert!(!is_redirect(StatusCode::from_u16(code).expect("status")));
        }
    }

    #[test]
    fn redirect_method_rules() {
        assert_eq!(redirect_method(StatusCode::MOVED_PERMANENTLY, Method::Post), Method::Get);
        assert_eq!(redirect_method(StatusCode::FOUND, Method::Put), Method::Get);
        assert_eq!(redirect_method(StatusCode::SEE_OTHER, Method::Delete), Method::Get);
        assert_eq!(redirect_method(StatusCode::SEE_OTHER, Method::Head), Method::Head);
        assert_eq!(
            redirect_method(StatusCode::TEMPORARY_REDIRECT, Method::Post),
            Method::Post
        );
        assert_eq!(
            redirect_method(StatusCode::PERMANENT_REDIRECT, Method::Put),
            Method::Put
        );
    }

    #[test]
    fn resolve_absolute_and_relative() {
        let base = url("https://example.com/old/path");
        assert_eq!(
            resolve_redirect_url(&base, "https://other.com/new")
                .expect("resolve")
                .as_str(),
            "https://other.com/new"
        );
        assert_eq!(
            resolve_redirect_url(&base, "/new/path").expect("resolve").as_str(),
            "https://example.com/new/path"
        );
        assert_eq!(
            resolve_redirect_url(&base, "sibling").expect("resolve").as_str(),
            "https://example.com/old/sibling"
        );
    }

    fn post_with_credentials() -> Request {
        post_with_credentials_to("http://example.com/submit")
    }

    fn post_with_credentials_to(target: &str) -> Request {
        let mut request = Request::from_parts(
            Method::Post,
            url(target),
            http::HeaderMap::new(),
            Bytes::from_static(b"a=1"),
        );
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(COOKIE, HeaderValue::from_static("s=1"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        request
    }

    #[test]
    fn see_other_drops_body() {
        let next = next_request(
            post_with_credentials(),
            StatusCode::SEE_OTHER,
            url("http://example.com/done"),
        );
        assert_eq!(next.method(), Method::Get);
        assert!(next.body().is_empty());
        assert!(next.headers().get(CONTENT_TYPE).is_none());
        assert!(next.headers().get(AUTHORIZATION).is_some());
    }

    #[test]
    fn temporary_redirect_keeps_body() {
        let next = next_request(
            post_with_credentials(),
            StatusCode::TEMPORARY_REDIRECT,
            url("http://example.com/retry"),
        );
        assert_eq!(next.method(), Method::Post);
        assert_eq!(next.body().as_ref(), b"a=1");
        assert!(next.headers().get(CONTENT_TYPE).is_some());
    }

    #[test]
    fn cross_host_strips_credentials() {
        let next = next_request(
            post_with_credentials(),
            StatusCode::PERMANENT_REDIRECT,
            url("http://other.example.net/submit"),
        );
        assert!(next.headers().get(AUTHORIZATION).is_none());
        assert!(next.headers().get(COOKIE).is_none());
    }

    #[test]
    fn https_to_http_strips_credentials() {
        let next = next_request(
            post_with_credentials_to("https://example.com/submit"),
            StatusCode::FOUND,
            url("http://example.com/done"),
        );
        assert!(next.headers().get(AUTHORIZATION).is_none());
        assert!(next.headers().get(COOKIE).is_none());
    }

    #[test]
    fn http_to_https_keeps_credentials() {
        let next = next_request(
            post_with_credentials(),
            StatusCode::FOUND,
            url("https://example.com/done"),
        );
        assert!(next.headers().get(AUTHORIZATION).is_some());
        assert!(next.headers().get(COOKIE).is_some());
    }
}
