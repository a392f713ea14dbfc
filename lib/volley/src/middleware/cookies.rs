//! Cookie jar middleware.
//!
//! Adds the store's cookies to every outgoing request (each redirect hop
//! included) and saves the `Set-Cookie` headers of every response.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::{COOKIE, SET_COOKIE};
use tower::{Layer, Service, ServiceExt};

use crate::cookie::CookieStore;
use crate::transport::HttpResponse;
use crate::{Error, Request, Result, header_value};

/// Layer that connects a service to a [`CookieStore`].
#[derive(Clone)]
pub struct CookieLayer {
    store: Arc<dyn CookieStore>,
}

impl fmt::Debug for CookieLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLayer").finish_non_exhaustive()
    }
}

impl CookieLayer {
    /// Create a layer over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CookieStore>) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for CookieLayer {
    type Service = Cookies<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cookies {
            inner,
            store: Arc::clone(&self.store),
        }
    }
}

/// Service that reads and writes a cookie store around each request.
#[derive(Clone)]
pub struct Cookies<S> {
    inner: S,
    store: Arc<dyn CookieStore>,
}

impl<S: fmt::Debug> fmt::Debug for Cookies<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookies")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

fn attach_cookies(store: &dyn CookieStore, request: &mut Request) -> Result<()> {
    let Some(stored) = store.cookies(request.url()) else {
        return Ok(());
    };

    let merged = match request.header(COOKIE.as_str()) {
        Some(explicit) => {
            let stored = stored
                .to_str()
                .map_err(|e| Error::invalid_header(e.to_string()))?;
            header_value(COOKIE.as_str(), &format!("{explicit}; {stored}"))?
        }
        None => stored,
    };
    request.headers_mut().insert(COOKIE, merged);
    Ok(())
}

impl<S> Service<Request> for Cookies<S>
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

    fn call(&mut self, mut request: Request) -> Self::Future {
        let inner = self.inner.clone();
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            attach_cookies(store.as_ref(), &mut request)?;
            let url = request.url().clone();

            let response = inner.oneshot(request).await?;

            let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
            store.set_cookies(&url, &mut set_cookies);
            Ok(response)
        })
    }
}
