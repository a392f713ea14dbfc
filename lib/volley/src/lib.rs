//! Fluent HTTP requests with shared sessions.
//!
//! Start a request from a session verb, chain configuration calls, then
//! `send` it. Package-level functions use a lazily created default session.
//!
//! # Example
//!
//! ```no_run
//! use volley::{Data, FileField};
//!
//! # async fn demo() -> volley::Result<()> {
//! // Query parameters and headers
//! let mut response = volley::get("https://httpbin.org/get")?
//!     .params([("key1", "value1"), ("key2", "value2")])
//!     .headers([("Origin", "https://httpbin.org")])?
//!     .send()
//!     .await?;
//! println!("{}", response.text().await?);
//!
//! // JSON round trip
//! let mut response = volley::post("https://httpbin.org/post")?
//!     .json(Data::from([("msg", "hello world"), ("num", "2019")]))
//!     .send()
//!     .await?;
//! let echoed: serde_json::Value = response.json().await?;
//! # let _ = echoed;
//!
//! // File upload
//! let mut response = volley::post("https://httpbin.org/post")?
//!     .files([FileField::new("testimage1", "testimage1.jpg", "./testdata/testimage1.jpg")])
//!     .send()
//!     .await?;
//! # let _ = response.text().await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the [tutorial][_tutorial] for a guided tour.

pub mod _tutorial;
mod builder;
mod config;
mod connector;
pub mod cookie;
pub mod middleware;
pub mod prelude;
mod proxy;
pub mod redirect;
mod response;
mod session;
mod transport;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub use builder::RequestBuilder;
pub use config::{TransportConfig, TransportConfigBuilder};
pub use cookie::{Cookie, CookieStore, Jar};
pub use proxy::Proxy;
pub use redirect::RedirectPolicy;
pub use response::Response;
pub use session::{DEFAULT_TIMEOUT, LockedSession, Session, SessionBuilder};
pub use transport::{BoxedService, HttpResponse, ResponseBody, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use volley_core::{
    ContentType, Data, Error, FileField, Form, Method, Part, Phase, Request, Result,
    TransportError, Value, from_json, header_value, to_json,
};

// Re-export http types for status codes and headers
pub use volley_core::{HeaderMap, StatusCode, Version, header};

pub use url;

static DEFAULT_SESSION: LazyLock<Session> = LazyLock::new(Session::new);

/// The process-wide default session.
///
/// Default transport, no proxy, up to 10 redirects, no cookie jar and a
/// 30 second timeout. It is never reconfigured; the `with_*` functions
/// return new sessions derived from it.
pub fn default_session() -> &'static Session {
    &DEFAULT_SESSION
}

/// Start a request with any method on the default session.
pub fn request(method: Method, url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().request(method, url)
}

/// Start a GET request on the default session.
pub fn get(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().get(url)
}

/// Start a POST request on the default session.
pub fn post(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().post(url)
}

/// Start a PUT request on the default session.
pub fn put(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().put(url)
}

/// Start a DELETE request on the default session.
pub fn delete(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().delete(url)
}

/// Start a PATCH request on the default session.
pub fn patch(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().patch(url)
}

/// Start a HEAD request on the default session.
pub fn head(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().head(url)
}

/// Start an OPTIONS request on the default session.
pub fn options(url: impl AsRef<str>) -> Result<RequestBuilder> {
    default_session().options(url)
}

/// Locked handle on the default session.
#[must_use]
pub fn acquire_lock() -> LockedSession {
    default_session().acquire_lock()
}

/// Default session with another transport configuration.
#[must_use]
pub fn with_transport(config: TransportConfig) -> Session {
    default_session().with_transport(config)
}

/// Default session behind the proxy at `url`.
pub fn with_proxy(url: impl AsRef<str>) -> Result<Session> {
    default_session().with_proxy(url)
}

/// Default session with another redirect policy.
#[must_use]
pub fn with_redirect_policy(policy: RedirectPolicy) -> Session {
    default_session().with_redirect_policy(policy)
}

/// Default session storing cookies in `store`.
#[must_use]
pub fn with_cookie_jar<C: CookieStore + 'static>(store: Arc<C>) -> Session {
    default_session().with_cookie_jar(store)
}

/// Default session with another timeout.
#[must_use]
pub fn with_timeout(timeout: Duration) -> Session {
    default_session().with_timeout(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_shared() {
        assert!(std::ptr::eq(default_session(), default_session()));
        assert_eq!(default_session().timeout(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn package_functions_use_default_session() {
        let builder = get("http://example.com").expect("url");
        assert_eq!(builder.method(), Method::Get);
        assert!(!builder.is_locked());
        assert!(acquire_lock().post("http://example.com").expect("url").is_locked());
    }

    #[test]
    fn overrides_do_not_touch_default() {
        let custom = with_timeout(Duration::from_secs(1));
        assert_eq!(custom.timeout(), Some(Duration::from_secs(1)));
        assert_eq!(default_session().timeout(), Some(DEFAULT_TIMEOUT));
    }
}
