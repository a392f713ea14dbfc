//! Tower middleware layers used by sessions.
//!
//! Every layer works on [`Request`](crate::Request) and
//! `http::Response<ResponseBody>`, so it can wrap the default transport or
//! an injected one.
//!
//! - [`FollowRedirectLayer`] - Follows redirects per a [`RedirectPolicy`](crate::redirect::RedirectPolicy)
//! - [`CookieLayer`] - Reads and writes a [`CookieStore`](crate::CookieStore)
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//!
//! Sessions install the first two themselves. Extra layers are added with
//! [`SessionBuilder::layer`](crate::SessionBuilder::layer):
//!
//! ```
//! use volley::Session;
//! use volley::middleware::LoggingLayer;
//!
//! let session = Session::builder().layer(LoggingLayer::new()).build();
//! # let _ = session;
//! ```

mod cookies;
mod follow_redirect;
mod logging;

pub use cookies::{CookieLayer, Cookies};
pub(crate) use follow_redirect::EffectiveUrl;
pub use follow_redirect::{FollowRedirect, FollowRedirectLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
