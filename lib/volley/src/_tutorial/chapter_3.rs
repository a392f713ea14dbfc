//! # Chapter 3: Sessions
//!
//! A [`Session`](crate::Session) owns the connection pool and the settings
//! shared by its requests. The package-level functions use a default one;
//! `with_*` derives a new session and never changes the original.
//!
//! ## Timeouts
//!
//! ```ignore
//! use std::time::Duration;
//!
//! let session = volley::with_timeout(Duration::from_secs(5));
//! session.get(url)?.send().await?;
//! ```
//!
//! The timeout covers the whole exchange: redirects and reading the body.
//!
//! ## Proxies
//!
//! ```ignore
//! let session = volley::with_proxy("http://127.0.0.1:3128")?;
//!
//! // Or pick per request, from the environment or a function
//! let session = volley::Session::new().with_proxy_resolver(volley::Proxy::from_env());
//! ```
//!
//! ## Redirects
//!
//! ```ignore
//! use volley::redirect::{Action, RedirectPolicy};
//!
//! let strict = volley::with_redirect_policy(RedirectPolicy::none());
//! let few = volley::with_redirect_policy(RedirectPolicy::limited(3));
//! let https_only = volley::with_redirect_policy(RedirectPolicy::custom(|attempt| {
//!     if attempt.url().scheme() == "https" {
//!         Action::Follow
//!     } else {
//!         Action::Error("refusing plain http".into())
//!     }
//! }));
//! ```
//!
//! ## Cookie jars
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! let session = volley::with_cookie_jar(Arc::new(volley::Jar::new()));
//! session.get("https://httpbin.org/cookies/set/uid/42")?.send().await?;
//! // The next request to httpbin.org sends `uid=42`.
//! ```
//!
//! ## Sequential sends
//!
//! Builders from a locked handle are sent one at a time, in order:
//!
//! ```ignore
//! let locked = session.acquire_lock();
//! for i in 0..10 {
//!     let locked = locked.clone();
//!     tokio::spawn(async move {
//!         locked.get(url)?.params([(format!("key{i}"), format!("value{i}"))]).send().await
//!     });
//! }
//! ```
//!
//! ## Middleware
//!
//! Any tower layer can wrap the transport:
//!
//! ```ignore
//! use volley::middleware::LoggingLayer;
//!
//! let session = volley::Session::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```
//!
//! Or replace the transport altogether with `transport_service`, which is
//! handy in tests.
