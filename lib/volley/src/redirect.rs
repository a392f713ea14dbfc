//! Redirect policies.
//!
//! A session consults its [`RedirectPolicy`] every time a response carries a
//! redirect status and a `Location` header.
//!
//! ```
//! use volley::redirect::{Action, RedirectPolicy};
//!
//! // Only follow redirects that stay on the same host.
//! let policy = RedirectPolicy::custom(|attempt| {
//!     let previous = attempt.previous().last().and_then(|url| url.host_str());
//!     if attempt.url().host_str() == previous {
//!         Action::Follow
//!     } else {
//!         Action::Stop
//!     }
//! });
//! # let _ = policy;
//! ```

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use url::Url;

use crate::{Error, Result};

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// A redirect about to be followed.
#[derive(Debug)]
pub struct Attempt<'a> {
    status: StatusCode,
    next: &'a Url,
    previous: &'a [Url],
}

impl<'a> Attempt<'a> {
    pub(crate) const fn new(status: StatusCode, next: &'a Url, previous: &'a [Url]) -> Self {
        Self {
            status,
            next,
            previous,
        }
    }

    /// Status of the redirect response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Where the redirect points.
    #[must_use]
    pub const fn url(&self) -> &Url {
        self.next
    }

    /// URLs already requested, the original one first.
    #[must_use]
    pub const fn previous(&self) -> &[Url] {
        self.previous
    }

    /// Number of redirects already followed.
    #[must_use]
    pub const fn followed(&self) -> usize {
        self.previous.len().saturating_sub(1)
    }
}

/// What to do with a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Issue the next request.
    Follow,
    /// Return the redirect response as-is.
    Stop,
    /// Fail the send with [`Error::RedirectRejected`].
    Error(String),
}

type Check = Arc<dyn Fn(&Attempt<'_>) -> Action + Send + Sync>;

#[derive(Clone)]
enum Policy {
    Limited(usize),
    None,
    Custom(Check),
}

/// How a session treats redirect responses.
///
/// The default follows up to [`DEFAULT_MAX_REDIRECTS`] redirects.
#[derive(Clone)]
pub struct RedirectPolicy {
    inner: Policy,
}

impl fmt::Debug for RedirectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Policy::Limited(max) => f.debug_tuple("Limited").field(max).finish(),
            Policy::None => f.write_str("None"),
            Policy::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::limited(DEFAULT_MAX_REDIRECTS)
    }
}

impl RedirectPolicy {
    /// Follow at most `max` redirects, then fail with [`Error::TooManyRedirects`].
    #[must_use]
    pub const fn limited(max: usize) -> Self {
        Self {
            inner: Policy::Limited(max),
        }
    }

    /// Never follow; the redirect response is returned to the caller.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            inner: Policy::None,
        }
    }

    /// Decide with a function.
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&Attempt<'_>) -> Action + Send + Sync + 'static,
    {
        Self {
            inner: Policy::Custom(Arc::new(check)),
        }
    }

    /// `Ok(true)` to follow, `Ok(false)` to stop.
    pub(crate) fn check(&self, attempt: &Attempt<'_>) -> Result<bool> {
        match &self.inner {
            Policy::Limited(max) => {
                let followed = attempt.followed();
                if followed >= *max {
                    return Err(Error::TooManyRedirects {
                        count: followed,
                        max: *max,
                    });
                }
                Ok(true)
            }
            Policy::None => Ok(false),
            Policy::Custom(check) => match check(attempt) {
                Action::Follow => Ok(true),
                Action::Stop => Ok(false),
                Action::Error(reason) => Err(Error::RedirectRejected(reason)),
            },
        }
    }
}
