//! Sessions: shared configuration and connection pool for requests.
//!
//! A [`Session`] is cheap to clone and safe to share between tasks. Its
//! configuration never changes after construction; the `with_*` methods
//! return a new session and leave the original untouched.
//!
//! Requests go through this tower stack, outermost first:
//!
//! 1. redirect following (per [`RedirectPolicy`])
//! 2. the cookie store, when one is configured
//! 3. layers added with [`SessionBuilder::layer`], last added outermost
//! 4. the transport (hyper by default, or [`SessionBuilder::transport_service`])

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tower::util::BoxCloneService;
use tower::{Layer, Service};

use crate::builder::RequestBuilder;
use crate::config::TransportConfig;
use crate::cookie::CookieStore;
use crate::middleware::{CookieLayer, FollowRedirectLayer, LoggingLayer};
use crate::proxy::Proxy;
use crate::redirect::RedirectPolicy;
use crate::transport::{BoxedService, HttpResponse, HyperTransport, SyncService};
use crate::{Error, Method, Request, Response, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

struct SessionInner {
    service: SyncService,
    settings: SessionBuilder,
    lock: Arc<Mutex<()>>,
}

/// Shared HTTP session.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// # async fn demo() -> volley::Result<()> {
/// let session = volley::Session::new().with_timeout(Duration::from_secs(5));
///
/// let mut response = session
///     .get("https://httpbin.org/get")?
///     .params([("key1", "value1")])
///     .send()
///     .await?;
/// println!("{}", response.text().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a session with default configuration.
    #[must_use]
    pub fn new() -> Self {
        SessionBuilder::default().build()
    }

    /// Create a new session builder.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// A builder preloaded with this session's configuration.
    ///
    /// The connection pool is shared with the new session unless the
    /// transport or proxy settings are changed.
    #[must_use]
    pub fn to_builder(&self) -> SessionBuilder {
        self.inner.settings.clone()
    }

    // ========================================================================
    // Derived sessions
    // ========================================================================

    /// Same session with another transport configuration (new connection pool).
    #[must_use]
    pub fn with_transport(&self, config: TransportConfig) -> Self {
        self.to_builder().transport(config).build()
    }

    /// Same session sending every request through the proxy at `url`.
    pub fn with_proxy(&self, url: impl AsRef<str>) -> Result<Self> {
        Ok(self.to_builder().proxy(Proxy::all(url)?).build())
    }

    /// Same session choosing proxies with `proxy`.
    #[must_use]
    pub fn with_proxy_resolver(&self, proxy: Proxy) -> Self {
        self.to_builder().proxy(proxy).build()
    }

    /// Same session with another redirect policy.
    #[must_use]
    pub fn with_redirect_policy(&self, policy: RedirectPolicy) -> Self {
        self.to_builder().redirect_policy(policy).build()
    }

    /// Same session storing cookies in `store`.
    #[must_use]
    pub fn with_cookie_jar<C: CookieStore + 'static>(&self, store: Arc<C>) -> Self {
        self.to_builder().cookie_store(store).build()
    }

    /// Same session with another request timeout.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.to_builder().timeout(timeout).build()
    }

    /// Same session without any request timeout.
    #[must_use]
    pub fn without_timeout(&self) -> Self {
        self.to_builder().no_timeout().build()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Request timeout, covering redirects and body reads.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.settings.timeout
    }

    /// Transport configuration.
    #[must_use]
    pub fn transport_config(&self) -> &TransportConfig {
        &self.inner.settings.transport
    }

    /// Redirect policy.
    #[must_use]
    pub fn redirect_policy(&self) -> &RedirectPolicy {
        &self.inner.settings.redirect
    }

    /// Whether a cookie store is attached.
    #[must_use]
    pub fn has_cookie_store(&self) -> bool {
        self.inner.settings.cookie_store.is_some()
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    /// Start a request with any method.
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> Result<RequestBuilder> {
        RequestBuilder::new(self.clone(), method, url.as_ref(), false)
    }

    /// Start a GET request.
    pub fn get(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Get, url)
    }

    /// Start a POST request.
    pub fn post(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Post, url)
    }

    /// Start a PUT request.
    pub fn put(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Put, url)
    }

    /// Start a DELETE request.
    pub fn delete(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Delete, url)
    }

    /// Start a PATCH request.
    pub fn patch(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Patch, url)
    }

    /// Start a HEAD request.
    pub fn head(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Head, url)
    }

    /// Start an OPTIONS request.
    pub fn options(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Options, url)
    }

    /// Handle whose requests are sent one at a time, in arrival order.
    ///
    /// Requests started from other handles of the session are not affected.
    #[must_use]
    pub fn acquire_lock(&self) -> LockedSession {
        LockedSession {
            session: self.clone(),
        }
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Send a prepared request through the session stack.
    ///
    /// The session timeout applies until the response head arrives, and the
    /// same deadline bounds reading the body afterwards.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let deadline = self.inner.settings.timeout.map(|t| Instant::now() + t);
        let url = request.url().clone();
        tracing::debug!(method = %request.method(), url = %url, "executing request");

        let call = self.inner.service.call(request);
        let response = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call)
                .await
                .map_err(|_| Error::Timeout)??,
            None => call.await?,
        };

        Ok(Response::new(response, url, deadline))
    }

    pub(crate) async fn lock_owned(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.inner.lock).lock_owned().await
    }
}

/// Session handle whose builders serialize through the session lock.
///
/// Obtained with [`Session::acquire_lock`].
#[derive(Debug, Clone)]
pub struct LockedSession {
    session: Session,
}

impl LockedSession {
    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Start a request with any method.
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> Result<RequestBuilder> {
        RequestBuilder::new(self.session.clone(), method, url.as_ref(), true)
    }

    /// Start a GET request.
    pub fn get(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Get, url)
    }

    /// Start a POST request.
    pub fn post(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Post, url)
    }

    /// Start a PUT request.
    pub fn put(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Put, url)
    }

    /// Start a DELETE request.
    pub fn delete(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Delete, url)
    }

    /// Start a PATCH request.
    pub fn patch(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Patch, url)
    }

    /// Start a HEAD request.
    pub fn head(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Head, url)
    }

    /// Start an OPTIONS request.
    pub fn options(&self, url: impl AsRef<str>) -> Result<RequestBuilder> {
        self.request(Method::Options, url)
    }
}

/// Builder for [`Session`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use volley::redirect::RedirectPolicy;
/// use volley::{Jar, Session, TransportConfig};
///
/// let session = Session::builder()
///     .transport(TransportConfig::builder().connect_timeout(Duration::from_secs(3)).build())
///     .redirect_policy(RedirectPolicy::limited(3))
///     .cookie_store(Arc::new(Jar::new()))
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build();
///
/// assert_eq!(session.timeout(), Some(Duration::from_secs(10)));
/// ```
#[derive(Clone)]
pub struct SessionBuilder {
    transport: TransportConfig,
    proxy: Option<Proxy>,
    redirect: RedirectPolicy,
    cookie_store: Option<Arc<dyn CookieStore>>,
    timeout: Option<Duration>,
    layers: Vec<LayerFn>,
    service: Option<SyncService>,
    pooled: Option<HyperTransport>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            proxy: None,
            redirect: RedirectPolicy::default(),
            cookie_store: None,
            timeout: Some(DEFAULT_TIMEOUT),
            layers: Vec::new(),
            service: None,
            pooled: None,
        }
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("transport", &self.transport)
            .field("proxy", &self.proxy)
            .field("redirect", &self.redirect)
            .field("cookie_store", &self.cookie_store.is_some())
            .field("timeout", &self.timeout)
            .field("layers_count", &self.layers.len())
            .field("custom_transport", &self.service.is_some())
            .finish()
    }
}

impl SessionBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Set the transport configuration.
    #[must_use]
    pub fn transport(mut self, config: TransportConfig) -> Self {
        self.transport = config;
        self.pooled = None;
        self
    }

    /// Set the proxy selection.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self.pooled = None;
        self
    }

    /// Connect directly, without any proxy.
    #[must_use]
    pub fn no_proxy(mut self) -> Self {
        self.proxy = None;
        self.pooled = None;
        self
    }

    /// Set the redirect policy.
    #[must_use]
    pub fn redirect_policy(mut self, policy: RedirectPolicy) -> Self {
        self.redirect = policy;
        self
    }

    /// Persist cookies in `store`.
    #[must_use]
    pub fn cookie_store<C: CookieStore + 'static>(mut self, store: Arc<C>) -> Self {
        self.cookie_store = Some(store);
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the request timeout.
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    // ========================================================================
    // Generic Middleware API
    // ========================================================================

    /// Add a Tower layer around the transport.
    ///
    /// Layers sit inside redirect and cookie handling, so they see every hop.
    /// The last layer added is the outermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Replace the hyper transport with any tower service.
    ///
    /// Transport and proxy settings are ignored while a custom service is set.
    #[must_use]
    pub fn transport_service<S>(mut self, service: S) -> Self
    where
        S: Service<Request, Response = HttpResponse, Error = Error> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        self.service = Some(SyncService::new(BoxCloneService::new(service)));
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the session.
    #[must_use]
    pub fn build(mut self) -> Session {
        let mut service: BoxedService = match &self.service {
            Some(custom) => custom.boxed(),
            None => {
                let transport = self.pooled.take().unwrap_or_else(|| {
                    HyperTransport::new(self.transport.clone(), self.proxy.clone())
                });
                self.pooled = Some(transport.clone());
                BoxCloneService::new(transport)
            }
        };

        for layer_fn in &self.layers {
            service = layer_fn(service);
        }

        if let Some(store) = &self.cookie_store {
            service = BoxCloneService::new(CookieLayer::new(Arc::clone(store)).layer(service));
        }

        service = BoxCloneService::new(FollowRedirectLayer::new(self.redirect.clone()).layer(service));

        Session {
            inner: Arc::new(SessionInner {
                service: SyncService::new(service),
                settings: self,
                lock: Arc::new(Mutex::new(())),
            }),
        }
    }
}
