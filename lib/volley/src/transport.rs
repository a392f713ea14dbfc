//! The innermost service: sends one request over hyper-util.
//!
//! Everything above it (redirects, cookies, user layers) is a tower layer over
//! [`BoxedService`], so a custom transport can be plugged in instead.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http::header::PROXY_AUTHORIZATION;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower::util::BoxCloneService;
use tower::{Service, ServiceExt};
use url::Url;

use crate::config::TransportConfig;
use crate::connector::{
    DirectConnector, ForwardConnector, HandshakeElapsed, TunnelConnector, forward_connector,
    https_connector, tunnel_connector,
};
use crate::proxy::{Proxy, proxy_authorization, proxy_uri};
use crate::{Error, Request, Result};

/// Streaming response body, decoded lazily by [`crate::Response`].
pub type ResponseBody = UnsyncBoxBody<Bytes, Error>;

/// Response produced by every service in the stack.
pub type HttpResponse = http::Response<ResponseBody>;

/// Type-erased service used to compose the middleware stack.
pub type BoxedService = BoxCloneService<Request, HttpResponse, Error>;

/// Future returned by the services in the stack.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'static>>;

/// Thread-safe handle to a [`BoxedService`].
///
/// `BoxCloneService` is not `Sync`; the service is cloned under the lock and
/// called outside it.
#[derive(Clone)]
pub(crate) struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    pub(crate) fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    pub(crate) fn boxed(&self) -> BoxedService {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn call(&self, request: Request) -> ServiceFuture {
        let service = self.boxed();
        Box::pin(service.oneshot(request))
    }
}

type DirectClient = Client<DirectConnector, Full<Bytes>>;
type TunnelClient = Client<TunnelConnector, Full<Bytes>>;
type ForwardClient = Client<ForwardConnector, Full<Bytes>>;

/// Default transport: pooled hyper client with rustls, optionally proxied.
///
/// Through a proxy, `https` targets are tunneled with `CONNECT` and plain
/// `http` requests are forwarded in absolute form. One pooled client exists
/// per proxy URL and mode, created on first use.
#[derive(Clone)]
pub(crate) struct HyperTransport {
    direct: DirectClient,
    tunnels: Arc<Mutex<HashMap<String, TunnelClient>>>,
    forwards: Arc<Mutex<HashMap<String, ForwardClient>>>,
    proxy: Option<Proxy>,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    pub(crate) fn new(config: TransportConfig, proxy: Option<Proxy>) -> Self {
        let direct = Self::client_builder(&config).build(https_connector(&config));
        Self {
            direct,
            tunnels: Arc::default(),
            forwards: Arc::default(),
            proxy,
            config,
        }
    }

    fn client_builder(config: &TransportConfig) -> hyper_util::client::legacy::Builder {
        let mut builder = Client::builder(TokioExecutor::new());
        builder
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host);
        builder
    }

    fn tunnel_client(&self, proxy: &Url) -> Result<TunnelClient> {
        let mut tunnels = self.tunnels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = tunnels.get(proxy.as_str()) {
            return Ok(client.clone());
        }

        let connector = tunnel_connector(
            &self.config,
            proxy_uri(proxy)?,
            proxy_authorization(proxy)?,
        );
        let client = Self::client_builder(&self.config).build(connector);
        tunnels.insert(proxy.as_str().to_string(), client.clone());
        Ok(client)
    }

    fn forward_client(&self, proxy: &Url) -> Result<ForwardClient> {
        let mut forwards = self.forwards.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = forwards.get(proxy.as_str()) {
            return Ok(client.clone());
        }

        let connector = forward_connector(&self.config, proxy_uri(proxy)?);
        let client = Self::client_builder(&self.config).build(connector);
        forwards.insert(proxy.as_str().to_string(), client.clone());
        Ok(client)
    }

    /// Build a hyper request from a volley request.
    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>> {
        Ok(request.into_http()?.map(Full::new))
    }

    async fn execute(self, request: Request) -> Result<HttpResponse> {
        let proxy = self.proxy.as_ref().and_then(|p| p.resolve(request.url()));
        let secure = request.url().scheme() == "https";
        let mut hyper_request = Self::build_hyper_request(request)?;

        let response = match proxy {
            Some(proxy) => {
                if proxy.scheme() != "http" {
                    return Err(Error::invalid_proxy(format!(
                        "'{proxy}': unsupported scheme '{}', expected http",
                        proxy.scheme()
                    )));
                }
                if secure {
                    tracing::debug!(proxy = %proxy, "tunneling through proxy");
                    self.tunnel_client(&proxy)?.request(hyper_request).await
                } else {
                    tracing::debug!(proxy = %proxy, "forwarding through proxy");
                    if let Some(authorization) = proxy_authorization(&proxy)? {
                        hyper_request
                            .headers_mut()
                            .entry(PROXY_AUTHORIZATION)
                            .or_insert(authorization);
                    }
                    self.forward_client(&proxy)?.request(hyper_request).await
                }
            }
            None => self.direct.request(hyper_request).await,
        }
        .map_err(Self::map_hyper_error)?;

        Ok(response.map(|body| {
            body.map_err(|e| Error::connection_caused_by(e.to_string(), e))
                .boxed_unsync()
        }))
    }

    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let mut source: Option<&(dyn StdError + 'static)> = err.source();
        let mut msg = err.to_string();
        while let Some(cause) = source {
            if cause.downcast_ref::<HandshakeElapsed>().is_some() {
                return Error::Timeout;
            }
            msg = format!("{msg}: {cause}");
            source = cause.source();
        }

        let lower = msg.to_ascii_lowercase();
        if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            return Error::tls_caused_by(msg, err);
        }

        Error::connection_caused_by(msg, err)
    }
}

impl Service<Request> for HyperTransport {
    type Response = HttpResponse;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(transport.execute(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_is_debug() {
        let transport = HyperTransport::new(TransportConfig::default(), None);
        let debug = format!("{transport:?}");
        assert!(debug.contains("HyperTransport"));
    }

    #[tokio::test]
    async fn tunnel_clients_are_cached_per_proxy() {
        let proxy = Proxy::all("http://127.0.0.1:3128").expect("proxy");
        let transport = HyperTransport::new(TransportConfig::default(), Some(proxy));
        let url = Url::parse("http://127.0.0.1:3128").expect("url");

        transport.tunnel_client(&url).expect("client");
        transport.tunnel_client(&url).expect("client");
        transport
            .tunnel_client(&Url::parse("http://10.0.0.1:3128").expect("url"))
            .expect("client");

        assert_eq!(transport.tunnels.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn forward_and_tunnel_clients_are_cached_separately() {
        let proxy = Proxy::all("http://127.0.0.1:3128").expect("proxy");
        let transport = HyperTransport::new(TransportConfig::default(), Some(proxy));
        let url = Url::parse("http://127.0.0.1:3128").expect("url");

        transport.forward_client(&url).expect("client");
        transport.forward_client(&url).expect("client");
        transport.tunnel_client(&url).expect("client");

        assert_eq!(transport.forwards.lock().expect("lock").len(), 1);
        assert_eq!(transport.tunnels.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn connection_errors_keep_the_io_cause() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let mut transport = HyperTransport::new(TransportConfig::default(), None);
        let request = Request::new(
            crate::Method::Get,
            Url::parse(&format!("http://127.0.0.1:{port}/")).expect("url"),
        );

        let err = transport.call(request).await.expect_err("nothing listening");
        assert!(err.is_connection());

        let mut cause = err.source();
        let mut io_kind = None;
        while let Some(current) = cause {
            if let Some(io) = current.downcast_ref::<std::io::Error>() {
                io_kind = Some(io.kind());
            }
            cause = current.source();
        }
        assert_eq!(io_kind, Some(std::io::ErrorKind::ConnectionRefused));
    }

    #[tokio::test]
    async fn custom_proxy_with_wrong_scheme_fails_at_send() {
        let proxy = Proxy::custom(|_| Url::parse("socks5://127.0.0.1:1080").ok());
        let mut transport = HyperTransport::new(TransportConfig::default(), Some(proxy));
        let request = Request::new(
            crate::Method::Get,
            Url::parse("http://example.com").expect("url"),
        );

        let err = transport.call(request).await.expect_err("bad proxy");
        assert!(matches!(err, Error::InvalidProxy(_)));
    }
}
