//! HTTPS connectors using rustls.
//!
//! Three connector flavours share one configuration: a direct connector, one
//! that tunnels through an HTTP proxy with `CONNECT` (for `https` targets),
//! and one that dials a forward proxy (for plain `http` targets). All are
//! wrapped in [`HandshakeTimeout`], which bounds dial plus TLS handshake.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use http::header::HeaderValue;
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::proxy::Tunnel;
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tower::Service;

use crate::config::TransportConfig;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Connector used when no proxy applies.
pub(crate) type DirectConnector = HandshakeTimeout<HttpsConnector<HttpConnector>>;

/// Connector tunneling through an HTTP proxy.
pub(crate) type TunnelConnector = HandshakeTimeout<HttpsConnector<Tunnel<HttpConnector>>>;

/// Connector handing plain `http` requests to a forward proxy.
pub(crate) type ForwardConnector = HandshakeTimeout<ForwardProxy>;

fn tls_config() -> rustls::ClientConfig {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

fn http_connector(config: &TransportConfig) -> HttpConnector {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(config.connect_timeout));
    http.set_keepalive(config.keep_alive);
    http
}

/// Create the direct HTTPS-or-HTTP connector.
pub(crate) fn https_connector(config: &TransportConfig) -> DirectConnector {
    let https = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config())
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http_connector(config));

    HandshakeTimeout::new(https, config.handshake_timeout)
}

/// Create a connector that opens a `CONNECT` tunnel through `proxy` first.
///
/// `authorization` is sent as `Proxy-Authorization` on the `CONNECT` request.
pub(crate) fn tunnel_connector(
    config: &TransportConfig,
    proxy: Uri,
    authorization: Option<HeaderValue>,
) -> TunnelConnector {
    let mut tunnel = Tunnel::new(proxy, http_connector(config));
    if let Some(authorization) = authorization {
        tunnel = tunnel.with_auth(authorization);
    }

    let https = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config())
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(tunnel);

    HandshakeTimeout::new(https, config.handshake_timeout)
}

/// Create a connector that always dials the forward proxy at `proxy`.
///
/// `Proxy-Authorization` travels on each request, not on the connection.
pub(crate) fn forward_connector(config: &TransportConfig, proxy: Uri) -> ForwardConnector {
    let forward = ForwardProxy {
        proxy,
        http: http_connector(config),
    };
    HandshakeTimeout::new(forward, config.handshake_timeout)
}

/// Dials the proxy whatever the destination is.
#[derive(Debug, Clone)]
pub(crate) struct ForwardProxy {
    proxy: Uri,
    http: HttpConnector,
}

impl Service<Uri> for ForwardProxy {
    type Response = ProxiedStream<TokioIo<TcpStream>>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), BoxError>> {
        self.http.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, _dst: Uri) -> Self::Future {
        let connecting = self.http.call(self.proxy.clone());
        Box::pin(async move {
            let inner = connecting.await?;
            Ok::<_, BoxError>(ProxiedStream { inner })
        })
    }
}

/// Connection to a forward proxy.
///
/// Reported as proxied, so hyper writes absolute-form request targets
/// (`GET http://host/path HTTP/1.1`).
#[derive(Debug)]
pub(crate) struct ProxiedStream<T> {
    inner: T,
}

impl<T: Read + Unpin> Read for ProxiedStream<T> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<T: Write + Unpin> Write for ProxiedStream<T> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }
}

impl<T: Connection> Connection for ProxiedStream<T> {
    fn connected(&self) -> Connected {
        self.inner.connected().proxy(true)
    }
}

/// Raised when connection establishment exceeds the handshake timeout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HandshakeElapsed;

impl fmt::Display for HandshakeElapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection establishment timed out")
    }
}

impl StdError for HandshakeElapsed {}

/// Connector wrapper bounding the whole connect future.
///
/// The future is boxed so it stays `Unpin`, as the hyper client requires.
#[derive(Debug, Clone)]
pub(crate) struct HandshakeTimeout<C> {
    inner: C,
    timeout: Duration,
}

impl<C> HandshakeTimeout<C> {
    pub(crate) const fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<C> Service<Uri> for HandshakeTimeout<C>
where
    C: Service<Uri>,
    C::Response: Send + 'static,
    C::Future: Send + 'static,
    C::Error: Into<BoxError>,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, BoxError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), BoxError>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let timeout = self.timeout;
        let connecting = self.inner.call(dst);
        Box::pin(async move {
            match tokio::time::timeout(timeout, connecting).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(Box::new(HandshakeElapsed) as BoxError),
            }
        })
    }
}
