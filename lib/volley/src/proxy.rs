//! Proxy selection.
//!
//! A [`Proxy`] maps each target URL to the proxy it should go through, or to
//! `None` for a direct connection. Only `http://` proxy URLs are accepted:
//! `https` targets are tunneled with `CONNECT`, plain `http` requests are
//! forwarded to the proxy.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::Uri;
use http::header::HeaderValue;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::{Error, Result};

type Resolver = Arc<dyn Fn(&Url) -> Option<Url> + Send + Sync>;

/// Chooses a proxy per target URL.
#[derive(Clone)]
pub struct Proxy {
    kind: &'static str,
    resolve: Resolver,
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Proxy {
    /// Send every request through `url`.
    ///
    /// A URL without a scheme, such as `127.0.0.1:3128`, is read as `http://`.
    pub fn all(url: impl AsRef<str>) -> Result<Self> {
        let proxy = parse_proxy_url(url.as_ref())?;
        Ok(Self {
            kind: "all",
            resolve: Arc::new(move |_| Some(proxy.clone())),
        })
    }

    /// Use the conventional environment variables.
    ///
    /// `HTTPS_PROXY` applies to `https` targets and `HTTP_PROXY` to `http`
    /// ones, with `ALL_PROXY` as a fallback for both. Lowercase names are
    /// honoured too. `NO_PROXY` lists hosts to reach directly, and loopback
    /// hosts never use a proxy. Variables are read once, here.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Pick the proxy with a function; return `None` to connect directly.
    pub fn custom<F>(resolve: F) -> Self
    where
        F: Fn(&Url) -> Option<Url> + Send + Sync + 'static,
    {
        Self {
            kind: "custom",
            resolve: Arc::new(resolve),
        }
    }

    /// The proxy to use for `target`, if any.
    #[must_use]
    pub fn resolve(&self, target: &Url) -> Option<Url> {
        (self.resolve)(target)
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |upper: &str| {
            lookup(upper)
                .or_else(|| lookup(&upper.to_ascii_lowercase()))
                .filter(|value| !value.trim().is_empty())
        };
        let parse = |name: &str, value: Option<String>| {
            value.and_then(|value| match parse_proxy_url(&value) {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(variable = name, error = %err, "ignoring proxy variable");
                    None
                }
            })
        };

        let all = parse("ALL_PROXY", read("ALL_PROXY"));
        let http = parse("HTTP_PROXY", read("HTTP_PROXY")).or_else(|| all.clone());
        let https = parse("HTTPS_PROXY", read("HTTPS_PROXY")).or(all);
        let no_proxy = NoProxy::parse(read("NO_PROXY").as_deref().unwrap_or_default());

        Self {
            kind: "env",
            resolve: Arc::new(move |target| {
                let host = target.host_str()?;
                if is_loopback(host) || no_proxy.matches(host) {
                    return None;
                }
                match target.scheme() {
                    "https" | "wss" => https.clone(),
                    _ => http.clone(),
                }
            }),
        }
    }
}

/// Parse and validate a proxy URL.
pub(crate) fn parse_proxy_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let url = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .map_err(|e| Error::invalid_proxy(format!("'{raw}': {e}")))?;

    if url.scheme() != "http" {
        return Err(Error::invalid_proxy(format!(
            "'{raw}': unsupported scheme '{}', expected http",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_proxy(format!("'{raw}': missing host")));
    }
    Ok(url)
}

/// The proxy endpoint as a URI, credentials stripped.
pub(crate) fn proxy_uri(proxy: &Url) -> Result<Uri> {
    let host = proxy
        .host_str()
        .ok_or_else(|| Error::invalid_proxy(format!("'{proxy}': missing host")))?;
    let port = proxy.port_or_known_default().unwrap_or(80);
    format!("{}://{host}:{port}", proxy.scheme())
        .parse()
        .map_err(|e| Error::invalid_proxy(format!("'{proxy}': {e}")))
}

/// `Proxy-Authorization` value built from the URL's userinfo, if any.
pub(crate) fn proxy_authorization(proxy: &Url) -> Result<Option<HeaderValue>> {
    if proxy.username().is_empty() && proxy.password().is_none() {
        return Ok(None);
    }
    let username = percent_decode_str(proxy.username()).decode_utf8_lossy();
    let password = percent_decode_str(proxy.password().unwrap_or_default()).decode_utf8_lossy();
    let encoded = STANDARD.encode(format!("{username}:{password}"));

    HeaderValue::from_str(&format!("Basic {encoded}"))
        .map(Some)
        .map_err(|e| Error::invalid_proxy(e.to_string()))
}

fn is_loopback(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

/// Hosts excluded from proxying.
#[derive(Debug, Clone, Default)]
struct NoProxy {
    wildcard: bool,
    entries: Vec<String>,
}

impl NoProxy {
    fn parse(raw: &str) -> Self {
        let mut no_proxy = Self::default();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if entry == "*" {
                no_proxy.wildcard = true;
                continue;
            }
            // Ports in entries are ignored.
            let host = match entry.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host,
                _ => entry,
            };
            no_proxy
                .entries
                .push(host.trim_start_matches("*.").trim_start_matches('.').to_ascii_lowercase());
        }
        no_proxy
    }

    fn matches(&self, host: &str) -> bool {
        if self.wildcard {
            return true;
        }
        let host = host.to_ascii_lowercase();
        self.entries.iter().any(|entry| {
            host == *entry
                || host
                    .strip_suffix(entry.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
