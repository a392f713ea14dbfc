//! Cookies: per-request cookies and the session cookie jar.
//!
//! [`Cookie`] is a plain name/value pair attached to one request.
//! [`CookieStore`] is the seam the session uses to persist cookies across
//! requests; [`Jar`] is the in-memory implementation following RFC 6265
//! domain, path, `Secure` and expiry rules.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use http::header::HeaderValue;
use url::Url;

/// A cookie sent with a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    /// Create a cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Cookie {
    fn from((name, value): (N, V)) -> Self {
        Self::new(name, value)
    }
}

/// Persistent cookie storage shared by a session.
///
/// Implementations must be safe to call from concurrent requests.
pub trait CookieStore: Send + Sync {
    /// Store the `Set-Cookie` header values received from `url`.
    fn set_cookies(&self, url: &Url, headers: &mut dyn Iterator<Item = &HeaderValue>);

    /// The `Cookie` header value to send to `url`, if any cookie applies.
    fn cookies(&self, url: &Url) -> Option<HeaderValue>;
}

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    domain: String,
    host_only: bool,
    path: String,
    secure: bool,
    expires: Option<DateTime<Utc>>,
    created: u64,
}

impl StoredCookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    fn matches(&self, host: &str, path: &str, secure: bool) -> bool {
        if self.secure && !secure {
            return false;
        }
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_match(host, &self.domain)
        };
        domain_ok && path_match(path, &self.path)
    }
}

#[derive(Debug, Default)]
struct JarState {
    buckets: HashMap<String, Vec<StoredCookie>>,
    next_created: u64,
}

/// In-memory cookie jar.
///
/// Cookies are grouped by registrable domain. `Domain` attributes naming a
/// public suffix (such as `com` or `co.uk`) are rejected unless they equal
/// the request host.
#[derive(Debug)]
pub struct Jar {
    state: RwLock<JarState>,
    check_public_suffix: bool,
}

impl Default for Jar {
    fn default() -> Self {
        Self::new()
    }
}

impl Jar {
    /// Create an empty jar with public-suffix checks enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::default(),
            check_public_suffix: true,
        }
    }

    /// Create an empty jar that accepts any `Domain` attribute covering the host.
    #[must_use]
    pub fn without_public_suffix_list() -> Self {
        Self {
            check_public_suffix: false,
            ..Self::new()
        }
    }

    /// Store one `Set-Cookie` header value as if received from `url`.
    pub fn add_cookie_str(&self, set_cookie: &str, url: &Url) {
        let Some(host) = canonical_host(url) else {
            return;
        };
        let now = Utc::now();
        let Some(parsed) = self.parse(set_cookie, &host, url.path(), now) else {
            tracing::debug!(url = %url, "rejected Set-Cookie header");
            return;
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let created = state.next_created;
        state.next_created += 1;

        let bucket = state.buckets.entry(jar_key(&host)).or_default();
        let (cookie, expired) = parsed;
        let existing = bucket.iter().position(|c| c.same_identity(&cookie));

        match (existing, expired) {
            (Some(index), true) => {
                bucket.remove(index);
            }
            (Some(index), false) => {
                // Replacing keeps the original creation order.
                let created = bucket.get(index).map_or(created, |c| c.created);
                if let Some(slot) = bucket.get_mut(index) {
                    *slot = StoredCookie { created, ..cookie };
                }
            }
            (None, true) => {}
            (None, false) => bucket.push(StoredCookie { created, ..cookie }),
        }
    }

    /// Number of live cookies held.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Utc::now();
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .buckets
            .values()
            .flatten()
            .filter(|c| !c.is_expired(now))
            .count()
    }

    /// Whether the jar holds no live cookie.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cookie.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.buckets.clear();
    }

    /// Parse a `Set-Cookie` value. The flag is `true` when it deletes the cookie.
    fn parse(
        &self,
        set_cookie: &str,
        host: &str,
        request_path: &str,
        now: DateTime<Utc>,
    ) -> Option<(StoredCookie, bool)> {
        let mut parts = set_cookie.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim().trim_matches('"');

        let mut domain_attr = None;
        let mut path_attr = None;
        let mut max_age = None;
        let mut expires = None;
        let mut secure = false;

        for part in parts {
            let (attr, val) = part.split_once('=').unwrap_or((part, ""));
            let val = val.trim();
            match attr.trim().to_ascii_lowercase().as_str() {
                "domain" => domain_attr = Some(val.trim_start_matches('.').to_ascii_lowercase()),
                "path" => path_attr = Some(val.to_string()),
                "max-age" => max_age = val.parse::<i64>().ok(),
                "expires" => expires = parse_expires(val),
                "secure" => secure = true,
                _ => {}
            }
        }

        let (domain, host_only) = self.resolve_domain(host, domain_attr.as_deref())?;
        let path = path_attr
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| default_path(request_path));

        let expires = match max_age {
            Some(secs) if secs <= 0 => Some(DateTime::<Utc>::MIN_UTC),
            Some(secs) => Some(
                TimeDelta::try_seconds(secs)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            ),
            None => expires,
        };
        let cookie = StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            domain,
            host_only,
            path,
            secure,
            expires,
            created: 0,
        };
        let expired = cookie.is_expired(now);
        Some((cookie, expired))
    }

    /// Cookie domain and host-only flag, or `None` to reject the cookie.
    fn resolve_domain(&self, host: &str, attr: Option<&str>) -> Option<(String, bool)> {
        let Some(domain) = attr.filter(|d| !d.is_empty()) else {
            return Some((host.to_string(), true));
        };

        if is_ip(host) {
            return (domain == host).then(|| (host.to_string(), true));
        }

        if self.check_public_suffix && psl::suffix_str(domain) == Some(domain) {
            return (domain == host).then(|| (host.to_string(), true));
        }

        domain_match(host, domain).then(|| (domain.to_string(), false))
    }
}

impl CookieStore for Jar {
    fn set_cookies(&self, url: &Url, headers: &mut dyn Iterator<Item = &HeaderValue>) {
        for header in headers {
            match header.to_str() {
                Ok(value) => self.add_cookie_str(value, url),
                Err(_) => tracing::debug!(url = %url, "ignoring non-ASCII Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = canonical_host(url)?;
        let secure = matches!(url.scheme(), "https" | "wss");
        let path = if url.path().is_empty() { "/" } else { url.path() };
        let now = Utc::now();

        let mut selected: Vec<StoredCookie> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            state
                .buckets
                .get(&jar_key(&host))?
                .iter()
                .filter(|c| !c.is_expired(now) && c.matches(&host, path, secure))
                .cloned()
                .collect()
        };
        if selected.is_empty() {
            return None;
        }

        // Longer paths first, then oldest first.
        selected.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then(a.created.cmp(&b.created))
        });

        let header = selected
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

fn canonical_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Some(host.trim_end_matches('.').to_ascii_lowercase())
}

fn is_ip(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

fn jar_key(host: &str) -> String {
    if is_ip(host) {
        return host.to_string();
    }
    psl::domain_str(host).unwrap_or(host).to_string()
}

fn domain_match(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_match(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || request_path.strip_prefix(cookie_path).is_some_and(|rest| {
            cookie_path.ends_with('/') || rest.starts_with('/')
        })
}

fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => request_path.get(..index).unwrap_or("/").to_string(),
    }
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    // Netscape format: "Wed, 21-Oct-2015 07:28:00 GMT"
    NaiveDateTime::parse_from_str(value, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid URL")
    }

    fn header(jar: &Jar, target: &str) -> Option<String> {
        jar.cookies(&url(target))
            .map(|v| v.to_str().expect("ascii").to_string())
    }

    #[test]
    fn request_cookie_display() {
        let cookie = Cookie::new("session", "abc");
        assert_eq!(cookie.to_string(), "session=abc");
        assert_eq!(Cookie::from(("a", "b")).name(), "a");
    }

    #[test]
    fn host_only_cookie() {
        let jar = Jar::new();
        jar.add_cookie_str("id=1", &url("http://example.com/"));

        assert_eq!(header(&jar, "http://example.com/x").as_deref(), Some("id=1"));
        assert_eq!(header(&jar, "http://www.example.com/"), None);
    }

    #[test]
    fn domain_cookie_covers_subdomains() {
        let jar = Jar::new();
        jar.add_cookie_str("id=1; Domain=.example.com", &url("http://www.example.com/"));

        assert_eq!(header(&jar, "http://example.com/").as_deref(), Some("id=1"));
        assert_eq!(header(&jar, "http://api.example.com/").as_deref(), Some("id=1"));
        assert_eq!(header(&jar, "http://badexample.com/"), None);
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let jar = Jar::new();
        jar.add_cookie_str("id=1; Domain=other.com", &url("http://example.com/"));
        assert!(jar.is_empty());
    }

    #[test]
    fn public_suffix_domain_is_rejected() {
        let jar = Jar::new();
        jar.add_cookie_str("id=1; Domain=com", &url("http://example.com/"));
        jar.add_cookie_str("id=2; Domain=co.uk", &url("http://shop.co.uk/"));
        assert!(jar.is_empty());

        let lenient = Jar::without_public_suffix_list();
        lenient.add_cookie_str("id=1; Domain=com", &url("http://example.com/"));
        assert_eq!(lenient.len(), 1);
    }

    #[test]
    fn ip_hosts_are_host_only() {
        let jar = Jar::new();
        jar.add_cookie_str("a=1", &url("http://127.0.0.1:8080/"));
        jar.add_cookie_str("b=2; Domain=0.0.1", &url("http://127.0.0.1:8080/"));

        assert_eq!(header(&jar, "http://127.0.0.1:9090/").as_deref(), Some("a=1"));
    }

    #[test]
    fn path_scoping_and_order() {
        let jar = Jar::new();
        let origin = url("http://example.com/");
        jar.add_cookie_str("root=1; Path=/", &origin);
        jar.add_cookie_str("api=2; Path=/api", &origin);

        assert_eq!(
            header(&jar, "http://example.com/api/users").as_deref(),
            Some("api=2; root=1")
        );
        assert_eq!(header(&jar, "http://example.com/apix").as_deref(), Some("root=1"));
    }

    #[test]
    fn default_path_from_request() {
        assert_eq!(default_path("/a/b/c"), "/a/b");
        assert_eq!(default_path("/a"), "/");
        assert_eq!(default_path(""), "/");

        let jar = Jar::new();
        jar.add_cookie_str("x=1", &url("http://example.com/docs/page"));
        assert_eq!(header(&jar, "http://example.com/docs/other").as_deref(), Some("x=1"));
        assert_eq!(header(&jar, "http://example.com/"), None);
    }

    #[test]
    fn secure_cookie_needs_https() {
        let jar = Jar::new();
        jar.add_cookie_str("s=1; Secure", &url("https://example.com/"));

        assert_eq!(header(&jar, "http://example.com/"), None);
        assert_eq!(header(&jar, "https://example.com/").as_deref(), Some("s=1"));
    }

    #[test]
    fn replace_and_delete() {
        let jar = Jar::new();
        let origin = url("http://example.com/");
        jar.add_cookie_str("k=old", &origin);
        jar.add_cookie_str("k=new", &origin);
        assert_eq!(header(&jar, "http://example.com/").as_deref(), Some("k=new"));

        jar.add_cookie_str("k=gone; Max-Age=0", &origin);
        assert_eq!(header(&jar, "http://example.com/"), None);
        assert!(jar.is_empty());
    }

    #[test]
    fn expires_attribute() {
        let jar = Jar::new();
        let origin = url("http://example.com/");
        jar.add_cookie_str("old=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT", &origin);
        jar.add_cookie_str("netscape=1; Expires=Wed, 21-Oct-2015 07:28:00 GMT", &origin);
        jar.add_cookie_str("future=1; Expires=Fri, 01 Jan 2100 00:00:00 GMT", &origin);

        assert_eq!(header(&jar, "http://example.com/").as_deref(), Some("future=1"));
    }

    #[test]
    fn max_age_wins_over_expires() {
        let jar = Jar::new();
        jar.add_cookie_str(
            "k=v; Max-Age=3600; Expires=Wed, 21 Oct 2015 07:28:00 GMT",
            &url("http://example.com/"),
        );
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn store_trait_round_trip() {
        let jar = Jar::new();
        let origin = url("http://example.com/login");
        let values = [
            HeaderValue::from_static("a=1; Path=/"),
            HeaderValue::from_static("b=2; Path=/"),
        ];
        jar.set_cookies(&origin, &mut values.iter());

        assert_eq!(header(&jar, "http://example.com/home").as_deref(), Some("a=1; b=2"));

        jar.clear();
        assert!(jar.is_empty());
    }

    #[test]
    fn malformed_headers_are_ignored() {
        let jar = Jar::new();
        let origin = url("http://example.com/");
        jar.add_cookie_str("no-equals-sign", &origin);
        jar.add_cookie_str("=value", &origin);
        assert!(jar.is_empty());
    }
}
