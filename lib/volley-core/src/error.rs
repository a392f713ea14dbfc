//! Error types for volley.
//!
//! Every fallible operation returns [`Result`]. Errors belong to one of three
//! [`Phase`]s: configuring and building a request, sending it, or decoding the
//! response body. A non-2xx status is never an error; it is a regular response.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use derive_more::{Display, Error, From};

/// Boxed error as produced by connectors and hyper.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The phase of a request's lifecycle an [`Error`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Phase {
    /// Configuring the request or rendering it into a wire request.
    #[display("build")]
    Build,
    /// Executing the request through the transport.
    #[display("send")]
    Send,
    /// Decoding the response body.
    #[display("decode")]
    Decode,
}

/// Main error type for volley operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Proxy URL rejected at configuration time.
    #[display("invalid proxy: {_0}")]
    #[from(skip)]
    InvalidProxy(#[error(not(source))] String),

    /// Header name or value that cannot be sent on the wire.
    #[display("invalid header: {_0}")]
    #[from(skip)]
    InvalidHeader(#[error(not(source))] String),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// A multipart attachment could not be read.
    #[display("cannot read file '{}': {source}", path.display())]
    #[from(skip)]
    File {
        /// Path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(TransportError),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(TransportError),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Too many redirects.
    #[display("too many redirects ({count} exceeded max of {max})")]
    #[from(skip)]
    TooManyRedirects {
        /// Number of redirects followed.
        count: usize,
        /// Maximum allowed redirects.
        max: usize,
    },

    /// Invalid redirect response.
    #[display("invalid redirect: {_0}")]
    #[from(skip)]
    InvalidRedirect(#[error(not(source))] String),

    /// The redirect policy refused to continue.
    #[display("redirect rejected: {_0}")]
    #[from(skip)]
    RedirectRejected(#[error(not(source))] String),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Response body is not valid UTF-8.
    #[display("response body is not valid UTF-8: {_0}")]
    #[from]
    InvalidUtf8(std::string::FromUtf8Error),

    /// The response body was already taken by a previous decode call.
    #[display("response body already consumed")]
    #[from(skip)]
    BodyConsumed,
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Description of a transport failure, with its underlying cause when known.
///
/// The cause stays reachable through [`std::error::Error::source`], so callers
/// can downcast to the I/O or hyper error that produced it.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    source: Option<BoxError>,
}

impl TransportError {
    /// A failure without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// A failure caused by `source`.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl Error {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(TransportError::new(message))
    }

    /// Create a connection error keeping its cause.
    #[must_use]
    pub fn connection_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection(TransportError::with_source(message, source))
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(TransportError::new(message))
    }

    /// Create a TLS error keeping its cause.
    #[must_use]
    pub fn tls_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Tls(TransportError::with_source(message, source))
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an invalid header error.
    #[must_use]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader(message.into())
    }

    /// Create an invalid proxy error.
    #[must_use]
    pub fn invalid_proxy(message: impl Into<String>) -> Self {
        Self::InvalidProxy(message.into())
    }

    /// Create a file error for an unreadable attachment.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The lifecycle phase this error was raised in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::InvalidUrl(_)
            | Self::InvalidProxy(_)
            | Self::InvalidHeader(_)
            | Self::InvalidRequest(_)
            | Self::JsonSerialization(_)
            | Self::File { .. } => Phase::Build,
            Self::Connection(_)
            | Self::Tls(_)
            | Self::Timeout
            | Self::TooManyRedirects { .. }
            | Self::InvalidRedirect(_)
            | Self::RedirectRejected(_) => Phase::Send,
            Self::JsonDeserialization { .. } | Self::InvalidUtf8(_) | Self::BodyConsumed => {
                Phase::Decode
            }
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the error was raised while building the request.
    #[must_use]
    pub const fn is_build(&self) -> bool {
        matches!(self.phase(), Phase::Build)
    }

    /// Returns `true` if the error was raised while decoding the response.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self.phase(), Phase::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "connection error: failed to connect");

        let err = Error::json_deserialization("user.address.city", "missing field `city`");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error at 'user.address.city': missing field `city`"
        );

        let err = Error::file(
            "./missing.jpg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "cannot read file './missing.jpg': not found");

        assert_eq!(
            Error::BodyConsumed.to_string(),
            "response body already consumed"
        );
    }

    #[test]
    fn error_phase() {
        assert_eq!(Error::invalid_header("bad").phase(), Phase::Build);
        assert_eq!(Error::invalid_proxy("bad").phase(), Phase::Build);
        assert_eq!(Error::Timeout.phase(), Phase::Send);
        assert_eq!(Error::tls("handshake").phase(), Phase::Send);
        assert_eq!(Error::BodyConsumed.phase(), Phase::Decode);

        let parse = url::Url::parse("not a url").expect_err("invalid url");
        assert_eq!(Error::from(parse).phase(), Phase::Build);
    }

    #[test]
    fn error_is_timeout() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::connection("refused").is_timeout());
    }

    #[test]
    fn error_is_connection() {
        assert!(Error::connection("failed").is_connection());
        assert!(!Error::Timeout.is_connection());
    }

    #[test]
    fn error_build_and_decode() {
        assert!(Error::invalid_request("nope").is_build());
        assert!(!Error::invalid_request("nope").is_decode());
        assert!(Error::json_deserialization("", "eof").is_decode());
    }

    #[test]
    fn file_error_has_source() {
        let err = Error::file(
            "a.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn connection_error_keeps_its_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = Error::connection_caused_by("body read failed", cause);
        assert_eq!(err.to_string(), "connection error: body read failed");

        let transport = err.source().expect("transport error");
        let io = transport
            .source()
            .and_then(|cause| cause.downcast_ref::<std::io::Error>())
            .expect("io cause");
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn message_only_errors_have_no_cause() {
        let err = Error::tls("handshake");
        let Error::Tls(ref transport) = err else {
            panic!("expected a TLS error");
        };
        assert_eq!(transport.message(), "handshake");
        assert!(transport.source().is_none());
    }
}
