//! Fluent request builder.
//!
//! A [`RequestBuilder`] is created by a session verb (`get`, `post`, ...) and
//! consumed by [`RequestBuilder::send`]. Configuration errors such as an
//! invalid header are returned by the call that introduces them.
//!
//! # Body
//!
//! - [`json`](RequestBuilder::json) replaces any body set before.
//! - [`form`](RequestBuilder::form) sets a form body, or appends fields to an
//!   existing form or multipart body.
//! - [`files`](RequestBuilder::files) turns the body into `multipart/form-data`;
//!   fields from an earlier `form` call become plain parts.
//!
//! # Single use
//!
//! `send` takes the builder by value, so it cannot be sent twice:
//!
//! ```compile_fail
//! # async fn demo() -> volley::Result<()> {
//! let builder = volley::get("http://example.com")?;
//! let _first = builder.send().await?;
//! let _second = builder.send().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::HeaderMap;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::cookie::Cookie;
use crate::session::Session;
use crate::{
    ContentType, Data, Error, FileField, Form, Method, Request, Response, Result, Value,
    header_value, to_json,
};

/// Request payload, before encoding.
#[derive(Debug, Clone, Default)]
enum Body {
    #[default]
    Empty,
    Form(Value),
    Json(serde_json::Value),
    Multipart {
        fields: Value,
        files: Vec<FileField>,
    },
}

/// Credentials sent in the `Authorization` header.
#[derive(Clone, Default)]
enum Auth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

impl Auth {
    fn header_value(&self) -> Result<Option<HeaderValue>> {
        let value = match self {
            Self::None => return Ok(None),
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
            Self::Bearer(token) => format!("Bearer {token}"),
        };
        let mut value = header_value(AUTHORIZATION.as_str(), &value)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

/// Builder for a single request, bound to the session that created it.
#[derive(Debug)]
#[must_use = "a request builder does nothing until `send` is awaited"]
pub struct RequestBuilder {
    session: Session,
    locked: bool,
    method: Method,
    url: Url,
    params: Value,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Body,
    auth: Auth,
}

impl RequestBuilder {
    pub(crate) fn new(session: Session, method: Method, url: &str, locked: bool) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self {
            session,
            locked,
            method,
            url,
            params: Value::new(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Body::Empty,
            auth: Auth::None,
        })
    }

    /// HTTP method.
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Target URL, without the parameters added by [`params`](Self::params).
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Whether `send` serializes through the session lock.
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Append query parameters. Repeated keys are kept.
    pub fn params(mut self, params: impl Into<Value>) -> Self {
        self.params.append(params.into());
        self
    }

    /// Set headers, replacing earlier values with the same name.
    pub fn headers(mut self, headers: impl Into<Value>) -> Result<Self> {
        for (name, value) in headers.into() {
            self = self.header(&name, &value)?;
        }
        Ok(self)
    }

    /// Set one header, replacing earlier values with the same name.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_header(format!("name '{name}': {e}")))?;
        let value = header_value(name.as_str(), value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add cookies for this request only; the session jar is not touched.
    pub fn cookies<I>(mut self, cookies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Cookie>,
    {
        self.cookies.extend(cookies.into_iter().map(Into::into));
        self
    }

    /// Add URL-encoded form fields.
    pub fn form(mut self, fields: impl Into<Value>) -> Self {
        let fields = fields.into();
        self.body = match std::mem::take(&mut self.body) {
            Body::Form(mut existing) => {
                existing.append(fields);
                Body::Form(existing)
            }
            Body::Multipart {
                fields: mut existing,
                files,
            } => {
                existing.append(fields);
                Body::Multipart {
                    fields: existing,
                    files,
                }
            }
            Body::Json(_) => {
                tracing::debug!("form fields replace the JSON body");
                Body::Form(fields)
            }
            Body::Empty => Body::Form(fields),
        };
        self
    }

    /// Set a JSON object body, replacing any previous body.
    pub fn json(self, data: impl Into<Data>) -> Self {
        self.with_json(data.into().into_value())
    }

    /// Set a JSON body from any serializable value, replacing any previous body.
    pub fn json_value<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.with_json(value))
    }

    fn with_json(mut self, value: serde_json::Value) -> Self {
        if !matches!(self.body, Body::Empty) {
            tracing::debug!("JSON body replaces the previous body");
        }
        self.body = Body::Json(value);
        self
    }

    /// Attach files, making this a `multipart/form-data` request.
    ///
    /// Files are read when the request is sent, and each one is held fully in
    /// memory while the body is assembled; uploads are not streamed.
    pub fn files<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = FileField>,
    {
        self.body = match std::mem::take(&mut self.body) {
            Body::Multipart { fields, files: mut existing } => {
                existing.extend(files);
                Body::Multipart {
                    fields,
                    files: existing,
                }
            }
            Body::Form(fields) => Body::Multipart {
                fields,
                files: files.into_iter().collect(),
            },
            Body::Json(_) => {
                tracing::debug!("file attachments replace the JSON body");
                Body::Multipart {
                    fields: Value::new(),
                    files: files.into_iter().collect(),
                }
            }
            Body::Empty => Body::Multipart {
                fields: Value::new(),
                files: files.into_iter().collect(),
            },
        };
        self
    }

    /// Use HTTP basic authentication.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Auth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Use a bearer token.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Auth::Bearer(token.into());
        self
    }

    /// Render the wire request: final URL, headers and encoded body.
    ///
    /// Attached files are read here, one after another.
    pub async fn build(self) -> Result<Request> {
        let Self {
            method,
            mut url,
            params,
            mut headers,
            cookies,
            body,
            auth,
            ..
        } = self;

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }

        let body = match body {
            Body::Empty => Bytes::new(),
            Body::Form(fields) => {
                default_content_type(&mut headers, ContentType::FormUrlEncoded);
                Bytes::from(fields.encode())
            }
            Body::Json(value) => {
                default_content_type(&mut headers, ContentType::Json);
                to_json(&value)?
            }
            Body::Multipart { fields, files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                for file in files {
                    let data = tokio::fs::read(file.path())
                        .await
                        .map_err(|e| Error::file(file.path(), e))?;
                    form = form.part(file.into_part(data));
                }
                let (content_type, body) = form.into_body();
                headers.insert(
                    CONTENT_TYPE,
                    header_value(CONTENT_TYPE.as_str(), &content_type)?,
                );
                body
            }
        };

        if !cookies.is_empty() {
            let rendered = cookies
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, header_value(COOKIE.as_str(), &rendered)?);
        }

        if let Some(authorization) = auth.header_value()? {
            headers.insert(AUTHORIZATION, authorization);
        }

        Ok(Request::from_parts(method, url, headers, body))
    }

    /// Build the request and send it through the session.
    ///
    /// Builders obtained from a [`LockedSession`](crate::LockedSession) hold
    /// the session lock from before the build until the response head
    /// arrives.
    pub async fn send(self) -> Result<Response> {
        let session = self.session.clone();
        let _guard = if self.locked {
            Some(session.lock_owned().await)
        } else {
            None
        };

        let request = self.build().await?;
        session.execute(request).await
    }
}

fn default_content_type(headers: &mut HeaderMap, content_type: ContentType) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
    }
}
