//! Multipart form data for file uploads.
//!
//! [`FileField`] describes an attachment by path; the file is read only when
//! the request is built. [`Form`] and [`Part`] assemble the
//! `multipart/form-data` body.
//!
//! # Example
//!
//! ```
//! use volley_core::{Form, Part};
//!
//! let form = Form::with_boundary("xyz")
//!     .part(Part::text("name", "John Doe"))
//!     .part(Part::file("avatar", "photo.jpg", vec![0xFF, 0xD8]));
//!
//! let (content_type, body) = form.into_body();
//! assert_eq!(content_type, "multipart/form-data; boundary=xyz");
//! assert!(body.starts_with(b"--xyz\r\n"));
//! ```

use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};

/// One file attachment: form field name, reported file name, and source path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileField {
    field_name: String,
    file_name: String,
    path: PathBuf,
}

impl FileField {
    /// Describe an attachment. The path is not checked until the request is built.
    #[must_use]
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            path: path.into(),
        }
    }

    /// Form field name.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// File name sent in the `Content-Disposition` header.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path the contents are read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn the descriptor into a file part holding `data`.
    #[must_use]
    pub fn into_part(self, data: impl Into<Bytes>) -> Part {
        Part::file(self.field_name, self.file_name, data)
    }
}

/// A single part in a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// A plain form field, sent without a `Content-Type`.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// A file part; the content type is guessed from the file name extension.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename);
        Self {
            name: name.into(),
            filename: Some(filename),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        }
    }

    /// Override the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name, if any.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Part payload.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Media types for common upload extensions, matched case-insensitively.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("mp4", "video/mp4"),
];

fn guess_content_type(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return "application/octet-stream";
    };
    MEDIA_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(extension))
        .map_or("application/octet-stream", |&(_, media_type)| media_type)
}

/// A multipart form containing multiple parts.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create an empty form with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("volley-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Create an empty form with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Add a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a plain text field.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Returns `(content-type header value, body bytes)`.
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let content_type = self.content_type();
        (content_type, self.encode())
    }

    fn encode(&self) -> Bytes {
        let capacity = self
            .parts
            .iter()
            .map(|part| part.data.len() + part.name.len() + 128)
            .sum::<usize>()
            + self.boundary.len()
            + 8;
        let mut buf = BytesMut::with_capacity(capacity);

        for part in &self.parts {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            buf.put_slice(b"Content-Disposition: form-data; name=\"");
            buf.put_slice(escape_quotes(&part.name).as_bytes());
            buf.put_slice(b"\"");
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                buf.put_slice(escape_quotes(filename).as_bytes());
                buf.put_slice(b"\"");
            }
            buf.put_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
