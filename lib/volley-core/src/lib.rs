//! Core types for the volley fluent HTTP client.
//!
//! This crate holds the transport-independent data model:
//! - [`Value`] - ordered string pairs for query parameters, headers and forms
//! - [`Data`] - string-keyed JSON payloads
//! - [`FileField`], [`Form`] and [`Part`] - multipart attachments
//! - [`Method`] and [`Request`] - the wire-ready request
//! - [`Error`], [`Phase`] and [`Result`] - error handling
//! - [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod body;
mod data;
mod error;
mod method;
mod multipart;
pub mod prelude;
mod request;
mod value;

pub use body::{ContentType, from_json, to_json};
pub use data::Data;
pub use error::{BoxError, Error, Phase, Result, TransportError};
pub use method::Method;
pub use multipart::{FileField, Form, Part};
pub use request::{Request, header_value};
pub use value::Value;

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, StatusCode, Version, header};
