//! Prelude module for convenient imports.
//!
//! ```ignore
//! use volley_core::prelude::*;
//! ```

pub use crate::{
    ContentType, Data, Error, FileField, Form, Method, Part, Request, Result, Value, from_json,
    to_json,
};
