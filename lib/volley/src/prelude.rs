//! Prelude module for convenient imports.
//!
//! Re-exports the types most requests need:
//!
//! ```
//! use volley::prelude::*;
//!
//! let params = Value::from([("page", "1")]);
//! # let _ = params;
//! ```

pub use crate::{
    Cookie, CookieStore, Data, Error, FileField, Jar, LockedSession, Method, Proxy,
    RedirectPolicy, RequestBuilder, Response, Result, Session, StatusCode, TransportConfig, Value,
    header,
};
pub use serde::{Deserialize, Serialize};
