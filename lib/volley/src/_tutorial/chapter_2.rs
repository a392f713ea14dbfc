//! # Chapter 2: Response Handling
//!
//! `send` resolves once the status and headers are in; the body is read
//! when you ask for it.
//!
//! ## Decoding the body
//!
//! ```ignore
//! let mut response = volley::get("https://httpbin.org/get")?.send().await?;
//!
//! let text: String = response.text().await?;
//! // or: let bytes = response.bytes().await?;
//! // or: let value: MyType = response.json().await?;
//! ```
//!
//! A body can be decoded once. A second call returns
//! [`Error::BodyConsumed`](crate::Error::BodyConsumed). Dropping the
//! response without decoding releases the connection.
//!
//! ## Status codes
//!
//! A 404 or a 500 is a normal response, not an error:
//!
//! ```ignore
//! let response = volley::get(url)?.send().await?;
//! if response.is_client_error() {
//!     eprintln!("not found: {}", response.url());
//! }
//! ```
//!
//! ## Errors
//!
//! Every error tells you which [`Phase`](crate::Phase) failed:
//!
//! ```ignore
//! use volley::{Error, Phase};
//!
//! match volley::get(url)?.send().await {
//!     Ok(response) => { /* ... */ }
//!     Err(Error::Timeout) => eprintln!("too slow"),
//!     Err(err) if err.phase() == Phase::Build => eprintln!("bad request: {err}"),
//!     Err(err) => eprintln!("transport failure: {err}"),
//! }
//! ```
//!
//! JSON decoding errors carry the path of the field that failed:
//!
//! ```ignore
//! // Error::JsonDeserialization { path: "user.address.city", .. }
//! ```
//!
//! ## Next Steps
//!
//! - [Chapter 3: Sessions][super::chapter_3]
