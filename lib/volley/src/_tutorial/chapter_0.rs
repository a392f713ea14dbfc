//! # Chapter 0: Getting Started
//!
//! Every request starts from a verb, is configured by chaining calls, and
//! ends with `send().await`.
//!
//! ## Your first request
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> volley::Result<()> {
//!     let mut response = volley::get("https://httpbin.org/get")?.send().await?;
//!
//!     println!("{} {}", response.status(), response.text().await?);
//!     Ok(())
//! }
//! ```
//!
//! `volley::get` uses the process-wide default session. A malformed URL is
//! rejected right there, before anything is sent.
//!
//! ## Query parameters
//!
//! `params` appends pairs to the URL; repeated keys are kept:
//!
//! ```ignore
//! let response = volley::get("https://httpbin.org/get")?
//!     .params([("key1", "value1"), ("key2", "value2")])
//!     .params([("key2", "again")])
//!     .send()
//!     .await?;
//!
//! // GET /get?key1=value1&key2=value2&key2=again
//! ```
//!
//! ## Headers
//!
//! `headers` replaces earlier values with the same name (names are
//! case-insensitive). Invalid names or values fail immediately:
//!
//! ```ignore
//! let builder = volley::get("https://httpbin.org/get")?
//!     .headers([("Origin", "https://httpbin.org"), ("Accept", "application/json")])?
//!     .header("accept", "text/plain")?; // replaces Accept
//! ```
//!
//! ## Other verbs
//!
//! `post`, `put`, `delete`, `patch`, `head` and `options` work the same way;
//! `volley::request(Method::Patch, url)` takes the method as a value.
//!
//! ## Next Steps
//!
//! - [Chapter 1: Bodies & Credentials][super::chapter_1]
