//! # Chapter 1: Bodies & Credentials
//!
//! ## Form bodies
//!
//! ```ignore
//! let response = volley::post("https://httpbin.org/post")?
//!     .form([("k1", "v1"), ("k2", "v2")])
//!     .send()
//!     .await?;
//! ```
//!
//! The body is `application/x-www-form-urlencoded` unless you set another
//! `Content-Type`. Calling `form` again appends more fields.
//!
//! ## JSON bodies
//!
//! `json` takes a [`Data`](crate::Data) object; `json_value` takes anything
//! `Serialize`:
//!
//! ```ignore
//! use volley::Data;
//!
//! #[derive(serde::Serialize)]
//! struct Message<'a> {
//!     msg: &'a str,
//!     num: u32,
//! }
//!
//! volley::post(url)?.json(Data::from([("msg", "hello world")]));
//! volley::post(url)?.json_value(&Message { msg: "hi", num: 2019 })?;
//! ```
//!
//! The last body call wins, with one exception: files.
//!
//! ## File uploads
//!
//! ```ignore
//! use volley::FileField;
//!
//! let response = volley::post("https://httpbin.org/post")?
//!     .form([("title", "holiday")])
//!     .files([
//!         FileField::new("image1", "beach.jpg", "./testdata/beach.jpg"),
//!         FileField::new("image2", "sunset.jpg", "./testdata/sunset.jpg"),
//!     ])
//!     .send()
//!     .await?;
//! ```
//!
//! Attaching files turns the request into `multipart/form-data`; earlier
//! form fields become plain parts. Files are read when the request is sent,
//! so a missing file shows up as [`Error::File`](crate::Error::File) from
//! `send`.
//!
//! ## Authentication
//!
//! ```ignore
//! volley::get(url)?.basic_auth("admin", "pass");
//! volley::get(url)?.bearer_token("secret-token");
//! ```
//!
//! The last call wins and replaces any `Authorization` header set by hand.
//!
//! ## Cookies
//!
//! Cookies for one request only:
//!
//! ```ignore
//! volley::get("https://httpbin.org/cookies")?
//!     .cookies([("n1", "v1"), ("n2", "v2")]);
//! ```
//!
//! To keep cookies across requests, give the session a jar (see
//! [Chapter 3][super::chapter_3]).
//!
//! ## Next Steps
//!
//! - [Chapter 2: Response Handling][super::chapter_2]
