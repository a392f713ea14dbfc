//! # Tutorial: Sending requests with volley
//!
//! Learn the fluent request API step by step.
//!
//! ## Chapters
//!
//! 1. [Getting Started][chapter_0] - Your first request
//! 2. [Bodies & Credentials][chapter_1] - Forms, JSON, files, auth, cookies
//! 3. [Response Handling][chapter_2] - Decoding and errors
//! 4. [Sessions][chapter_3] - Timeouts, proxies, redirects, cookie jars, locks
//!
//! Ready? Start with [Chapter 0: Getting Started][chapter_0].

pub mod chapter_0;
pub mod chapter_1;
pub mod chapter_2;
pub mod chapter_3;
