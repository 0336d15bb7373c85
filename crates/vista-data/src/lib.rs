//! Outbound data access for page hooks.
//!
//! This crate provides:
//! - `JsonClient` - GET + JSON decode with per-attempt timeout and retry
//! - `FetchPolicy` - Timeout and retry settings for a client
//! - `RetryPolicy` - Which failures are retried, and how long to wait

mod client;
mod retry;
mod timeout;

pub use client::*;
pub use retry::*;
pub use timeout::*;
