//! Client Module
//!
//! HTTP transport, retries and rate limit tracking.

pub mod http;
pub mod rate_limiter;

pub use http::{interpret_response, HttpClient, Multipart, Payload};
pub use rate_limiter::{RateLimitState, RateLimitTracker};
