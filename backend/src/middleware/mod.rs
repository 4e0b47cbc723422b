//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing, request logging, error rendering, rate limiting and security
//! headers.

pub mod error_normalizer;
pub mod rate_limit;
pub mod request_log;
pub mod security;
pub mod trace;

pub use error_normalizer::ErrorNormalizer;
pub use rate_limit::{RATE_LIMIT_MESSAGE, RateLimit, RateLimiter};
pub use request_log::RequestLog;
pub use security::security_headers;
pub use trace::{TRACE_ID_HEADER, Trace};
