//! In-process helpers owned by the API context

pub mod cache;
pub mod rate_limiter;

pub use cache::{fingerprint, CacheStats, ResponseCache};
pub use rate_limiter::{RateLimitError, RateLimiter};
