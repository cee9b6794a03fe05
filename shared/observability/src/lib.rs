//! Observability for the screener service
//!
//! - tracing subscriber setup with JSON or pretty output
//! - request id propagation through `x-request-id`
//! - HTTP middleware for request/response logging and slow request detection

pub mod init;
pub mod middleware;
pub mod request_id;

pub use init::*;
pub use middleware::*;
pub use request_id::*;
