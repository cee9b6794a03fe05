//! HTTP surface of the sanctions screener

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use routes::configure_routes;
pub use state::{AppContext, LiveSources, SourceBreakers};
