use thiserror::Error;
use validator::ValidationErrors;

/// Failure of a single source. Recovered by the aggregator and reported as
/// that source's bucket error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,

    #[error("request timed out after {0}s")]
    Deadline(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    NotConfigured(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("circuit breaker open for {0}")]
    CircuitOpen(String),

    #[error("client closed")]
    Closed,
}

impl SourceError {
    /// Only timeouts and refused connections are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Timeout | SourceError::Connect(_))
    }

    /// Whether this failure should count against the circuit breaker.
    /// Caller-side problems do not indicate an unhealthy source.
    pub fn trips_breaker(&self) -> bool {
        !matches!(
            self,
            SourceError::NotConfigured(_)
                | SourceError::CircuitOpen(_)
                | SourceError::Closed
                | SourceError::Auth(_)
        )
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connect(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<screener_graph::GraphError> for SourceError {
    fn from(err: screener_graph::GraphError) -> Self {
        use screener_graph::GraphError;
        match err {
            GraphError::Unavailable(msg) => SourceError::NotConfigured(msg),
            GraphError::Connection(msg) => SourceError::Connect(msg),
            other => SourceError::Store(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        SourceError::Store(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}
