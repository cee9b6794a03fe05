pub mod circuit_breaker;
pub mod local;
pub mod offshore_leaks;
pub mod opensanctions;
pub mod retry;
pub mod sanctions_io;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use local::{LocalSanctionRecord, LocalSanctionsClient, SanctionsStore};
pub use offshore_leaks::OffshoreLeaksClient;
pub use opensanctions::OpenSanctionsClient;
pub use retry::RetryPolicy;
pub use sanctions_io::SanctionsIoClient;

use crate::errors::SourceError;
use async_trait::async_trait;
use parking_lot::Mutex;
use screener_models::{SanctionedEntity, SourceKind};
use std::time::Duration;

const USER_AGENT: &str = "SanctionsScreener/1.0";

/// One search backend. Every failure comes back as a `SourceError`.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Bucket the results belong to
    fn source(&self) -> SourceKind;

    /// Human-readable client name for logs
    fn name(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> Result<Vec<SanctionedEntity>, SourceError>;

    /// Release held resources. Later searches fail with `SourceError::Closed`.
    async fn close(&self) {}
}

/// Request-scoped HTTP connection pool that can be released exactly once
pub(crate) struct HttpHandle {
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpHandle {
    pub(crate) fn new(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Mutex::new(Some(client)),
        })
    }

    /// Cheap clone of the pool handle, or `Closed`
    pub(crate) fn get(&self) -> Result<reqwest::Client, SourceError> {
        self.client.lock().clone().ok_or(SourceError::Closed)
    }

    pub(crate) fn close(&self) {
        self.client.lock().take();
    }
}
