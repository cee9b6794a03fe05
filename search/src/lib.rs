//! Multi-source sanctions search: fuzzy scoring, source clients and the aggregator

pub mod aggregator;
pub mod clients;
pub mod errors;
pub mod fuzzy;
pub mod store;

pub use aggregator::{AggregatorConfig, ResultAggregator, SourceProvider};
pub use clients::{
    CircuitBreaker, CircuitState, LocalSanctionRecord, LocalSanctionsClient, OffshoreLeaksClient,
    OpenSanctionsClient, RetryPolicy, SanctionsIoClient, SanctionsStore, SourceClient,
};
pub use errors::{SearchError, SourceError};
pub use fuzzy::FuzzyScorer;
pub use store::PgSanctionsStore;
