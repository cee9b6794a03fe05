use crate::errors::{ApiError, ApiResult};
use actix_web::HttpRequest;
use screener_config::Settings;
use screener_graph::{EntityLookupService, GraphError, GraphStore, GraphTraversalService};
use screener_models::{SearchResponse, SourceKind};
use screener_search::{
    AggregatorConfig, CircuitBreaker, LocalSanctionsClient, OffshoreLeaksClient,
    OpenSanctionsClient, ResultAggregator, RetryPolicy, SanctionsIoClient, SanctionsStore,
    SourceClient, SourceError, SourceProvider,
};
use screener_utils::{RateLimiter, ResponseCache};
use std::sync::Arc;

const CACHE_MAX_ENTRIES: usize = 1000;

/// Process-wide circuit breakers, one per remote source
#[derive(Clone)]
pub struct SourceBreakers {
    pub opensanctions: Arc<CircuitBreaker>,
    pub sanctions_io: Arc<CircuitBreaker>,
}

impl SourceBreakers {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            opensanctions: Arc::new(CircuitBreaker::from_settings("opensanctions", &settings.circuit)),
            sanctions_io: Arc::new(CircuitBreaker::from_settings("sanctions_io", &settings.circuit)),
        }
    }
}

/// Builds real, request-scoped clients for each source
pub struct LiveSources {
    settings: Settings,
    graph: Option<Arc<dyn GraphStore>>,
    sanctions_store: Option<Arc<dyn SanctionsStore>>,
    breakers: SourceBreakers,
}

impl SourceProvider for LiveSources {
    fn open(&self, source: SourceKind) -> Result<Vec<Box<dyn SourceClient>>, SourceError> {
        let retry = RetryPolicy::from_settings(&self.settings.retry);

        let clients: Vec<Box<dyn SourceClient>> = match source {
            SourceKind::OpenSanctions => {
                let primary = OpenSanctionsClient::new(
                    &self.settings.opensanctions,
                    retry,
                    self.breakers.opensanctions.clone(),
                )?;
                let mut clients: Vec<Box<dyn SourceClient>> = vec![Box::new(primary)];
                if self.sanctions_store.is_some() {
                    clients.push(Box::new(LocalSanctionsClient::new(
                        self.sanctions_store.clone(),
                        self.settings.local_fuzzy_threshold,
                    )));
                }
                clients
            }
            SourceKind::SanctionsIo => {
                let client = SanctionsIoClient::new(
                    &self.settings.sanctions_io,
                    retry,
                    self.breakers.sanctions_io.clone(),
                )?;
                vec![Box::new(client) as Box<dyn SourceClient>]
            }
            SourceKind::OffshoreLeaks => {
                vec![Box::new(OffshoreLeaksClient::new(self.graph.clone())) as Box<dyn SourceClient>]
            }
        };

        Ok(clients)
    }
}

/// Everything handlers share, constructed once in `main`
pub struct AppContext {
    pub settings: Settings,
    pub graph: Option<Arc<dyn GraphStore>>,
    pub local_database: bool,
    pub breakers: SourceBreakers,
    pub sources: Arc<dyn SourceProvider>,
    pub cache: Option<ResponseCache<SearchResponse>>,
    pub rate_limiter: Option<RateLimiter>,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        graph: Option<Arc<dyn GraphStore>>,
        sanctions_store: Option<Arc<dyn SanctionsStore>>,
    ) -> Self {
        let breakers = SourceBreakers::from_settings(&settings);
        let local_database = sanctions_store.is_some();
        let sources: Arc<dyn SourceProvider> = Arc::new(LiveSources {
            settings: settings.clone(),
            graph: graph.clone(),
            sanctions_store,
            breakers: breakers.clone(),
        });

        let cache = settings
            .cache
            .enabled
            .then(|| ResponseCache::new(settings.cache.ttl, CACHE_MAX_ENTRIES));
        let rate_limiter = settings
            .rate_limit
            .enabled
            .then(|| RateLimiter::new(settings.rate_limit.max_requests, settings.rate_limit.window));

        Self {
            settings,
            graph,
            local_database,
            breakers,
            sources,
            cache,
            rate_limiter,
        }
    }

    /// Replace the source provider, e.g. with stubs
    pub fn with_sources(mut self, sources: Arc<dyn SourceProvider>) -> Self {
        self.sources = sources;
        self
    }

    pub fn aggregator(&self) -> ResultAggregator {
        ResultAggregator::new(
            self.sources.clone(),
            AggregatorConfig {
                source_timeout: self.settings.source_timeout,
            },
        )
    }

    fn graph_store(&self) -> ApiResult<Arc<dyn GraphStore>> {
        self.graph
            .clone()
            .ok_or_else(|| GraphError::Unavailable("Neo4j not configured".to_string()).into())
    }

    pub fn lookup(&self) -> ApiResult<EntityLookupService> {
        Ok(EntityLookupService::new(self.graph_store()?))
    }

    pub fn traversal(&self) -> ApiResult<GraphTraversalService> {
        Ok(GraphTraversalService::new(self.graph_store()?))
    }

    /// Count the request against the caller's window, keyed by client IP
    pub fn check_rate_limit(&self, req: &HttpRequest) -> ApiResult<()> {
        let Some(limiter) = &self.rate_limiter else {
            return Ok(());
        };

        let info = req.connection_info();
        let client = info.realip_remote_addr().unwrap_or("unknown");
        limiter.check(client).map_err(|e| {
            tracing::warn!(client, path = req.path(), "⚠️ Rate limit exceeded");
            ApiError::from(e)
        })
    }
}
