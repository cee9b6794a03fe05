use crate::clients::SourceClient;
use crate::errors::{SearchError, SourceError};
use crate::fuzzy::FuzzyScorer;
use chrono::Utc;
use futures::future::join_all;
use screener_models::{
    SanctionedEntity, SearchRequest, SearchResponse, SourceBucket, SourceDetails, SourceKind,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Opens the request-scoped clients serving one source bucket
pub trait SourceProvider: Send + Sync {
    /// Primary client first, supplements after it. An empty list means the
    /// source is not available in this deployment.
    fn open(&self, source: SourceKind) -> Result<Vec<Box<dyn SourceClient>>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Upper bound for each individual client call
    pub source_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_timeout: Duration::from_secs(15),
        }
    }
}

/// Outcome of one client call, tagged with the client that produced it
struct ClientOutcome {
    source: SourceKind,
    client: String,
    result: Result<Vec<SanctionedEntity>, SourceError>,
}

/// Fans a search out to every requested source and merges the answers into
/// one ranked response
pub struct ResultAggregator {
    provider: Arc<dyn SourceProvider>,
    config: AggregatorConfig,
}

impl ResultAggregator {
    pub fn new(provider: Arc<dyn SourceProvider>, config: AggregatorConfig) -> Self {
        Self { provider, config }
    }

    pub async fn aggregate(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let request = request.sanitized()?;
        let fuzzy = request.search_type.is_fuzzy();
        let started = Instant::now();

        tracing::info!(
            query = %request.query,
            search_type = %request.search_type,
            sources = ?request.sources,
            limit = request.limit,
            "🔍 Aggregated search started"
        );

        let mut open_failures: Vec<(SourceKind, SourceError)> = Vec::new();
        let mut clients: Vec<Box<dyn SourceClient>> = Vec::new();
        for &source in &request.sources {
            match self.provider.open(source) {
                Ok(opened) if opened.is_empty() => open_failures.push((
                    source,
                    SourceError::NotConfigured(format!("{} not configured", source)),
                )),
                Ok(opened) => clients.extend(opened),
                Err(e) => open_failures.push((source, e)),
            }
        }

        let outcomes = join_all(
            clients
                .iter()
                .map(|client| self.run_client(client.as_ref(), &request.query, request.limit, fuzzy)),
        )
        .await;

        join_all(clients.iter().map(|client| client.close())).await;

        let mut buckets: BTreeMap<SourceKind, SourceBucket> = BTreeMap::new();
        for (source, error) in open_failures {
            tracing::warn!(source = %source, error = %error, "⚠️ Source could not be opened");
            buckets.insert(source, SourceBucket::from_results(Vec::new(), Some(error.to_string())));
        }

        for &source in &request.sources {
            if buckets.contains_key(&source) {
                continue;
            }
            let source_outcomes = outcomes.iter().filter(|o| o.source == source);
            let (results, error) = merge_outcomes(source_outcomes);
            let results = score_results(&request, results);
            buckets.insert(source, SourceBucket::from_results(results, error));
        }

        let mut all_results: Vec<SanctionedEntity> = request
            .sources
            .iter()
            .filter_map(|source| buckets.get(source))
            .flat_map(|bucket| bucket.results.iter().cloned())
            .collect();
        all_results.sort_by(|a, b| {
            (b.is_sanctioned, b.match_score).cmp(&(a.is_sanctioned, a.match_score))
        });

        let (sources_failed, sources_succeeded): (Vec<SourceKind>, Vec<SourceKind>) = request
            .sources
            .iter()
            .copied()
            .partition(|source| buckets.get(source).map(SourceBucket::failed).unwrap_or(true));

        let offshore_connections_found = all_results
            .iter()
            .map(|entity| match &entity.details {
                SourceDetails::OffshoreLeaks {
                    connections_count, ..
                } => usize::try_from(*connections_count).unwrap_or(0),
                _ => 0,
            })
            .sum();

        let response = SearchResponse {
            total_results: all_results.len(),
            total_sanctioned: all_results.iter().filter(|e| e.is_sanctioned).count(),
            offshore_connections_found,
            query: request.query.clone(),
            search_type: request.search_type,
            results_by_source: buckets,
            all_results,
            sources_searched: request.sources.clone(),
            sources_succeeded,
            sources_failed,
            timestamp: Utc::now(),
            fuzzy_threshold: fuzzy.then_some(request.fuzzy_threshold),
        };

        tracing::info!(
            query = %response.query,
            total_results = response.total_results,
            total_sanctioned = response.total_sanctioned,
            sources_failed = ?response.sources_failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "✅ Aggregated search completed"
        );

        Ok(response)
    }

    async fn run_client(
        &self,
        client: &dyn SourceClient,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> ClientOutcome {
        let timeout = self.config.source_timeout;
        let result = match tokio::time::timeout(timeout, client.search(query, limit, fuzzy)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Deadline(timeout.as_secs())),
        };

        if let Err(e) = &result {
            tracing::warn!(source = %client.source(), client = client.name(), error = %e, "⚠️ Source search failed");
        }

        ClientOutcome {
            source: client.source(),
            client: client.name().to_string(),
            result,
        }
    }
}

/// Combine a primary client's answer with its supplements'.
///
/// A supplement replaces a failed, empty primary and clears its error.
/// Otherwise supplement entries are appended when their lowercase name is new.
fn merge_outcomes<'a>(
    mut outcomes: impl Iterator<Item = &'a ClientOutcome>,
) -> (Vec<SanctionedEntity>, Option<String>) {
    let (mut results, mut error) = match outcomes.next().map(|o| &o.result) {
        Some(Ok(results)) => (results.clone(), None),
        Some(Err(e)) => (Vec::new(), Some(e.to_string())),
        None => (Vec::new(), None),
    };

    for supplement in outcomes {
        match &supplement.result {
            Ok(extra) if results.is_empty() && error.is_some() && !extra.is_empty() => {
                tracing::info!(
                    client = %supplement.client,
                    results_count = extra.len(),
                    "Supplement replaced failed primary source"
                );
                results = extra.clone();
                error = None;
            }
            Ok(extra) => {
                let mut seen: HashSet<String> = results.iter().map(|e| e.name.to_lowercase()).collect();
                for entity in extra {
                    if seen.insert(entity.name.to_lowercase()) {
                        results.push(entity.clone());
                    }
                }
            }
            Err(e) => {
                tracing::debug!(client = %supplement.client, error = %e, "Supplement source failed");
            }
        }
    }

    (results, error)
}

/// Score one bucket against the query and keep what the search type allows,
/// best first
fn score_results(request: &SearchRequest, results: Vec<SanctionedEntity>) -> Vec<SanctionedEntity> {
    let threshold = request.fuzzy_threshold;
    let scorer = FuzzyScorer::new(threshold);
    let fuzzy = request.search_type.is_fuzzy();

    let mut kept: Vec<SanctionedEntity> = results
        .into_iter()
        .filter_map(|mut entity| {
            let name_score = scorer.score(&request.query, &entity.name);
            let best_alias = || {
                entity
                    .aliases
                    .iter()
                    .map(|alias| scorer.score(&request.query, alias))
                    .max()
                    .unwrap_or(0)
            };

            let score = if fuzzy {
                let score = if name_score >= threshold {
                    name_score
                } else {
                    name_score.max(best_alias())
                };
                (score >= threshold).then_some(score)
            } else {
                (name_score == 100 || best_alias() == 100).then_some(100)
            };

            entity.match_score = score?;
            Some(entity)
        })
        .collect();

    kept.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    kept
}
