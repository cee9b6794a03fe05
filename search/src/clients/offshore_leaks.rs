use super::SourceClient;
use crate::errors::SourceError;
use async_trait::async_trait;
use screener_graph::{EntityLookupService, GraphStore};
use screener_models::{SanctionedEntity, SourceKind};
use std::sync::Arc;

/// ICIJ Offshore Leaks search backed by the graph store
pub struct OffshoreLeaksClient {
    lookup: Option<EntityLookupService>,
}

impl OffshoreLeaksClient {
    /// `None` means Neo4j is not configured; every search then reports that
    pub fn new(store: Option<Arc<dyn GraphStore>>) -> Self {
        Self {
            lookup: store.map(EntityLookupService::new),
        }
    }
}

#[async_trait]
impl SourceClient for OffshoreLeaksClient {
    fn source(&self) -> SourceKind {
        SourceKind::OffshoreLeaks
    }

    fn name(&self) -> &str {
        "offshore_leaks"
    }

    /// Matching is always fuzzy (fulltext); the flag is ignored
    async fn search(
        &self,
        query: &str,
        limit: u32,
        _fuzzy: bool,
    ) -> Result<Vec<SanctionedEntity>, SourceError> {
        let Some(lookup) = &self.lookup else {
            return Err(SourceError::NotConfigured("Neo4j not configured".to_string()));
        };

        tracing::info!(query, limit, "🔷 Offshore Leaks search started");

        match lookup.search(query, limit).await {
            Ok(hits) => {
                let entities: Vec<SanctionedEntity> = hits
                    .into_iter()
                    .map(|hit| hit.entity.into_sanctioned(hit.match_score))
                    .collect();
                tracing::info!(query, results_count = entities.len(), "✅ Offshore Leaks search succeeded");
                Ok(entities)
            }
            Err(e) => {
                tracing::error!(query, error = %e, "❌ Offshore Leaks search failed");
                Err(e.into())
            }
        }
    }
}
