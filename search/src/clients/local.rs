use super::SourceClient;
use crate::errors::SourceError;
use crate::fuzzy::{partial_ratio, ratio};
use async_trait::async_trait;
use screener_models::{EntitySchema, SanctionProgram, SanctionedEntity, SourceDetails, SourceKind};
use std::sync::Arc;

const DEFAULT_SOURCE_URL: &str = "https://sanctionssearch.ofac.treas.gov/";

/// One row of the local sanctions tables with its aggregated aliases
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LocalSanctionRecord {
    pub source_id: String,
    pub name: String,
    pub entity_type: String,
    /// Publishing list, e.g. "OFAC SDN"
    pub source: String,
    pub programs: Vec<String>,
    pub birth_dates: Vec<String>,
    pub nationalities: Vec<String>,
    pub aliases: Vec<String>,
    pub source_url: Option<String>,
    pub date_added: Option<String>,
    /// Store-side similarity, 0.0-1.0
    pub match_score: f64,
}

/// Relational store holding locally mirrored sanctions lists
#[async_trait]
pub trait SanctionsStore: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> Result<Vec<LocalSanctionRecord>, SourceError>;
}

/// Supplements the OpenSanctions bucket with locally mirrored lists
pub struct LocalSanctionsClient {
    store: Option<Arc<dyn SanctionsStore>>,
    threshold: u8,
}

impl LocalSanctionsClient {
    pub fn new(store: Option<Arc<dyn SanctionsStore>>, threshold: u8) -> Self {
        Self {
            store,
            threshold: threshold.min(100),
        }
    }

    /// In-process relevance of a row; stricter than the store's trigram filter
    fn relevance(query: &str, record: &LocalSanctionRecord, fuzzy: bool) -> u8 {
        let name = record.name.to_lowercase();
        let aliases: Vec<String> = record.aliases.iter().map(|a| a.to_lowercase()).collect();

        if name == query || aliases.iter().any(|a| a == query) {
            return 100;
        }
        if name.contains(query) {
            return 95;
        }
        if aliases.iter().any(|a| a.contains(query)) {
            return 90;
        }
        if !fuzzy {
            return 0;
        }

        let best_alias = aliases.iter().map(|a| ratio(query, a)).max().unwrap_or(0);
        ratio(query, &name)
            .max(best_alias)
            .max(partial_ratio(query, &name))
    }

    fn into_entity(record: LocalSanctionRecord, match_score: u8) -> SanctionedEntity {
        let programs = record
            .programs
            .into_iter()
            .map(|program| SanctionProgram {
                program,
                authority: Some(record.source.clone()),
                start_date: record.date_added.clone(),
                reason: None,
            })
            .collect();

        let schema = match record.entity_type.to_ascii_lowercase().as_str() {
            "person" => EntitySchema::Person,
            "company" => EntitySchema::Company,
            "organization" => EntitySchema::Organization,
            "vessel" => EntitySchema::Vessel,
            "aircraft" => EntitySchema::Aircraft,
            _ => EntitySchema::LegalEntity,
        };

        SanctionedEntity {
            id: record.source_id,
            name: record.name,
            schema,
            aliases: record.aliases,
            birth_date: record.birth_dates.into_iter().next(),
            death_date: None,
            countries: record.nationalities.clone(),
            nationalities: record.nationalities,
            is_sanctioned: true,
            sanction_programs: programs,
            datasets: vec![record.source],
            match_score,
            details: SourceDetails::OpenSanctions {
                url: record
                    .source_url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                first_seen: record.date_added,
                last_seen: None,
            },
        }
    }
}

#[async_trait]
impl SourceClient for LocalSanctionsClient {
    fn source(&self) -> SourceKind {
        SourceKind::OpenSanctions
    }

    fn name(&self) -> &str {
        "local_sanctions"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> Result<Vec<SanctionedEntity>, SourceError> {
        let Some(store) = &self.store else {
            return Err(SourceError::NotConfigured(
                "Local sanctions database not configured".to_string(),
            ));
        };

        let records = store.search(query, limit, fuzzy).await.map_err(|e| {
            tracing::warn!(query, error = %e, "⚠️ Local sanctions search failed");
            e
        })?;
        let fetched = records.len();

        let needle = query.trim().to_lowercase();
        let mut scored: Vec<(LocalSanctionRecord, u8)> = records
            .into_iter()
            .filter_map(|record| {
                let score = Self::relevance(&needle, &record, fuzzy);
                (score >= self.threshold).then_some((record, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(limit as usize);

        let entities: Vec<SanctionedEntity> = scored
            .into_iter()
            .map(|(record, score)| Self::into_entity(record, score))
            .collect();

        tracing::info!(
            query,
            fetched,
            results_count = entities.len(),
            threshold = self.threshold,
            "✅ Local sanctions search succeeded"
        );
        Ok(entities)
    }
}
