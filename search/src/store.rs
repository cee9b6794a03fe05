//! Postgres-backed local sanctions store.
//!
//! Expects the `pg_trgm` extension and two tables:
//! `sanctions_entities(id, source_id, name, entity_type, source, programs text[],
//! birth_dates text[], nationalities text[], source_url, date_added)` and
//! `sanctions_aliases(entity_id, alias)`.

use crate::clients::{LocalSanctionRecord, SanctionsStore};
use crate::errors::SourceError;
use async_trait::async_trait;
use sqlx::PgPool;

const FUZZY_SIMILARITY: f64 = 0.3;
const EXACT_SIMILARITY: f64 = 0.9;

const SEARCH_SQL: &str = r#"
SELECT source_id, name, entity_type, source, programs, birth_dates, nationalities,
       aliases, source_url, date_added, match_score
FROM (
    SELECT e.source_id,
           e.name,
           e.entity_type,
           e.source,
           COALESCE(e.programs, ARRAY[]::text[]) AS programs,
           COALESCE(e.birth_dates, ARRAY[]::text[]) AS birth_dates,
           COALESCE(e.nationalities, ARRAY[]::text[]) AS nationalities,
           COALESCE(array_agg(a.alias) FILTER (WHERE a.alias IS NOT NULL), ARRAY[]::text[]) AS aliases,
           e.source_url,
           e.date_added::text AS date_added,
           GREATEST(
               similarity(lower(e.name), lower($1)),
               COALESCE(MAX(similarity(lower(a.alias), lower($1))), 0)
           )::float8 AS match_score
    FROM sanctions_entities e
    LEFT JOIN sanctions_aliases a ON a.entity_id = e.id
    GROUP BY e.id
) scored
WHERE match_score >= $2 OR lower(name) LIKE '%' || lower($1) || '%'
ORDER BY match_score DESC
LIMIT $3
"#;

pub struct PgSanctionsStore {
    pool: PgPool,
}

impl PgSanctionsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SanctionsStore for PgSanctionsStore {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> Result<Vec<LocalSanctionRecord>, SourceError> {
        let threshold = if fuzzy { FUZZY_SIMILARITY } else { EXACT_SIMILARITY };

        let records = sqlx::query_as::<_, LocalSanctionRecord>(SEARCH_SQL)
            .bind(query)
            .bind(threshold)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(query, fuzzy, rows = records.len(), "Local sanctions rows fetched");
        Ok(records)
    }
}
