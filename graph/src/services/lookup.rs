use crate::errors::{GraphError, GraphResult};
use crate::graph_db::{map_to_json, GraphQuery, GraphStore, StoreRecord, StoreValue};
use screener_models::{OffshoreConnection, OffshoreEntity};
use std::sync::Arc;

const FULLTEXT_INDEX: &str = "offshore_fulltext";
/// Neo4j fulltext scores below this are noise
const MIN_FULLTEXT_SCORE: f64 = 0.3;
/// Score reported for direct id lookups
const LOOKUP_SCORE: f64 = 10.0;

const ENTITY_COLUMNS: &[&str] = &[
    "node_id",
    "name",
    "node_type",
    "countries",
    "jurisdiction",
    "jurisdiction_description",
    "incorporation_date",
    "service_provider",
    "company_type",
    "status",
    "address",
    "source_dataset",
    "score",
    "conn_count",
    "connections",
    "properties",
];

/// Shared tail: connection count, a five-item connection preview and the projection
const ENTITY_PROJECTION: &str = "\
    OPTIONAL MATCH (node)-[r]-() \
    WITH node, score, count(DISTINCT r) AS conn_count \
    OPTIONAL MATCH (node)-[rel]-(connected) \
    WITH node, score, conn_count, \
         collect(DISTINCT { \
             entity_id: toString(id(connected)), \
             entity_name: connected.name, \
             entity_type: head(labels(connected)), \
             relationship: type(rel), \
             jurisdiction: connected.jurisdiction \
         })[0..5] AS connections \
    RETURN \
        id(node) AS node_id, \
        node.name AS name, \
        head(labels(node)) AS node_type, \
        node.countries AS countries, \
        node.jurisdiction AS jurisdiction, \
        node.jurisdiction_description AS jurisdiction_description, \
        node.incorporation_date AS incorporation_date, \
        node.service_provider AS service_provider, \
        node.company_type AS company_type, \
        node.status AS status, \
        node.address AS address, \
        node.sourceID AS source_dataset, \
        score, \
        conn_count, \
        connections, \
        properties(node) AS properties";

/// Offshore entity with its relevance mapped onto 0-100
#[derive(Debug, Clone, PartialEq)]
pub struct OffshoreHit {
    pub entity: OffshoreEntity,
    pub match_score: u8,
}

/// Name search and id lookup over the Offshore Leaks graph
pub struct EntityLookupService {
    store: Arc<dyn GraphStore>,
}

impl EntityLookupService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Fulltext search, falling back to a CONTAINS scan when the index is missing
    pub async fn search(&self, query: &str, limit: u32) -> GraphResult<Vec<OffshoreHit>> {
        tracing::info!(query, limit, "Offshore search started");

        let records = match self.store.run_query(fulltext_query(query, limit)).await {
            Ok(records) => records,
            Err(e) if is_missing_index(&e) => {
                tracing::warn!(
                    query,
                    error = %e,
                    fallback = "contains_search",
                    "Offshore fulltext index missing"
                );
                self.store.run_query(contains_query(query, limit)).await?
            }
            Err(e) => {
                tracing::error!(query, error = %e, "Offshore search failed");
                return Err(e);
            }
        };

        let hits: Vec<OffshoreHit> = records.iter().filter_map(parse_hit).collect();
        tracing::info!(query, results_count = hits.len(), "Offshore search succeeded");
        Ok(hits)
    }

    pub async fn get_by_id(&self, node_id: i64) -> GraphResult<Option<OffshoreEntity>> {
        tracing::info!(node_id, "Offshore lookup by id");

        let cypher = format!(
            "MATCH (node) WHERE id(node) = $node_id \
             WITH node, {} AS score {}",
            LOOKUP_SCORE, ENTITY_PROJECTION
        );
        let query = GraphQuery::new(cypher)
            .param("node_id", node_id)
            .returns(ENTITY_COLUMNS);

        let records = self.store.run_query(query).await.map_err(|e| {
            tracing::error!(node_id, error = %e, "Offshore lookup failed");
            e
        })?;

        Ok(records.first().and_then(parse_hit).map(|hit| hit.entity))
    }
}

fn fulltext_query(query: &str, limit: u32) -> GraphQuery {
    let cypher = format!(
        "CALL db.index.fulltext.queryNodes('{}', $query) YIELD node, score \
         WHERE score > {} \
         WITH node, score ORDER BY score DESC LIMIT $limit {}",
        FULLTEXT_INDEX, MIN_FULLTEXT_SCORE, ENTITY_PROJECTION
    );
    GraphQuery::new(cypher)
        .param("query", query)
        .param("limit", limit)
        .returns(ENTITY_COLUMNS)
}

fn contains_query(query: &str, limit: u32) -> GraphQuery {
    let cypher = format!(
        "MATCH (node) WHERE node.name CONTAINS $query OR node.address CONTAINS $query \
         WITH node, CASE WHEN node.name CONTAINS $query THEN 1.0 ELSE 0.5 END AS score \
         ORDER BY score DESC LIMIT $limit {}",
        ENTITY_PROJECTION
    );
    GraphQuery::new(cypher)
        .param("query", query)
        .param("limit", limit)
        .returns(ENTITY_COLUMNS)
}

fn is_missing_index(error: &GraphError) -> bool {
    let cause = error.cause().to_lowercase();
    ["no such index", "no such fulltext schema index", "index not found"]
        .iter()
        .any(|needle| cause.contains(needle))
}

/// Neo4j relevance is roughly 0-10; scale it onto 0-100
fn scale_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    ((raw * 10.0) as i64).clamp(0, 100) as u8
}

/// `countries` is stored as a `;`-separated string, occasionally as a list
fn parse_countries(value: &StoreValue) -> Vec<String> {
    let raw: Vec<String> = match value {
        StoreValue::List(items) => items.iter().filter_map(StoreValue::to_text).collect(),
        other => other
            .to_text()
            .map(|s| s.split(';').map(str::to_string).collect())
            .unwrap_or_default(),
    };
    raw.into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_connection(value: &StoreValue) -> Option<OffshoreConnection> {
    let map = value.as_map()?;
    let text = |key: &str| map.get(key).and_then(StoreValue::to_text);

    // OPTIONAL MATCH yields a single all-null map for isolated nodes
    let entity_name = text("entity_name").filter(|n| !n.is_empty())?;

    Some(OffshoreConnection {
        entity_id: text("entity_id").unwrap_or_default(),
        entity_name,
        entity_type: text("entity_type").unwrap_or_else(|| "Unknown".to_string()),
        relationship: text("relationship").unwrap_or_default(),
        jurisdiction: text("jurisdiction"),
    })
}

fn parse_hit(record: &StoreRecord) -> Option<OffshoreHit> {
    let node_id = record.get("node_id").as_i64()?;

    let connections = record
        .get("connections")
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(parse_connection)
        .collect();

    let entity = OffshoreEntity {
        node_id,
        name: record.text("name").unwrap_or_else(|| "Unknown Entity".to_string()),
        node_type: record.text("node_type").unwrap_or_else(|| "Unknown".to_string()),
        countries: parse_countries(record.get("countries")),
        jurisdiction: record.text("jurisdiction"),
        jurisdiction_description: record.text("jurisdiction_description"),
        incorporation_date: record.text("incorporation_date"),
        service_provider: record.text("service_provider"),
        company_type: record.text("company_type"),
        status: record.text("status"),
        address: record.text("address"),
        source_dataset: record.text("source_dataset").unwrap_or_else(|| "Unknown".to_string()),
        connections_count: record.get("conn_count").as_i64().unwrap_or(0),
        connections,
        properties: record
            .get("properties")
            .as_map()
            .map(map_to_json)
            .unwrap_or_default(),
    };

    Some(OffshoreHit {
        entity,
        match_score: scale_score(record.get("score").as_f64().unwrap_or(0.0)),
    })
}
