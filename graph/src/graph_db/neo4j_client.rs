use crate::errors::{GraphError, GraphResult};
use crate::graph_db::value::{GraphQuery, StoreRecord, StoreValue};
use crate::graph_db::GraphStore;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use neo4rs::{
    query, BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder, Graph,
};
use screener_config::Neo4jSettings;
use std::collections::HashMap;
use std::sync::Arc;

/// Neo4j client, compatible with both local Neo4j and Neo4j AuraDB.
/// The underlying `Graph` is a connection pool shared by all requests.
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Connect and verify the connection with a trivial query
    ///
    /// `uri` supports `bolt://localhost:7687` as well as
    /// `neo4j+s://xxxxx.databases.neo4j.io`.
    pub async fn connect(settings: &Neo4jSettings) -> GraphResult<Self> {
        tracing::info!(
            aura = is_aura_uri(&settings.uri),
            "🔷 Connecting to Neo4j at: {}",
            settings.uri
        );

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .db("neo4j")
            .fetch_size(500)
            .max_connections(settings.max_connections)
            .build()
            .map_err(|e| GraphError::Connection(format!("Failed to build Neo4j config: {}", e)))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| GraphError::Connection(format!("Failed to connect to Neo4j: {}", e)))?;

        let mut result = graph
            .execute(query("RETURN 1 as test"))
            .await
            .map_err(|e| GraphError::Connection(format!("Connection test failed: {}", e)))?;

        if result
            .next()
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?
            .is_some()
        {
            tracing::info!("✅ Neo4j connection established successfully");
        }

        Ok(Self {
            graph: Arc::new(graph),
        })
    }
}

fn is_aura_uri(uri: &str) -> bool {
    uri.contains("neo4j.io") || uri.starts_with("neo4j+s://") || uri.starts_with("neo4j+ssc://")
}

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn run_query(&self, graph_query: GraphQuery) -> GraphResult<Vec<StoreRecord>> {
        let mut q = query(&graph_query.cypher);
        for (name, value) in &graph_query.params {
            q = q.param(name.as_str(), to_bolt(value));
        }

        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?
        {
            let mut record = StoreRecord::new();
            for column in &graph_query.columns {
                let value = row
                    .get::<BoltType>(column)
                    .map(|v| from_bolt(&v))
                    .unwrap_or(StoreValue::Null);
                record.insert(*column, value);
            }
            records.push(record);
        }

        Ok(records)
    }
}

fn to_bolt(value: &StoreValue) -> BoltType {
    match value {
        StoreValue::Null => BoltType::Null(BoltNull),
        StoreValue::Bool(v) => BoltType::Boolean(BoltBoolean::new(*v)),
        StoreValue::Integer(v) => BoltType::Integer(BoltInteger::new(*v)),
        StoreValue::Float(v) => BoltType::Float(BoltFloat::new(*v)),
        StoreValue::String(s) => BoltType::String(BoltString::new(s)),
        StoreValue::List(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect(),
        }),
        StoreValue::Map(map) => BoltType::Map(BoltMap {
            value: map
                .iter()
                .map(|(k, v)| (BoltString::new(k), to_bolt(v)))
                .collect(),
        }),
        // temporal parameters are passed as ISO-8601 text
        other => BoltType::String(BoltString::new(&other.to_text().unwrap_or_default())),
    }
}

fn from_bolt(value: &BoltType) -> StoreValue {
    match value {
        BoltType::Null(_) => StoreValue::Null,
        BoltType::Boolean(b) => StoreValue::Bool(b.value),
        BoltType::Integer(i) => StoreValue::Integer(i.value),
        BoltType::Float(f) => StoreValue::Float(f.value),
        BoltType::String(s) => StoreValue::String(s.value.clone()),
        BoltType::List(list) => StoreValue::List(list.value.iter().map(from_bolt).collect()),
        BoltType::Map(map) => StoreValue::Map(
            map.value
                .iter()
                .map(|(k, v)| (k.value.clone(), from_bolt(v)))
                .collect::<HashMap<_, _>>(),
        ),
        BoltType::Date(d) => {
            let parsed: Result<NaiveDate, _> = d.try_into();
            parsed
                .map(StoreValue::Date)
                .unwrap_or_else(|_| StoreValue::Other(format!("{:?}", d)))
        }
        BoltType::DateTime(dt) => {
            let parsed: Result<DateTime<FixedOffset>, _> = dt.try_into();
            parsed
                .map(StoreValue::DateTime)
                .unwrap_or_else(|_| StoreValue::Other(format!("{:?}", dt)))
        }
        BoltType::LocalDateTime(dt) => {
            let parsed: Result<NaiveDateTime, _> = dt.try_into();
            parsed
                .map(StoreValue::LocalDateTime)
                .unwrap_or_else(|_| StoreValue::Other(format!("{:?}", dt)))
        }
        other => StoreValue::Other(format!("{:?}", other)),
    }
}
