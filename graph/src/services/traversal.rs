use crate::errors::{GraphError, GraphResult};
use crate::graph_db::{map_to_json, GraphQuery, GraphStore, StoreValue};
use screener_models::{ConnectionGraph, GraphEdge, GraphNode, NodeType};
use serde_json::Map;
use std::collections::HashSet;
use std::sync::Arc;

pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 3;
pub const MIN_NODES: u32 = 10;
pub const MAX_NODES: u32 = 100;

/// Bounded neighbourhood queries around a single node
pub struct GraphTraversalService {
    store: Arc<dyn GraphStore>,
}

impl GraphTraversalService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn get_connections(
        &self,
        node_id: i64,
        depth: u32,
        max_nodes: u32,
    ) -> GraphResult<ConnectionGraph> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
            return Err(GraphError::Validation(format!(
                "depth must be between {} and {}",
                MIN_DEPTH, MAX_DEPTH
            )));
        }
        if !(MIN_NODES..=MAX_NODES).contains(&max_nodes) {
            return Err(GraphError::Validation(format!(
                "max_nodes must be between {} and {}",
                MIN_NODES, MAX_NODES
            )));
        }

        tracing::info!(node_id, depth, max_nodes, "Graph connections started");

        let records = self
            .store
            .run_query(connections_query(node_id, depth, max_nodes))
            .await
            .map_err(|e| {
                tracing::error!(node_id, error = %e, "Graph connections failed");
                match e {
                    GraphError::Connection(cause) => GraphError::Query(cause),
                    other => other,
                }
            })?;

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut seen_nodes = HashSet::new();
        let mut seen_edges = HashSet::new();

        for record in &records {
            for raw in record.get("nodes").as_list().unwrap_or_default() {
                if let Some(node) = parse_node(raw) {
                    if seen_nodes.insert(node.id.clone()) {
                        nodes.push(node);
                    }
                }
            }
            for raw in record.get("edges").as_list().unwrap_or_default() {
                if let Some(edge) = parse_edge(raw) {
                    let key = (
                        edge.source.clone(),
                        edge.target.clone(),
                        edge.relationship_type.clone(),
                    );
                    if seen_edges.insert(key) {
                        edges.push(edge);
                    }
                }
            }
        }

        if nodes.is_empty() {
            tracing::warn!(node_id, "Graph has no connections");
        } else {
            tracing::info!(
                node_id,
                node_count = nodes.len(),
                edge_count = edges.len(),
                "Graph connections succeeded"
            );
        }

        Ok(ConnectionGraph::new(nodes, edges, node_id.to_string(), depth))
    }
}

/// One row per path; `depth` is range-checked by the caller before interpolation
fn connections_query(node_id: i64, depth: u32, max_nodes: u32) -> GraphQuery {
    let cypher = format!(
        "MATCH (start) WHERE id(start) = $node_id \
         MATCH path = (start)-[*1..{depth}]-(connected) \
         WITH path LIMIT $max_nodes \
         RETURN \
           [n IN nodes(path) | {{id: toString(id(n)), label: n.name, node_type: head(labels(n)), \
             labels: labels(n), properties: properties(n)}}] AS nodes, \
           [r IN relationships(path) | {{id: toString(id(r)), source: toString(id(startNode(r))), \
             target: toString(id(endNode(r))), relationship_type: type(r), properties: properties(r)}}] AS edges",
        depth = depth
    );

    GraphQuery::new(cypher)
        .param("node_id", node_id)
        .param("max_nodes", max_nodes)
        .returns(&["nodes", "edges"])
}

fn parse_node(raw: &StoreValue) -> Option<GraphNode> {
    let map = raw.as_map()?;
    let id = map.get("id").and_then(StoreValue::to_text)?;

    let labels: Vec<String> = map
        .get("labels")
        .and_then(StoreValue::as_list)
        .map(|items| items.iter().filter_map(StoreValue::to_text).collect())
        .or_else(|| map.get("node_type").and_then(StoreValue::to_text).map(|t| vec![t]))
        .unwrap_or_default();
    let node_type = NodeType::from_labels(&labels);

    let label = map
        .get("label")
        .and_then(StoreValue::to_text)
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let properties = map
        .get("properties")
        .and_then(StoreValue::as_map)
        .map(map_to_json)
        .unwrap_or_default();

    Some(GraphNode {
        id,
        label,
        node_type,
        properties,
        color: node_type.color().to_string(),
    })
}

fn parse_edge(raw: &StoreValue) -> Option<GraphEdge> {
    let map = raw.as_map()?;
    let text = |key: &str| map.get(key).and_then(StoreValue::to_text);

    Some(GraphEdge {
        id: text("id")?,
        source: text("source")?,
        target: text("target")?,
        relationship_type: text("relationship_type").unwrap_or_else(|| "RELATED_TO".to_string()),
        properties: map
            .get("properties")
            .and_then(StoreValue::as_map)
            .map(map_to_json)
            .unwrap_or_else(Map::new),
    })
}
