use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::entity::{EntitySchema, OffshoreConnection, SanctionedEntity, SourceDetails};

/// Primary label of an Offshore Leaks node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeType {
    Officer,
    Entity,
    Intermediary,
    Address,
    Unknown,
}

impl NodeType {
    /// The first label decides the type
    pub fn from_labels(labels: &[String]) -> Self {
        match labels.first().map(String::as_str) {
            Some("Officer") => NodeType::Officer,
            Some("Entity") => NodeType::Entity,
            Some("Intermediary") => NodeType::Intermediary,
            Some("Address") => NodeType::Address,
            _ => NodeType::Unknown,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            NodeType::Officer => "#3B82F6",
            NodeType::Entity => "#10B981",
            NodeType::Intermediary => "#F59E0B",
            NodeType::Address | NodeType::Unknown => "#6B7280",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    pub properties: Map<String, Value>,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relationship_type: String,
    pub properties: Map<String, Value>,
}

/// Neighbourhood of a centre node. Counts always match the vectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub center_node_id: String,
    pub depth: u32,
    pub node_count: usize,
    pub edge_count: usize,
}

impl ConnectionGraph {
    pub fn new(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        center_node_id: impl Into<String>,
        depth: u32,
    ) -> Self {
        Self {
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes,
            edges,
            center_node_id: center_node_id.into(),
            depth,
        }
    }

    pub fn empty(center_node_id: impl Into<String>, depth: u32) -> Self {
        Self::new(Vec::new(), Vec::new(), center_node_id, depth)
    }
}

/// Offshore Leaks node with its direct-connection preview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OffshoreEntity {
    pub node_id: i64,
    pub name: String,
    pub node_type: String,
    pub countries: Vec<String>,
    pub jurisdiction: Option<String>,
    pub jurisdiction_description: Option<String>,
    pub incorporation_date: Option<String>,
    pub service_provider: Option<String>,
    pub company_type: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub source_dataset: String,
    pub connections_count: i64,
    pub connections: Vec<OffshoreConnection>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl OffshoreEntity {
    /// Project into a search hit. Offshore entities are never sanctioned.
    pub fn into_sanctioned(self, match_score: u8) -> SanctionedEntity {
        let datasets = if self.source_dataset.is_empty() {
            Vec::new()
        } else {
            vec![self.source_dataset.clone()]
        };

        SanctionedEntity {
            id: self.node_id.to_string(),
            name: self.name,
            schema: EntitySchema::from_label(&self.node_type),
            aliases: Vec::new(),
            birth_date: None,
            death_date: None,
            nationalities: Vec::new(),
            countries: self.countries,
            is_sanctioned: false,
            sanction_programs: Vec::new(),
            datasets,
            match_score,
            details: SourceDetails::OffshoreLeaks {
                node_id: self.node_id,
                node_type: self.node_type,
                jurisdiction: self.jurisdiction,
                jurisdiction_description: self.jurisdiction_description,
                incorporation_date: self.incorporation_date,
                service_provider: self.service_provider,
                company_type: self.company_type,
                status: self.status,
                address: self.address,
                source_dataset: self.source_dataset,
                connections_count: self.connections_count,
                connections: self.connections,
            },
        }
    }
}

fn default_depth() -> u32 {
    2
}

fn default_max_nodes() -> u32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectionRequest {
    pub node_id: i64,

    #[serde(default = "default_depth")]
    #[validate(range(min = 1, max = 3, message = "Depth must be between 1 and 3"))]
    pub depth: u32,

    #[serde(default = "default_max_nodes")]
    #[validate(range(min = 10, max = 100, message = "max_nodes must be between 10 and 100"))]
    pub max_nodes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub node_id: i64,
    pub node_name: String,
    pub graph: ConnectionGraph,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_colors() {
        let labels = |l: &str| vec![l.to_string()];

        assert_eq!(NodeType::from_labels(&labels("Officer")).color(), "#3B82F6");
        assert_eq!(NodeType::from_labels(&labels("Entity")).color(), "#10B981");
        assert_eq!(NodeType::from_labels(&labels("Intermediary")).color(), "#F59E0B");
        assert_eq!(NodeType::from_labels(&labels("Address")).color(), "#6B7280");
        assert_eq!(NodeType::from_labels(&labels("Other")), NodeType::Unknown);
        assert_eq!(NodeType::from_labels(&[]).color(), "#6B7280");
    }

    #[test]
    fn test_connection_request_bounds() {
        let request: ConnectionRequest = serde_json::from_str(r#"{"node_id": 7}"#).unwrap();
        assert_eq!(request.depth, 2);
        assert_eq!(request.max_nodes, 50);
        assert!(request.validate().is_ok());

        let too_deep: ConnectionRequest =
            serde_json::from_str(r#"{"node_id": 7, "depth": 4}"#).unwrap();
        assert!(too_deep.validate().is_err());

        let too_small: ConnectionRequest =
            serde_json::from_str(r#"{"node_id": 7, "max_nodes": 5}"#).unwrap();
        assert!(too_small.validate().is_err());
    }

    #[test]
    fn test_offshore_entity_is_never_sanctioned() {
        let entity = OffshoreEntity {
            node_id: 12,
            name: "Mossfon Holdings".to_string(),
            node_type: "Entity".to_string(),
            countries: vec!["Panama".to_string()],
            jurisdiction: Some("PAN".to_string()),
            jurisdiction_description: None,
            incorporation_date: None,
            service_provider: None,
            company_type: None,
            status: None,
            address: None,
            source_dataset: "Panama Papers".to_string(),
            connections_count: 3,
            connections: Vec::new(),
            properties: Map::new(),
        };

        let hit = entity.into_sanctioned(87);
        assert!(!hit.is_sanctioned);
        assert_eq!(hit.id, "12");
        assert_eq!(hit.schema, EntitySchema::Company);
        assert_eq!(hit.datasets, vec!["Panama Papers".to_string()]);
        assert_eq!(hit.match_score, 87);
    }
}
