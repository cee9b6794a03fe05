//! Domain types shared by the search, graph and API crates

pub mod entity;
pub mod graph;
pub mod search;

pub use entity::{
    EntitySchema, OffshoreConnection, SanctionProgram, SanctionedEntity, SourceDetails, SourceKind,
};
pub use graph::{
    ConnectionGraph, ConnectionRequest, ConnectionResponse, GraphEdge, GraphNode, NodeType,
    OffshoreEntity,
};
pub use search::{SearchRequest, SearchResponse, SearchType, SourceBucket};
