pub mod errors;
pub mod graph_db;
pub mod services;

pub use errors::{GraphError, GraphResult};
pub use graph_db::{GraphQuery, GraphStore, Neo4jClient, StoreRecord, StoreValue};
pub use services::{EntityLookupService, GraphTraversalService, OffshoreHit};
