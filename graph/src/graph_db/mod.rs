pub mod neo4j_client;
pub mod value;

pub use neo4j_client::Neo4jClient;
pub use value::{map_to_json, GraphQuery, StoreRecord, StoreValue};

use crate::errors::GraphResult;
use async_trait::async_trait;

/// Read access to a property graph
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a read query and collect every row
    async fn run_query(&self, query: GraphQuery) -> GraphResult<Vec<StoreRecord>>;

    /// Cheap connectivity probe
    async fn ping(&self) -> GraphResult<()> {
        self.run_query(GraphQuery::new("RETURN 1 AS ok").returns(&["ok"]))
            .await
            .map(|_| ())
    }
}
