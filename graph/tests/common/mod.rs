#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use screener_graph::{GraphError, GraphQuery, GraphResult, GraphStore, StoreRecord, StoreValue};
use std::collections::HashMap;

type Responder = Box<dyn Fn(&GraphQuery) -> GraphResult<Vec<StoreRecord>> + Send + Sync>;

/// Graph store that answers from a closure and records every query it sees
pub struct StubGraphStore {
    responder: Responder,
    pub queries: Mutex<Vec<GraphQuery>>,
}

impl StubGraphStore {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GraphQuery) -> GraphResult<Vec<StoreRecord>> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(records: Vec<StoreRecord>) -> Self {
        Self::new(move |_| Ok(records.clone()))
    }

    pub fn failing(error: GraphError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }
}

#[async_trait]
impl GraphStore for StubGraphStore {
    async fn run_query(&self, query: GraphQuery) -> GraphResult<Vec<StoreRecord>> {
        let result = (self.responder)(&query);
        self.queries.lock().push(query);
        result
    }
}

pub fn map(pairs: Vec<(&str, StoreValue)>) -> StoreValue {
    StoreValue::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>(),
    )
}

pub fn node(id: &str, name: Option<&str>, label: &str) -> StoreValue {
    map(vec![
        ("id", StoreValue::from(id)),
        ("label", name.map(StoreValue::from).unwrap_or(StoreValue::Null)),
        ("node_type", StoreValue::from(label)),
        ("labels", StoreValue::List(vec![StoreValue::from(label)])),
        ("properties", map(vec![("name", name.map(StoreValue::from).unwrap_or(StoreValue::Null))])),
    ])
}

pub fn edge(id: &str, source: &str, target: &str, rel: &str) -> StoreValue {
    map(vec![
        ("id", StoreValue::from(id)),
        ("source", StoreValue::from(source)),
        ("target", StoreValue::from(target)),
        ("relationship_type", StoreValue::from(rel)),
        ("properties", map(vec![])),
    ])
}

/// One traversal row: a path's nodes and relationships
pub fn path(nodes: Vec<StoreValue>, edges: Vec<StoreValue>) -> StoreRecord {
    StoreRecord::new()
        .with("nodes", StoreValue::List(nodes))
        .with("edges", StoreValue::List(edges))
}
