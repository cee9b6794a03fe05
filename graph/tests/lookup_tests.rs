mod common;

use common::{map, StubGraphStore};
use screener_graph::{EntityLookupService, GraphError, StoreRecord, StoreValue};
use std::sync::Arc;

fn entity_row(node_id: i64, name: &str, score: f64) -> StoreRecord {
    StoreRecord::new()
        .with("node_id", StoreValue::Integer(node_id))
        .with("name", StoreValue::from(name))
        .with("node_type", StoreValue::from("Entity"))
        .with("countries", StoreValue::from("Panama;Seychelles"))
        .with("jurisdiction", StoreValue::from("SEY"))
        .with("source_dataset", StoreValue::from("Panama Papers"))
        .with("score", StoreValue::Float(score))
        .with("conn_count", StoreValue::Integer(2))
        .with(
            "connections",
            StoreValue::List(vec![map(vec![
                ("entity_id", StoreValue::from("44")),
                ("entity_name", StoreValue::from("Mossack Fonseca")),
                ("entity_type", StoreValue::from("Intermediary")),
                ("relationship", StoreValue::from("INTERMEDIARY_OF")),
                ("jurisdiction", StoreValue::Null),
            ])]),
        )
        .with("properties", map(vec![("status", StoreValue::from("Active"))]))
}

#[tokio::test]
async fn test_fulltext_search_scales_scores() {
    let store = Arc::new(StubGraphStore::returning(vec![entity_row(12, "Acme Trust", 7.5)]));
    let service = EntityLookupService::new(store.clone());

    let hits = service.search("acme", 10).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].match_score, 75);
    assert_eq!(hits[0].entity.countries, vec!["Panama".to_string(), "Seychelles".to_string()]);
    assert_eq!(hits[0].entity.connections_count, 2);
    assert_eq!(hits[0].entity.connections[0].entity_name, "Mossack Fonseca");

    let queries = store.queries.lock();
    assert!(queries[0].cypher.contains("offshore_fulltext"));
    assert_eq!(queries[0].param_value("query"), Some(&StoreValue::from("acme")));
}

#[tokio::test]
async fn test_missing_index_falls_back_to_contains() {
    let store = Arc::new(StubGraphStore::new(|query| {
        if query.cypher.contains("fulltext") {
            Err(GraphError::Query("There is no such index: offshore_fulltext".to_string()))
        } else {
            Ok(vec![entity_row(3, "Acme Trust", 1.0)])
        }
    }));
    let service = EntityLookupService::new(store.clone());

    let hits = service.search("Acme", 5).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].match_score, 10);
    let queries = store.queries.lock();
    assert_eq!(queries.len(), 2);
    assert!(queries[1].cypher.contains("CONTAINS"));
}

#[tokio::test]
async fn test_other_search_errors_propagate() {
    let store = Arc::new(StubGraphStore::failing(GraphError::Query("timeout".to_string())));
    let service = EntityLookupService::new(store.clone());

    assert!(service.search("acme", 5).await.is_err());
    assert_eq!(store.queries.lock().len(), 1);
}

#[tokio::test]
async fn test_get_by_id_not_found_is_none() {
    let service = EntityLookupService::new(Arc::new(StubGraphStore::returning(vec![])));

    assert_eq!(service.get_by_id(424242).await.unwrap(), None);
}

#[tokio::test]
async fn test_get_by_id_connectivity_failure_is_an_error() {
    let service = EntityLookupService::new(Arc::new(StubGraphStore::failing(
        GraphError::Connection("connection refused".to_string()),
    )));

    let err = service.get_by_id(1).await.unwrap_err();
    assert!(matches!(err, GraphError::Connection(_)));
}

#[tokio::test]
async fn test_get_by_id_returns_entity_with_properties() {
    let service =
        EntityLookupService::new(Arc::new(StubGraphStore::returning(vec![entity_row(12, "Acme", 10.0)])));

    let entity = service.get_by_id(12).await.unwrap().unwrap();

    assert_eq!(entity.node_id, 12);
    assert_eq!(entity.name, "Acme");
    assert_eq!(entity.properties["status"], "Active");
}
