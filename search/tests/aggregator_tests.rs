mod common;

use common::*;
use screener_models::{SearchRequest, SearchType, SourceKind};
use screener_search::{AggregatorConfig, ResultAggregator, SearchError, SourceError};
use std::sync::Arc;
use std::time::Duration;

fn aggregator(provider: Arc<StubProvider>) -> ResultAggregator {
    ResultAggregator::new(
        provider,
        AggregatorConfig {
            source_timeout: Duration::from_millis(200),
        },
    )
}

#[tokio::test]
async fn test_fuzzy_search_keeps_close_names_only() {
    let provider = Arc::new(StubProvider::new(vec![StubSpec::ok(
        SourceKind::OpenSanctions,
        vec![
            opensanctions_entity("Vladimir Putin", true),
            opensanctions_entity("John Smith", false),
        ],
    )]));

    let request = SearchRequest::new("Vladimir Putin")
        .fuzzy(80)
        .with_sources(vec![SourceKind::OpenSanctions])
        .with_limit(10);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.total_results, 1);
    assert_eq!(response.all_results[0].name, "Vladimir Putin");
    assert_eq!(response.all_results[0].match_score, 100);
    assert_eq!(response.fuzzy_threshold, Some(80));
    assert_eq!(response.search_type, SearchType::Fuzzy);
}

#[tokio::test]
async fn test_exact_search_drops_partial_names() {
    let provider = Arc::new(StubProvider::new(vec![StubSpec::ok(
        SourceKind::OpenSanctions,
        vec![
            opensanctions_entity("Vladimir Putin", true),
            opensanctions_entity("Vlad Putin", true),
        ],
    )]));

    let request =
        SearchRequest::new("Vladimir Putin").with_sources(vec![SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.total_results, 1);
    assert_eq!(response.all_results[0].name, "Vladimir Putin");
    assert_eq!(response.fuzzy_threshold, None);
}

#[tokio::test]
async fn test_exact_alias_match_forces_full_score() {
    let mut entity = opensanctions_entity("Vladimir Vladimirovich Putin", true);
    entity.aliases = vec!["Vladimir Putin".to_string()];
    let provider = Arc::new(StubProvider::new(vec![StubSpec::ok(
        SourceKind::OpenSanctions,
        vec![entity],
    )]));

    let request =
        SearchRequest::new("Vladimir Putin").with_sources(vec![SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.total_results, 1);
    assert_eq!(response.all_results[0].match_score, 100);
}

#[tokio::test]
async fn test_fuzzy_falls_back_to_alias_score() {
    let mut entity = opensanctions_entity("Gazprom Public Joint Stock Company", true);
    entity.aliases = vec!["PAO Gazprom".to_string(), "OAO Gazprom".to_string()];
    let provider = Arc::new(StubProvider::new(vec![StubSpec::ok(
        SourceKind::OpenSanctions,
        vec![entity],
    )]));

    let request = SearchRequest::new("OAO Gazprom")
        .fuzzy(90)
        .with_sources(vec![SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.total_results, 1);
    assert_eq!(response.all_results[0].match_score, 100);
}

#[tokio::test]
async fn test_failing_source_does_not_sink_the_others() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::err(
            SourceKind::OpenSanctions,
            SourceError::Network("boom".to_string()),
        ),
        StubSpec::ok(
            SourceKind::SanctionsIo,
            vec![sanctions_io_entity("Vladimir Putin")],
        ),
    ]));

    let request = SearchRequest::new("Vladimir Putin")
        .with_sources(vec![SourceKind::OpenSanctions, SourceKind::SanctionsIo]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.sources_failed, vec![SourceKind::OpenSanctions]);
    assert_eq!(response.sources_succeeded, vec![SourceKind::SanctionsIo]);
    assert_eq!(response.total_results, 1);

    let failed = &response.results_by_source[&SourceKind::OpenSanctions];
    assert!(!failed.found);
    assert_eq!(failed.error.as_deref(), Some("network error: boom"));
}

#[tokio::test]
async fn test_empty_source_counts_as_succeeded() {
    let provider = Arc::new(StubProvider::new(vec![StubSpec::ok(
        SourceKind::SanctionsIo,
        vec![],
    )]));

    let request =
        SearchRequest::new("Nobody Atall").with_sources(vec![SourceKind::SanctionsIo]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    let bucket = &response.results_by_source[&SourceKind::SanctionsIo];
    assert!(!bucket.found);
    assert_eq!(bucket.count, 0);
    assert!(bucket.error.is_none());
    assert_eq!(response.sources_succeeded, vec![SourceKind::SanctionsIo]);
    assert!(response.sources_failed.is_empty());
}

#[tokio::test]
async fn test_all_sources_failing_still_answers() {
    let provider = Arc::new(
        StubProvider::new(vec![StubSpec::err(
            SourceKind::SanctionsIo,
            SourceError::NotConfigured("Sanctions.io API key not configured".to_string()),
        )])
        .with_open_error(SourceKind::OpenSanctions, SourceError::Network("tls".to_string())),
    );

    let request = SearchRequest::new("Vladimir Putin").with_sources(vec![
        SourceKind::OpenSanctions,
        SourceKind::SanctionsIo,
        SourceKind::OffshoreLeaks,
    ]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.total_results, 0);
    assert!(response.sources_succeeded.is_empty());
    assert_eq!(response.sources_failed.len(), 3);
    assert_eq!(
        response.results_by_source[&SourceKind::OffshoreLeaks].error.as_deref(),
        Some("offshore_leaks not configured")
    );
    assert_eq!(
        response.results_by_source[&SourceKind::SanctionsIo].error.as_deref(),
        Some("Sanctions.io API key not configured")
    );
}

#[tokio::test]
async fn test_results_ranked_sanctioned_first() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::ok(
            SourceKind::OpenSanctions,
            vec![
                opensanctions_entity("Vladimir Putin", false),
                opensanctions_entity("Vladimir Putina", true),
                opensanctions_entity("Vladimir Putin Jr", true),
            ],
        ),
        StubSpec::ok(
            SourceKind::OffshoreLeaks,
            vec![offshore_entity("Vladimir Putin Holdings", 4)],
        ),
    ]));

    let request = SearchRequest::new("Vladimir Putin")
        .fuzzy(70)
        .with_sources(vec![SourceKind::OffshoreLeaks, SourceKind::OpenSanctions])
        .with_limit(50);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    let ranks: Vec<(bool, u8)> = response
        .all_results
        .iter()
        .map(|e| (e.is_sanctioned, e.match_score))
        .collect();
    assert!(ranks.windows(2).all(|w| w[0] >= w[1]), "{:?}", ranks);
    assert!(response.all_results[0].is_sanctioned);
    assert_eq!(response.total_sanctioned, 2);
    assert_eq!(response.offshore_connections_found, 4);
}

#[tokio::test]
async fn test_equal_ranks_keep_request_order() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::ok(
            SourceKind::OpenSanctions,
            vec![opensanctions_entity("Vladimir Putin", true)],
        ),
        StubSpec::ok(
            SourceKind::SanctionsIo,
            vec![sanctions_io_entity("Vladimir Putin")],
        ),
    ]));

    let request = SearchRequest::new("Vladimir Putin")
        .with_sources(vec![SourceKind::SanctionsIo, SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.all_results.len(), 2);
    assert_eq!(response.all_results[0].source(), SourceKind::SanctionsIo);
    assert_eq!(response.all_results[1].source(), SourceKind::OpenSanctions);
}

#[tokio::test]
async fn test_supplement_merges_new_names() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::ok(
            SourceKind::OpenSanctions,
            vec![opensanctions_entity("Vladimir Putin", true)],
        ),
        StubSpec::ok(
            SourceKind::OpenSanctions,
            vec![
                opensanctions_entity("VLADIMIR PUTIN", true),
                opensanctions_entity("Vladimir Putin Fund", true),
            ],
        )
        .named("local_sanctions"),
    ]));

    let request = SearchRequest::new("Vladimir Putin")
        .fuzzy(80)
        .with_sources(vec![SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    let names: Vec<&str> = response.all_results.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Vladimir Putin"));
    assert!(names.contains(&"Vladimir Putin Fund"));
}

#[tokio::test]
async fn test_supplement_replaces_failed_primary() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::err(
            SourceKind::OpenSanctions,
            SourceError::Http {
                status: 503,
                message: "OpenSanctions API error".to_string(),
            },
        ),
        StubSpec::ok(
            SourceKind::OpenSanctions,
            vec![opensanctions_entity("Vladimir Putin", true)],
        )
        .named("local_sanctions"),
    ]));

    let request =
        SearchRequest::new("Vladimir Putin").with_sources(vec![SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    let bucket = &response.results_by_source[&SourceKind::OpenSanctions];
    assert!(bucket.error.is_none());
    assert_eq!(bucket.count, 1);
    assert_eq!(response.sources_succeeded, vec![SourceKind::OpenSanctions]);
}

#[tokio::test]
async fn test_failed_primary_keeps_error_when_supplement_is_empty() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::err(SourceKind::OpenSanctions, SourceError::Timeout),
        StubSpec::ok(SourceKind::OpenSanctions, vec![]).named("local_sanctions"),
    ]));

    let request =
        SearchRequest::new("Vladimir Putin").with_sources(vec![SourceKind::OpenSanctions]);

    let response = aggregator(provider).aggregate(request).await.unwrap();

    assert_eq!(response.sources_failed, vec![SourceKind::OpenSanctions]);
    assert_eq!(
        response.results_by_source[&SourceKind::OpenSanctions].error.as_deref(),
        Some("request timed out")
    );
}

#[tokio::test]
async fn test_slow_source_times_out_alone() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::ok(
            SourceKind::OpenSanctions,
            vec![opensanctions_entity("Vladimir Putin", true)],
        )
        .delayed(Duration::from_secs(5)),
        StubSpec::ok(
            SourceKind::SanctionsIo,
            vec![sanctions_io_entity("Vladimir Putin")],
        ),
    ]));

    let request = SearchRequest::new("Vladimir Putin")
        .with_sources(vec![SourceKind::OpenSanctions, SourceKind::SanctionsIo]);

    let started = std::time::Instant::now();
    let response = aggregator(provider.clone()).aggregate(request).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(response.sources_failed, vec![SourceKind::OpenSanctions]);
    assert_eq!(
        response.results_by_source[&SourceKind::OpenSanctions].error.as_deref(),
        Some("request timed out after 0s")
    );
    assert_eq!(response.total_results, 1);
    assert_eq!(provider.counters.closed(), 2);
}

#[tokio::test]
async fn test_every_opened_client_is_closed() {
    let provider = Arc::new(StubProvider::new(vec![
        StubSpec::ok(SourceKind::OpenSanctions, vec![]),
        StubSpec::ok(SourceKind::OpenSanctions, vec![]).named("local_sanctions"),
        StubSpec::err(SourceKind::SanctionsIo, SourceError::Timeout),
        StubSpec::ok(
            SourceKind::OffshoreLeaks,
            vec![offshore_entity("Vladimir Putin", 1)],
        ),
    ]));

    let request = SearchRequest::new("Vladimir Putin").with_sources(vec![
        SourceKind::OpenSanctions,
        SourceKind::SanctionsIo,
        SourceKind::OffshoreLeaks,
    ]);

    aggregator(provider.clone()).aggregate(request).await.unwrap();

    assert_eq!(provider.counters.opened(), 4);
    assert_eq!(provider.counters.searched(), 4);
    assert_eq!(provider.counters.closed(), 4);
}

#[tokio::test]
async fn test_invalid_request_contacts_no_source() {
    let provider = Arc::new(StubProvider::new(vec![StubSpec::ok(
        SourceKind::OpenSanctions,
        vec![opensanctions_entity("Vladimir Putin", true)],
    )]));
    let aggregator = aggregator(provider.clone());

    let too_short = SearchRequest::new("  x \u{7} ");
    assert!(matches!(
        aggregator.aggregate(too_short).await,
        Err(SearchError::Validation(_))
    ));

    let no_sources = SearchRequest::new("Vladimir Putin").with_sources(vec![]);
    assert!(matches!(
        aggregator.aggregate(no_sources).await,
        Err(SearchError::Validation(_))
    ));

    assert_eq!(provider.counters.opened(), 0);
    assert_eq!(provider.counters.searched(), 0);
}
