#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use screener_models::{
    OffshoreConnection, SanctionedEntity, SourceDetails, SourceKind,
};
use screener_search::{SourceClient, SourceError, SourceProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Canned answer for one stub client
#[derive(Clone)]
pub struct StubSpec {
    pub source: SourceKind,
    pub name: String,
    pub response: Result<Vec<SanctionedEntity>, SourceError>,
    pub delay: Option<Duration>,
}

impl StubSpec {
    pub fn ok(source: SourceKind, results: Vec<SanctionedEntity>) -> Self {
        Self {
            source,
            name: format!("stub-{}", source),
            response: Ok(results),
            delay: None,
        }
    }

    pub fn err(source: SourceKind, error: SourceError) -> Self {
        Self {
            source,
            name: format!("stub-{}", source),
            response: Err(error),
            delay: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub searched: AtomicUsize,
    pub closed: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn searched(&self) -> usize {
        self.searched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct StubClient {
    spec: StubSpec,
    counters: Arc<Counters>,
}

#[async_trait]
impl SourceClient for StubClient {
    fn source(&self) -> SourceKind {
        self.spec.source
    }

    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn search(
        &self,
        _query: &str,
        _limit: u32,
        _fuzzy: bool,
    ) -> Result<Vec<SanctionedEntity>, SourceError> {
        self.counters.searched.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.spec.delay {
            tokio::time::sleep(delay).await;
        }
        self.spec.response.clone()
    }

    async fn close(&self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider handing out fresh stub clients per request, in declaration order
pub struct StubProvider {
    specs: Vec<StubSpec>,
    open_errors: Mutex<Vec<(SourceKind, SourceError)>>,
    pub counters: Arc<Counters>,
}

impl StubProvider {
    pub fn new(specs: Vec<StubSpec>) -> Self {
        Self {
            specs,
            open_errors: Mutex::new(Vec::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_open_error(self, source: SourceKind, error: SourceError) -> Self {
        self.open_errors.lock().push((source, error));
        self
    }
}

impl SourceProvider for StubProvider {
    fn open(&self, source: SourceKind) -> Result<Vec<Box<dyn SourceClient>>, SourceError> {
        if let Some((_, error)) = self.open_errors.lock().iter().find(|(s, _)| *s == source) {
            return Err(error.clone());
        }

        Ok(self
            .specs
            .iter()
            .filter(|spec| spec.source == source)
            .map(|spec| {
                self.counters.opened.fetch_add(1, Ordering::SeqCst);
                Box::new(StubClient {
                    spec: spec.clone(),
                    counters: self.counters.clone(),
                }) as Box<dyn SourceClient>
            })
            .collect())
    }
}

pub fn opensanctions_entity(name: &str, sanctioned: bool) -> SanctionedEntity {
    let mut entity = SanctionedEntity::new(
        format!("os-{}", name.to_lowercase().replace(' ', "-")),
        name,
        SourceDetails::OpenSanctions {
            url: "https://api.opensanctions.org/entities/x".to_string(),
            first_seen: None,
            last_seen: None,
        },
    );
    entity.is_sanctioned = sanctioned;
    entity
}

pub fn sanctions_io_entity(name: &str) -> SanctionedEntity {
    let mut entity = SanctionedEntity::new(
        format!("sio-{}", name.to_lowercase().replace(' ', "-")),
        name,
        SourceDetails::SanctionsIo {
            list_type: "SDN".to_string(),
            addresses: Vec::new(),
            remarks: None,
            references: Vec::new(),
        },
    );
    entity.is_sanctioned = true;
    entity
}

pub fn offshore_entity(name: &str, connections_count: i64) -> SanctionedEntity {
    SanctionedEntity::new(
        "12000001",
        name,
        SourceDetails::OffshoreLeaks {
            node_id: 12000001,
            node_type: "Entity".to_string(),
            jurisdiction: Some("BVI".to_string()),
            jurisdiction_description: Some("British Virgin Islands".to_string()),
            incorporation_date: None,
            service_provider: None,
            company_type: None,
            status: None,
            address: None,
            source_dataset: "Panama Papers".to_string(),
            connections_count,
            connections: vec![OffshoreConnection {
                entity_id: "12000002".to_string(),
                entity_name: "Mossack Fonseca".to_string(),
                entity_type: "Intermediary".to_string(),
                relationship: "intermediary_of".to_string(),
                jurisdiction: None,
            }],
        },
    )
}
