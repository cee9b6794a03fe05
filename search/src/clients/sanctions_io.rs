use super::{CircuitBreaker, HttpHandle, RetryPolicy, SourceClient};
use crate::errors::SourceError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use screener_config::RemoteApiSettings;
use screener_models::{EntitySchema, SanctionProgram, SanctionedEntity, SourceDetails, SourceKind};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-Key";

/// Sanctions.io records are loosely typed: ids may be numbers and list
/// fields may arrive as a bare string.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(text)
}

fn text_list(raw: &Value, key: &str) -> Vec<String> {
    match raw.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Addresses come as strings or objects; objects render their `full` field
/// or, failing that, their text fields joined with ", "
fn addresses(raw: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = raw.get("addresses") else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(fields) => fields.get("full").and_then(text).or_else(|| {
                let parts: Vec<String> = fields
                    .values()
                    .filter_map(text)
                    .filter(|s| !s.trim().is_empty())
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }),
            _ => None,
        })
        .collect()
}

fn parse_entity(raw: &Value) -> SanctionedEntity {
    let list_type = text_field(raw, "list_type").unwrap_or_else(|| "Unknown".to_string());
    let programs = text_list(raw, "programs")
        .into_iter()
        .map(|program| SanctionProgram {
            program,
            authority: None,
            start_date: None,
            reason: None,
        })
        .collect();

    SanctionedEntity {
        id: text_field(raw, "id").unwrap_or_default(),
        name: text_field(raw, "name").unwrap_or_else(|| "Unknown".to_string()),
        schema: EntitySchema::from_label(&text_field(raw, "type").unwrap_or_default()),
        aliases: text_list(raw, "akas"),
        birth_date: text_list(raw, "dates_of_birth").into_iter().next(),
        death_date: None,
        nationalities: text_list(raw, "nationalities"),
        countries: Vec::new(),
        is_sanctioned: true,
        sanction_programs: programs,
        datasets: vec![list_type.clone()],
        match_score: 0,
        details: SourceDetails::SanctionsIo {
            list_type,
            addresses: addresses(raw),
            remarks: text_field(raw, "remarks"),
            references: text_list(raw, "sources"),
        },
    }
}

/// Client for the Sanctions.io REST API. Requires an API key.
pub struct SanctionsIoClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    http: HttpHandle,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl SanctionsIoClient {
    pub fn new(
        settings: &RemoteApiSettings,
        retry: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
            http: HttpHandle::new(settings.timeout)?,
            retry,
            breaker,
        })
    }

    async fn fetch(
        &self,
        api_key: &str,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> Result<Vec<Value>, SourceError> {
        let client = self.http.get()?;
        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();
        let fuzzy = if fuzzy { "true" } else { "false" };

        let response = client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, api_key)
            .query(&[("name", query), ("fuzzy", fuzzy), ("limit", limit.as_str())])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                return Err(SourceError::Auth("Sanctions.io API key is invalid".to_string()))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited(
                    "Sanctions.io rate limit exceeded. Please try again later.".to_string(),
                ))
            }
            status => {
                return Err(SourceError::Http {
                    status: status.as_u16(),
                    message: "Sanctions.io API error".to_string(),
                })
            }
        }

        let payload: Value = response.json().await?;
        Ok(match payload.get("results") {
            Some(Value::Array(results)) => results.clone(),
            _ => Vec::new(),
        })
    }
}

#[async_trait]
impl SourceClient for SanctionsIoClient {
    fn source(&self) -> SourceKind {
        SourceKind::SanctionsIo
    }

    fn name(&self) -> &str {
        "sanctions_io"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        fuzzy: bool,
    ) -> Result<Vec<SanctionedEntity>, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(query, "⚠️ Sanctions.io API key not configured");
            return Err(SourceError::NotConfigured(
                "Sanctions.io API key not configured".to_string(),
            ));
        };

        tracing::info!(query, fuzzy, limit, "🔍 Sanctions.io search started");

        let result = self
            .breaker
            .call(|| async {
                self.retry
                    .run(self.name(), || self.fetch(api_key, query, limit, fuzzy))
                    .await
                    .map_err(|e| match e {
                        SourceError::Timeout => SourceError::Deadline(self.timeout.as_secs()),
                        other => other,
                    })
            })
            .await;

        match result {
            Ok(results) => {
                let entities: Vec<SanctionedEntity> = results.iter().map(parse_entity).collect();
                tracing::info!(query, results_count = entities.len(), "✅ Sanctions.io search succeeded");
                Ok(entities)
            }
            Err(e) => {
                tracing::error!(query, error = %e, "❌ Sanctions.io search failed");
                Err(e)
            }
        }
    }

    async fn close(&self) {
        self.http.close();
    }
}
