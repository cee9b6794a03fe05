use super::{CircuitBreaker, HttpHandle, RetryPolicy, SourceClient};
use crate::errors::SourceError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use screener_config::RemoteApiSettings;
use screener_models::{EntitySchema, SanctionProgram, SanctionedEntity, SourceDetails, SourceKind};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const MAX_ALIASES: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    results: Vec<RawEntity>,
}

/// OpenSanctions entity as served by `/search/default`. Every property is an array.
#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    id: String,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    properties: HashMap<String, Vec<Value>>,
    #[serde(default)]
    datasets: Vec<String>,
    #[serde(default)]
    first_seen: Option<String>,
    #[serde(default)]
    last_seen: Option<String>,
}

impl RawEntity {
    fn values(&self, key: &str) -> Vec<String> {
        self.properties
            .get(key)
            .map(|items| items.iter().filter_map(value_text).collect())
            .unwrap_or_default()
    }

    fn first(&self, key: &str) -> Option<String> {
        self.values(key).into_iter().next()
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Latin letters (including Latin-1 and Extended-A), whitespace and name punctuation
fn is_latin(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| {
            c.is_ascii() || ('\u{00C0}'..='\u{017F}').contains(&c) || c.is_whitespace()
        })
}

/// Prefer a Latin-script display name: name, alias, first+last, then anything
fn display_name(raw: &RawEntity) -> String {
    let names = raw.values("name");
    if let Some(name) = names.iter().find(|n| is_latin(n)) {
        return name.clone();
    }
    if let Some(alias) = raw.values("alias").into_iter().find(|a| is_latin(a)) {
        return alias;
    }

    let first_name = raw.values("firstName").into_iter().find(|n| is_latin(n));
    let last_name = raw.values("lastName").into_iter().find(|n| is_latin(n));
    if let (Some(first), Some(last)) = (first_name, last_name) {
        return format!("{} {}", first, last);
    }

    names
        .into_iter()
        .next()
        .unwrap_or_else(|| "Unknown".to_string())
}

fn sanction_programs(raw: &RawEntity) -> Vec<SanctionProgram> {
    let authorities = raw.values("authority");
    let start_dates = raw.values("startDate");
    let reasons = raw.values("reason");

    raw.values("program")
        .into_iter()
        .enumerate()
        .map(|(i, program)| SanctionProgram {
            program,
            authority: authorities.get(i).cloned(),
            start_date: start_dates.get(i).cloned(),
            reason: reasons.get(i).cloned(),
        })
        .collect()
}

fn parse_entity(raw: &RawEntity, base_url: &str) -> SanctionedEntity {
    let programs = sanction_programs(raw);
    let has_sanction_topic = raw
        .values("topics")
        .iter()
        .any(|t| t.to_lowercase().contains("sanction"));

    SanctionedEntity {
        id: raw.id.clone(),
        name: display_name(raw),
        schema: EntitySchema::from_label(raw.schema.as_deref().unwrap_or_default()),
        aliases: raw
            .values("alias")
            .into_iter()
            .filter(|a| is_latin(a))
            .take(MAX_ALIASES)
            .collect(),
        birth_date: raw.first("birthDate"),
        death_date: raw.first("deathDate"),
        nationalities: raw.values("nationality"),
        countries: raw.values("country"),
        is_sanctioned: !programs.is_empty() || has_sanction_topic,
        sanction_programs: programs,
        datasets: raw.datasets.clone(),
        match_score: 0,
        details: SourceDetails::OpenSanctions {
            url: format!("{}/entities/{}", base_url, raw.id),
            first_seen: raw.first_seen.clone(),
            last_seen: raw.last_seen.clone(),
        },
    }
}

/// Client for the OpenSanctions hosted API
pub struct OpenSanctionsClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    http: HttpHandle,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl OpenSanctionsClient {
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

    async fn fetch(&self, query: &str, limit: u32) -> Result<SearchPayload, SourceError> {
        let client = self.http.get()?;
        let url = format!("{}/search/default", self.base_url);
        let limit = limit.to_string();

        let mut request = client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&[("q", query), ("limit", limit.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("ApiKey {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: "OpenSanctions API error".to_string(),
            });
        }

        Ok(response.json::<SearchPayload>().await?)
    }
}

#[async_trait]
impl SourceClient for OpenSanctionsClient {
    fn source(&self) -> SourceKind {
        SourceKind::OpenSanctions
    }

    fn name(&self) -> &str {
        "opensanctions"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        _fuzzy: bool,
    ) -> Result<Vec<SanctionedEntity>, SourceError> {
        tracing::info!(query, limit, "🔍 OpenSanctions search started");

        let result = self
            .breaker
            .call(|| async {
                self.retry
                    .run(self.name(), || self.fetch(query, limit))
                    .await
                    .map_err(|e| match e {
                        SourceError::Timeout => SourceError::Deadline(self.timeout.as_secs()),
                        other => other,
                    })
            })
            .await;

        match result {
            Ok(payload) => {
                let entities: Vec<SanctionedEntity> = payload
                    .results
                    .iter()
                    .map(|raw| parse_entity(raw, &self.base_url))
                    .collect();
                tracing::info!(query, results_count = entities.len(), "✅ OpenSanctions search succeeded");
                Ok(entities)
            }
            Err(e) => {
                tracing::error!(query, error = %e, "❌ OpenSanctions search failed");
                Err(e)
            }
        }
    }

    async fn close(&self) {
        self.http.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawEntity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_is_latin() {
        assert!(is_latin("Vladimir Putin"));
        assert!(is_latin("Müller-Lüdenscheidt"));
        assert!(is_latin("O'Brien, Jr."));
        assert!(!is_latin("Владимир Путин"));
        assert!(!is_latin(""));
    }

    #[test]
    fn test_display_name_prefers_latin() {
        let entity = raw(json!({
            "id": "Q7747",
            "properties": {
                "name": ["Владимир Путин", "Vladimir Putin"]
            }
        }));
        assert_eq!(display_name(&entity), "Vladimir Putin");

        let entity = raw(json!({
            "id": "x",
            "properties": {
                "name": ["Владимир Путин"],
                "firstName": ["Vladimir"],
                "lastName": ["Putin"]
            }
        }));
        assert_eq!(display_name(&entity), "Vladimir Putin");

        let entity = raw(json!({"id": "x", "properties": {"name": ["普京"]}}));
        assert_eq!(display_name(&entity), "普京");

        let entity = raw(json!({"id": "x"}));
        assert_eq!(display_name(&entity), "Unknown");
    }

    #[test]
    fn test_parse_entity() {
        let entity = raw(json!({
            "id": "NK-abc",
            "schema": "Person",
            "properties": {
                "name": ["Vladimir Putin"],
                "alias": ["Putin", "Путин", "V. Putin", "a", "b", "c", "d"],
                "birthDate": ["1952-10-07", "1952"],
                "nationality": ["ru"],
                "country": ["ru"],
                "program": ["RUSSIA-EO14024", "EU-UKR"],
                "authority": ["OFAC"],
                "startDate": ["2022-02-25"]
            },
            "datasets": ["us_ofac_sdn"],
            "first_seen": "2022-02-25T00:00:00"
        }));

        let parsed = parse_entity(&entity, "https://api.opensanctions.org");

        assert_eq!(parsed.schema, EntitySchema::Person);
        assert_eq!(parsed.aliases.len(), MAX_ALIASES);
        assert!(!parsed.aliases.contains(&"Путин".to_string()));
        assert_eq!(parsed.birth_date.as_deref(), Some("1952-10-07"));
        assert!(parsed.is_sanctioned);
        assert_eq!(parsed.sanction_programs.len(), 2);
        assert_eq!(parsed.sanction_programs[0].authority.as_deref(), Some("OFAC"));
        assert_eq!(parsed.sanction_programs[1].authority, None);
        assert_eq!(parsed.source(), SourceKind::OpenSanctions);
        match parsed.details {
            SourceDetails::OpenSanctions { url, first_seen, .. } => {
                assert_eq!(url, "https://api.opensanctions.org/entities/NK-abc");
                assert_eq!(first_seen.as_deref(), Some("2022-02-25T00:00:00"));
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_sanction_topic_marks_sanctioned() {
        let entity = raw(json!({
            "id": "x",
            "properties": {"name": ["Acme"], "topics": ["sanction.linked"]}
        }));
        assert!(parse_entity(&entity, "http://localhost").is_sanctioned);

        let entity = raw(json!({
            "id": "y",
            "properties": {"name": ["Acme"], "topics": ["role.pep"]}
        }));
        assert!(!parse_entity(&entity, "http://localhost").is_sanctioned);
    }
}
