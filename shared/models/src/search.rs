use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationErrors};

use crate::entity::{SanctionedEntity, SourceKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Exact,
    Fuzzy,
}

impl SearchType {
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, SearchType::Fuzzy)
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchType::Exact => f.write_str("exact"),
            SearchType::Fuzzy => f.write_str("fuzzy"),
        }
    }
}

fn default_sources() -> Vec<SourceKind> {
    vec![SourceKind::OpenSanctions, SourceKind::SanctionsIo]
}

fn default_limit() -> u32 {
    10
}

fn default_fuzzy_threshold() -> u8 {
    80
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SearchRequest {
    #[validate(length(min = 2, max = 200, message = "Query must be between 2 and 200 characters"))]
    pub query: String,

    #[serde(default)]
    pub search_type: SearchType,

    #[serde(default = "default_sources")]
    #[validate(length(min = 1, message = "At least one source is required"))]
    pub sources: Vec<SourceKind>,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: u32,

    #[serde(default = "default_fuzzy_threshold")]
    #[validate(range(min = 50, max = 100, message = "Fuzzy threshold must be between 50 and 100"))]
    pub fuzzy_threshold: u8,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_type: SearchType::default(),
            sources: default_sources(),
            limit: default_limit(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }

    pub fn fuzzy(mut self, threshold: u8) -> Self {
        self.search_type = SearchType::Fuzzy;
        self.fuzzy_threshold = threshold;
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Trim the query, drop control characters and repeated sources, then validate
    pub fn sanitized(mut self) -> Result<Self, ValidationErrors> {
        self.query = self
            .query
            .trim()
            .chars()
            .filter(|c| !c.is_control())
            .collect::<String>()
            .trim()
            .to_string();

        let mut seen = Vec::with_capacity(self.sources.len());
        for source in self.sources {
            if !seen.contains(&source) {
                seen.push(source);
            }
        }
        self.sources = seen;

        self.validate()?;
        Ok(self)
    }

    /// Stable key for response caching; call on a sanitized request
    pub fn cache_key(&self) -> String {
        let sources: Vec<&str> = self.sources.iter().map(|s| s.as_str()).collect();
        format!(
            "{}|{}|{}|{}|{}",
            self.query.to_lowercase(),
            self.search_type,
            sources.join(","),
            self.limit,
            self.fuzzy_threshold
        )
    }
}

/// Per-source slice of a search response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SourceBucket {
    pub found: bool,
    pub count: usize,
    pub sanctioned_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<SanctionedEntity>,
}

impl SourceBucket {
    pub fn from_results(results: Vec<SanctionedEntity>, error: Option<String>) -> Self {
        Self {
            found: !results.is_empty(),
            count: results.len(),
            sanctioned_count: results.iter().filter(|e| e.is_sanctioned).count(),
            error,
            results,
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    pub search_type: SearchType,
    pub results_by_source: BTreeMap<SourceKind, SourceBucket>,
    pub all_results: Vec<SanctionedEntity>,
    pub total_results: usize,
    pub total_sanctioned: usize,
    pub offshore_connections_found: usize,
    pub sources_searched: Vec<SourceKind>,
    pub sources_succeeded: Vec<SourceKind>,
    pub sources_failed: Vec<SourceKind>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_threshold: Option<u8>,
}
