use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data sources a search can fan out to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    #[serde(rename = "opensanctions")]
    OpenSanctions,
    #[serde(rename = "sanctions_io")]
    SanctionsIo,
    #[serde(rename = "offshore_leaks")]
    OffshoreLeaks,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::OpenSanctions,
        SourceKind::SanctionsIo,
        SourceKind::OffshoreLeaks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OpenSanctions => "opensanctions",
            SourceKind::SanctionsIo => "sanctions_io",
            SourceKind::OffshoreLeaks => "offshore_leaks",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opensanctions" => Ok(SourceKind::OpenSanctions),
            "sanctions_io" => Ok(SourceKind::SanctionsIo),
            "offshore_leaks" => Ok(SourceKind::OffshoreLeaks),
            other => Err(format!("unknown source: {}", other)),
        }
    }
}

/// Entity schema, normalized across sources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntitySchema {
    Person,
    Company,
    Organization,
    Vessel,
    Aircraft,
    LegalEntity,
}

impl EntitySchema {
    /// Map a source-specific type label onto the common schema.
    /// Anything unrecognized becomes `LegalEntity`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "person" | "individual" | "officer" => EntitySchema::Person,
            "company" | "entity" => EntitySchema::Company,
            "organization" | "organisation" | "intermediary" => EntitySchema::Organization,
            "vessel" | "ship" => EntitySchema::Vessel,
            "aircraft" | "airplane" => EntitySchema::Aircraft,
            _ => EntitySchema::LegalEntity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanctionProgram {
    pub program: String,
    pub authority: Option<String>,
    pub start_date: Option<String>,
    pub reason: Option<String>,
}

/// Preview of a node directly connected to an offshore entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OffshoreConnection {
    pub entity_id: String,
    pub entity_name: String,
    pub entity_type: String,
    pub relationship: String,
    pub jurisdiction: Option<String>,
}

/// Source-specific part of an entity. The variant is the origin tag, so it
/// cannot drift from the data that was parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source")]
pub enum SourceDetails {
    #[serde(rename = "opensanctions")]
    OpenSanctions {
        url: String,
        first_seen: Option<String>,
        last_seen: Option<String>,
    },
    #[serde(rename = "sanctions_io")]
    SanctionsIo {
        list_type: String,
        addresses: Vec<String>,
        remarks: Option<String>,
        references: Vec<String>,
    },
    #[serde(rename = "offshore_leaks")]
    OffshoreLeaks {
        node_id: i64,
        node_type: String,
        jurisdiction: Option<String>,
        jurisdiction_description: Option<String>,
        incorporation_date: Option<String>,
        service_provider: Option<String>,
        company_type: Option<String>,
        status: Option<String>,
        address: Option<String>,
        source_dataset: String,
        connections_count: i64,
        connections: Vec<OffshoreConnection>,
    },
}

impl SourceDetails {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDetails::OpenSanctions { .. } => SourceKind::OpenSanctions,
            SourceDetails::SanctionsIo { .. } => SourceKind::SanctionsIo,
            SourceDetails::OffshoreLeaks { .. } => SourceKind::OffshoreLeaks,
        }
    }
}

/// A search hit from any source, normalized to the common superset of fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanctionedEntity {
    pub id: String,
    pub name: String,
    pub schema: EntitySchema,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    #[serde(default)]
    pub nationalities: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    pub is_sanctioned: bool,
    #[serde(default)]
    pub sanction_programs: Vec<SanctionProgram>,
    #[serde(default)]
    pub datasets: Vec<String>,
    /// 0-100, overwritten by the aggregator
    pub match_score: u8,
    #[serde(flatten)]
    pub details: SourceDetails,
}

impl SanctionedEntity {
    /// Minimal entity with empty optional fields; mostly useful for stubs
    pub fn new(id: impl Into<String>, name: impl Into<String>, details: SourceDetails) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema: EntitySchema::LegalEntity,
            aliases: Vec::new(),
            birth_date: None,
            death_date: None,
            nationalities: Vec::new(),
            countries: Vec::new(),
            is_sanctioned: false,
            sanction_programs: Vec::new(),
            datasets: Vec::new(),
            match_score: 0,
            details,
        }
    }

    pub fn source(&self) -> SourceKind {
        self.details.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_round_trips_through_str() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
        assert!("interpol".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_schema_from_label() {
        assert_eq!(EntitySchema::from_label("Individual"), EntitySchema::Person);
        assert_eq!(EntitySchema::from_label("Airplane"), EntitySchema::Aircraft);
        assert_eq!(EntitySchema::from_label("Address"), EntitySchema::LegalEntity);
    }

    #[test]
    fn test_entity_serializes_source_tag_flat() {
        let entity = SanctionedEntity::new(
            "NK-1",
            "Vladimir Putin",
            SourceDetails::OpenSanctions {
                url: "https://api.opensanctions.org/entities/NK-1".to_string(),
                first_seen: None,
                last_seen: None,
            },
        );

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["source"], "opensanctions");
        assert_eq!(json["url"], "https://api.opensanctions.org/entities/NK-1");
        assert_eq!(json["schema"], "LegalEntity");

        let back: SanctionedEntity = serde_json::from_value(json).unwrap();
        assert_eq!(back.source(), SourceKind::OpenSanctions);
    }
}
