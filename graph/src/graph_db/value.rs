use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Store-native value as returned by a graph query, temporal types included
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<StoreValue>),
    Map(HashMap<String, StoreValue>),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    LocalDateTime(NaiveDateTime),
    /// Temporal or spatial value the store rendered as text
    Other(String),
}

impl StoreValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StoreValue::Integer(v) => Some(*v),
            StoreValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StoreValue::Float(v) => Some(*v),
            StoreValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StoreValue]> {
        match self {
            StoreValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, StoreValue>> {
        match self {
            StoreValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StoreValue::Null)
    }

    /// Text form of scalars; temporal values become ISO-8601
    pub fn to_text(&self) -> Option<String> {
        match self {
            StoreValue::String(s) => Some(s.clone()),
            StoreValue::Integer(v) => Some(v.to_string()),
            StoreValue::Float(v) => Some(v.to_string()),
            StoreValue::Bool(v) => Some(v.to_string()),
            StoreValue::Date(_)
            | StoreValue::DateTime(_)
            | StoreValue::LocalDateTime(_)
            | StoreValue::Other(_) => self.to_json().as_str().map(str::to_string),
            StoreValue::Null | StoreValue::List(_) | StoreValue::Map(_) => None,
        }
    }

    /// JSON-safe conversion. Temporal values become ISO-8601 strings at any depth.
    pub fn to_json(&self) -> Value {
        match self {
            StoreValue::Null => Value::Null,
            StoreValue::Bool(v) => Value::Bool(*v),
            StoreValue::Integer(v) => Value::Number((*v).into()),
            StoreValue::Float(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
            StoreValue::String(s) => Value::String(s.clone()),
            StoreValue::List(items) => Value::Array(items.iter().map(StoreValue::to_json).collect()),
            StoreValue::Map(map) => Value::Object(map_to_json(map)),
            StoreValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            StoreValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            StoreValue::LocalDateTime(dt) => {
                Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            StoreValue::Other(s) => Value::String(s.clone()),
        }
    }
}

/// Property bag to JSON object
pub fn map_to_json(map: &HashMap<String, StoreValue>) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

impl From<i64> for StoreValue {
    fn from(v: i64) -> Self {
        StoreValue::Integer(v)
    }
}

impl From<u32> for StoreValue {
    fn from(v: u32) -> Self {
        StoreValue::Integer(i64::from(v))
    }
}

impl From<&str> for StoreValue {
    fn from(v: &str) -> Self {
        StoreValue::String(v.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(v: String) -> Self {
        StoreValue::String(v)
    }
}

/// One result row, column name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRecord {
    columns: HashMap<String, StoreValue>,
}

impl StoreRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: StoreValue) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: StoreValue) {
        self.columns.insert(column.into(), value);
    }

    /// Missing columns read as `Null`
    pub fn get(&self, column: &str) -> &StoreValue {
        self.columns.get(column).unwrap_or(&StoreValue::Null)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).to_text().filter(|s| !s.is_empty())
    }
}

/// Cypher text with parameters and the columns it projects
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    pub cypher: String,
    pub params: Vec<(String, StoreValue)>,
    pub columns: Vec<&'static str>,
}

impl GraphQuery {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<StoreValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn returns(mut self, columns: &[&'static str]) -> Self {
        self.columns.extend_from_slice(columns);
        self
    }

    pub fn param_value(&self, name: &str) -> Option<&StoreValue> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}
