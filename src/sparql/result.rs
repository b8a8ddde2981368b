//! Result Normalizer
//!
//! Turns the endpoint's SPARQL JSON result document into answer lines. Values
//! are taken by position (the first bound variable of each row), never by
//! variable name, because nothing guarantees what the query called its answer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

pub const NO_RESULT: &str = "No results found for the query.";
pub const GENERATION_FAILED: &str = "Failed to generate a valid SPARQL query.";

/// One bound value in a solution row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    fn from_json(json: &Value) -> Option<Self> {
        let value = match json.get("value")? {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        let text = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            kind: text("type").unwrap_or_else(|| "literal".to_string()),
            value,
            datatype: text("datatype"),
            lang: text("xml:lang"),
        })
    }
}

/// A solution row, variables in projection order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub bindings: Vec<(String, Term)>,
}

impl Row {
    fn from_json(row: &Map<String, Value>, vars: &[String]) -> Self {
        let mut bindings = Vec::new();
        let ordered = vars
            .iter()
            .filter(|v| row.contains_key(v.as_str()))
            .chain(row.keys().filter(|k| !vars.iter().any(|v| v == *k)));

        for name in ordered {
            if let Some(term) = row.get(name.as_str()).and_then(Term::from_json) {
                bindings.push((name.clone(), term));
            }
        }
        Self { bindings }
    }

    pub fn first_value(&self) -> Option<&str> {
        self.bindings.first().map(|(_, term)| term.value.as_str())
    }
}

/// What the endpoint handed back for one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultPayload {
    Boolean(bool),
    Bindings(Vec<Row>),
    Empty,
    TransportFailure(String),
}

impl ResultPayload {
    /// Classify a SPARQL JSON result document
    pub fn from_json(json: &Value) -> Self {
        if let Some(b) = json.get("boolean").and_then(Value::as_bool) {
            return ResultPayload::Boolean(b);
        }

        let vars: Vec<String> = json
            .pointer("/head/vars")
            .and_then(Value::as_array)
            .map(|vars| vars.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let rows: Vec<Row> = json
            .pointer("/results/bindings")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_object)
                    .map(|row| Row::from_json(row, &vars))
                    .collect()
            })
            .unwrap_or_default();

        if rows.is_empty() {
            ResultPayload::Empty
        } else {
            ResultPayload::Bindings(rows)
        }
    }

    pub fn from_transport(result: anyhow::Result<Value>) -> Self {
        match result {
            Ok(json) => Self::from_json(&json),
            Err(e) => ResultPayload::TransportFailure(format!("{:#}", e)),
        }
    }
}

/// The externally visible outcome of one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Boolean(bool),
    Values(Vec<String>),
    NoResult,
    GenerationFailed(String),
    QueryFailed(String),
    Ungrounded(Vec<String>),
}

impl Answer {
    /// One printable line per value, or a single status line
    pub fn lines(&self) -> Vec<String> {
        match self {
            Answer::Boolean(true) => vec!["TRUE".to_string()],
            Answer::Boolean(false) => vec!["FALSE".to_string()],
            Answer::Values(values) => values.clone(),
            Answer::NoResult => vec![NO_RESULT.to_string()],
            Answer::GenerationFailed(_) => vec![GENERATION_FAILED.to_string()],
            Answer::QueryFailed(reason) => vec![format!("SPARQL query failed: {}", reason)],
            Answer::Ungrounded(ids) => vec![format!("No applicable mapping for: {}", ids.join(", "))],
        }
    }

    /// Whether the lines carry data rather than a status message
    pub fn has_data(&self) -> bool {
        matches!(self, Answer::Boolean(_) | Answer::Values(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Map a payload to exactly one terminal answer
pub fn normalize(payload: ResultPayload) -> Answer {
    match payload {
        ResultPayload::Boolean(b) => Answer::Boolean(b),
        ResultPayload::Bindings(rows) => {
            let values: Vec<String> = rows
                .iter()
                .filter_map(|row| row.first_value())
                .map(str::to_string)
                .collect();
            debug!("Normalized {} rows into {} values", rows.len(), values.len());
            if values.is_empty() {
                Answer::NoResult
            } else {
                Answer::Values(values)
            }
        }
        ResultPayload::Empty => Answer::NoResult,
        ResultPayload::TransportFailure(reason) => Answer::QueryFailed(reason),
    }
}
