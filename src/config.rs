//! Pipeline Configuration
//!
//! Everything the collaborators need (endpoint location, provider choice,
//! credentials) lives in one struct that is built up front and handed to the
//! pipeline. Values come from the process environment, optionally seeded from
//! a `.env` file by the binary.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{QaError, QaResult};

pub const DEFAULT_ENDPOINT: &str = "https://dbpedia.org/sparql";
pub const DEFAULT_GRAPH: &str = "http://dbpedia.org";

/// Which text-completion backend generates queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Gemini,
    Ollama,
    OpenAi,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-pro",
            ProviderKind::Ollama => "llama3.2:3b",
            ProviderKind::OpenAi => "gpt-4o-mini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = QaError;

    fn from_str(s: &str) -> QaResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" | "open_ai" | "openai_compatible" => Ok(ProviderKind::OpenAi),
            other => Err(QaError::Config(format!("unknown provider '{}'", other))),
        }
    }
}

/// Configuration for one question-answering session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    /// SPARQL endpoint URL
    pub endpoint: String,
    /// Value sent as `default-graph-uri`
    pub default_graph: String,
    /// Server-side execution limit passed as the `timeout` parameter (ms)
    pub server_timeout_ms: u64,
    pub provider: ProviderKind,
    pub model: String,
    pub max_output_tokens: u32,
    /// Credential for the Gemini provider
    pub google_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    /// Reject model queries that use dbo:/dbp: identifiers absent from the table
    pub strict_grounding: bool,
    /// Answer recognized question forms without calling the model
    pub use_templates: bool,
}

impl Default for QaConfig {
    fn default() -> Self {
        let provider = ProviderKind::Gemini;
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_graph: DEFAULT_GRAPH.to_string(),
            server_timeout_ms: 10_000,
            provider,
            model: provider.default_model().to_string(),
            max_output_tokens: 500,
            google_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            strict_grounding: false,
            use_templates: true,
        }
    }
}

impl QaConfig {
    /// Build a config from process environment variables
    pub fn from_env() -> QaResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> QaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SPARQL_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = get("SPARQL_DEFAULT_GRAPH") {
            config.default_graph = v;
        }
        if let Some(v) = get("SPARQL_SERVER_TIMEOUT_MS") {
            config.server_timeout_ms = parse_number("SPARQL_SERVER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("QA_PROVIDER") {
            config.provider = v.parse()?;
            config.model = config.provider.default_model().to_string();
        }
        if let Some(v) = get("QA_MODEL") {
            config.model = v;
        }
        if let Some(v) = get("QA_MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = parse_number("QA_MAX_OUTPUT_TOKENS", &v)?;
        }
        config.google_api_key = get("GOOGLE_API_KEY");
        if let Some(v) = get("OPENAI_BASE_URL") {
            config.openai_base_url = v;
        }
        config.openai_api_key = get("OPENAI_API_KEY");
        if let Some(v) = get("QA_STRICT_GROUNDING") {
            config.strict_grounding = parse_flag("QA_STRICT_GROUNDING", &v)?;
        }
        if let Some(v) = get("QA_TEMPLATES") {
            config.use_templates = parse_flag("QA_TEMPLATES", &v)?;
        }

        Ok(config)
    }

    pub fn with_strict_grounding(mut self, strict: bool) -> Self {
        self.strict_grounding = strict;
        self
    }

    pub fn with_templates(mut self, enabled: bool) -> Self {
        self.use_templates = enabled;
        self
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> QaResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| QaError::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> QaResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(QaError::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_public_endpoint() {
        let config = assert_ok!(QaConfig::from_lookup(lookup(&[])));
        assert_eq!(config.endpoint, "https://dbpedia.org/sparql");
        assert_eq!(config.default_graph, "http://dbpedia.org");
        assert_eq!(config.server_timeout_ms, 10_000);
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.max_output_tokens, 500);
        assert!(!config.strict_grounding);
        assert!(config.use_templates);
    }

    #[test]
    fn test_provider_switch_resets_model() {
        let config = QaConfig::from_lookup(lookup(&[("QA_PROVIDER", "ollama")])).unwrap();
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.model, "llama3.2:3b");

        let config = QaConfig::from_lookup(lookup(&[
            ("QA_PROVIDER", "ollama"),
            ("QA_MODEL", "qwen3:8b"),
        ]))
        .unwrap();
        assert_eq!(config.model, "qwen3:8b");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = assert_err!(QaConfig::from_lookup(lookup(&[("SPARQL_SERVER_TIMEOUT_MS", "soon")])));
        assert!(matches!(err, QaError::Config(_)));

        let err = assert_err!(QaConfig::from_lookup(lookup(&[("QA_STRICT_GROUNDING", "maybe")])));
        assert!(matches!(err, QaError::Config(_)));

        let err = assert_err!(QaConfig::from_lookup(lookup(&[("QA_PROVIDER", "bard")])));
        assert!(matches!(err, QaError::Config(_)));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = QaConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "  "), ("SPARQL_ENDPOINT", "")])).unwrap();
        assert!(config.google_api_key.is_none());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }
}
