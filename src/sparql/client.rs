//! SPARQL endpoint client
//!
//! Sends a query as a GET parameter to a public SPARQL endpoint and returns
//! the JSON result document. No authentication, no client-side timeout; the
//! endpoint gets a server-side execution limit instead.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::QaConfig;

pub const RESULT_FORMAT: &str = "application/sparql-results+json";

/// Executes query text against a graph store
#[async_trait]
pub trait GraphEndpoint: Send + Sync {
    async fn query(&self, sparql: &str) -> Result<Value>;
}

pub struct SparqlClient {
    client: Client,
    endpoint: String,
    default_graph: String,
    server_timeout_ms: u64,
}

impl SparqlClient {
    pub fn new(endpoint: impl Into<String>, default_graph: impl Into<String>, server_timeout_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("graph_qa/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            default_graph: default_graph.into(),
            server_timeout_ms,
        }
    }

    pub fn from_config(config: &QaConfig) -> Self {
        Self::new(&config.endpoint, &config.default_graph, config.server_timeout_ms)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn params(&self, sparql: &str) -> Vec<(&'static str, String)> {
        vec![
            ("default-graph-uri", self.default_graph.clone()),
            ("query", sparql.to_string()),
            ("format", RESULT_FORMAT.to_string()),
            ("timeout", self.server_timeout_ms.to_string()),
        ]
    }
}

#[async_trait]
impl GraphEndpoint for SparqlClient {
    async fn query(&self, sparql: &str) -> Result<Value> {
        debug!("Querying {}:\n{}", self.endpoint, sparql);

        let response = self.client
            .get(&self.endpoint)
            .query(&self.params(sparql))
            .header(ACCEPT, RESULT_FORMAT)
            .send()
            .await
            .context("Failed to send SPARQL request")?
            .error_for_status()
            .context("SPARQL endpoint returned an error status")?;

        let body: Value = response
            .json()
            .await
            .context("SPARQL endpoint returned a non-JSON body")?;

        Ok(body)
    }
}
