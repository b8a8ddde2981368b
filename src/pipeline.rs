//! Question-answering pipeline
//!
//! One cycle per question: classify, generate exactly one query (template or
//! model), execute it once, normalize the payload. Every failure ends the
//! cycle with a terminal [`Answer`]; nothing is retried.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::{provider_from_config, LLMProvider};
use crate::config::QaConfig;
use crate::error::{QaError, QaResult};
use crate::query::{
    classify, extract_query, prompt, template, with_prefixes, Classification, GeneratedQuery,
    QuerySource, VocabularyTable,
};
use crate::sparql::{normalize, Answer, GraphEndpoint, ResultPayload, SparqlClient};

/// Record of one processed question
#[derive(Debug, Clone, Serialize)]
pub struct Cycle {
    pub question: String,
    pub classification: Classification,
    pub query: Option<GeneratedQuery>,
    pub answer: Answer,
}

pub struct QaPipeline {
    config: QaConfig,
    provider: Arc<dyn LLMProvider>,
    endpoint: Arc<dyn GraphEndpoint>,
    table: &'static VocabularyTable,
    system_instruction: String,
}

impl QaPipeline {
    pub fn new(config: QaConfig, provider: Arc<dyn LLMProvider>, endpoint: Arc<dyn GraphEndpoint>) -> Self {
        let table = VocabularyTable::standard();
        Self {
            config,
            provider,
            endpoint,
            table,
            system_instruction: prompt::system_instruction(table),
        }
    }

    /// Wire the configured provider and the HTTP endpoint client
    pub fn from_config(config: QaConfig) -> Result<Self> {
        let provider: Arc<dyn LLMProvider> = Arc::from(provider_from_config(&config)?);
        let endpoint: Arc<dyn GraphEndpoint> = Arc::new(SparqlClient::from_config(&config));
        Ok(Self::new(config, provider, endpoint))
    }

    pub fn with_table(mut self, table: &'static VocabularyTable) -> Self {
        self.table = table;
        self.system_instruction = prompt::system_instruction(table);
        self
    }

    /// Produce the single query for a question
    pub async fn generate(&self, question: &str, classification: &Classification) -> QaResult<GeneratedQuery> {
        if question.trim().is_empty() {
            return Err(QaError::EmptyQuestion);
        }

        if self.config.use_templates {
            if let Some(t) = template::render(question, self.table) {
                if t.shape != classification.shape {
                    debug!("Template shape {} differs from classified shape {}", t.shape, classification.shape);
                }
                return Ok(GeneratedQuery {
                    text: with_prefixes(&t.text),
                    source: QuerySource::Template,
                });
            }
        }

        let user = prompt::user_prompt(
            question,
            classification,
            &self.table.scan(question),
            &self.table.entities(question),
        );
        debug!("Generation prompt:\n{}", user);

        let response = self
            .provider
            .generate(&self.config.model, user, Some(self.system_instruction.clone()))
            .await
            .map_err(|e| QaError::Provider(format!("{:#}", e)))?;

        let text = extract_query(&response).ok_or_else(|| {
            debug!("Model response without a query block:\n{}", response);
            QaError::Extraction
        })?;

        if self.config.strict_grounding {
            self.table.check_grounding(&text)?;
        }

        Ok(GeneratedQuery {
            text: with_prefixes(&text),
            source: QuerySource::Model,
        })
    }

    /// Run one full cycle. Always yields a terminal answer.
    pub async fn ask(&self, question: &str) -> Cycle {
        let question = question.trim().to_string();
        let classification = classify(&question);
        info!("Classified as {} ({:?})", classification.shape, classification.basis);

        let query = match self.generate(&question, &classification).await {
            Ok(query) => query,
            Err(e) => {
                warn!("Query generation failed: {}", e);
                return Cycle {
                    question,
                    classification,
                    query: None,
                    answer: failure_answer(e),
                };
            }
        };
        info!("Generated SPARQL query ({:?}):\n{}", query.source, query.text);

        let payload = ResultPayload::from_transport(self.endpoint.query(&query.text).await);
        if let ResultPayload::TransportFailure(ref reason) = payload {
            warn!("SPARQL request failed: {}", reason);
        }

        Cycle {
            question,
            classification,
            query: Some(query),
            answer: normalize(payload),
        }
    }
}

fn failure_answer(error: QaError) -> Answer {
    match error {
        QaError::Ungrounded(ids) => Answer::Ungrounded(ids),
        other => Answer::GenerationFailed(other.to_string()),
    }
}
