//! Knowledge-Graph Question Answering
//!
//! Answers natural-language questions about DBpedia:
//! - Query shape classification (ASK / SELECT / COUNT / list)
//! - Typed vocabulary table mapping terms to dbr:/dbo:/dbp: identifiers
//! - Deterministic templates with a text-completion fallback
//! - SPARQL endpoint transport and result normalization

pub mod agent;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod sparql;
pub mod utils;

// Re-exports for convenience
pub use agent::LLMProvider;
pub use config::QaConfig;
pub use error::{QaError, QaResult};
pub use pipeline::{Cycle, QaPipeline};
pub use query::{classify, QueryShape, VocabularyTable};
pub use sparql::{Answer, GraphEndpoint, SparqlClient};
