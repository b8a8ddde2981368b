//! Query Translation Module
//!
//! Shape classification, the vocabulary mapping table, deterministic
//! templates, and the instruction set handed to the model when no template
//! applies.

pub mod extract;
pub mod prompt;
pub mod shape;
pub mod template;
pub mod vocabulary;

pub use extract::{extract_query, with_prefixes};
pub use shape::{classify, Classification, QueryShape, ShapeBasis};
pub use template::TemplateQuery;
pub use vocabulary::{
    CityIntent, EntityRef, Identifier, MappingRule, Namespace, Resolution, RuleContext,
    StructuralPattern, Target, TermMatch, VocabularyTable,
};

use serde::{Deserialize, Serialize};

/// Where a query's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    Template,
    Model,
}

/// The single query executed for a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub text: String,
    pub source: QuerySource,
}
