//! Error types for the question-answering pipeline.

use thiserror::Error;

/// Errors raised while turning a question into an answer.
///
/// None of these are fatal to the process: the pipeline folds each one into a
/// terminal [`crate::sparql::Answer`] and the question loop carries on.
#[derive(Error, Debug)]
pub enum QaError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("No fenced SPARQL block in model response")]
    Extraction,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("No applicable mapping for: {}", .0.join(", "))]
    Ungrounded(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type QaResult<T> = std::result::Result<T, QaError>;
