//! Agent Module
//!
//! Text-completion backends that turn an instruction block and a question
//! into SPARQL text.

mod provider;

pub use provider::{provider_from_config, GeminiProvider, LLMProvider, OllamaProvider, OpenAICompatibleProvider};
