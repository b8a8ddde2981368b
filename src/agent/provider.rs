use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::{ProviderKind, QaConfig};

/// Text-completion capability used to turn instructions plus a question into query text
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String>;
}

pub struct OllamaProvider {
    client: ollama_rs::Ollama,
    max_tokens: u32,
}

impl OllamaProvider {
    pub fn new(client: ollama_rs::Ollama, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    fn options(&self) -> ollama_rs::models::ModelOptions {
        ollama_rs::models::ModelOptions::default()
            .temperature(0.0)
            .num_predict(i32::try_from(self.max_tokens).unwrap_or(i32::MAX))
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};

        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(ChatMessage::system(sys));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatMessageRequest::new(model.to_string(), messages).options(self.options());
        let res = self.client.send_chat_messages(request).await?;

        Ok(res.message.content)
    }
}

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            max_tokens,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({ "role": "system", "content": sys }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        // Query generation wants the most literal rendering of the rules
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": 0.0,
            "max_tokens": self.max_tokens,
        });

        let mut request = self.client.post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .json(&body);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?.error_for_status()?;
        let json: Value = res.json().await?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to parse content from OpenAI response")?;

        Ok(content.to_string())
    }
}

/// Google Generative Language API (`generateContent`)
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    max_output_tokens: u32,
}

impl GeminiProvider {
    pub fn new(api_key: String, max_output_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key,
            max_output_tokens,
        }
    }

    fn request_body(&self, prompt: String, system: Option<String>) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "maxOutputTokens": self.max_output_tokens },
        });
        if let Some(sys) = system {
            body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
        }
        body
    }

    fn response_text(json: &Value) -> Result<String> {
        let parts = json["candidates"][0]["content"]["parts"]
            .as_array()
            .context("Failed to parse candidates from Gemini response")?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect();

        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );

        let res = self.client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt, system))
            .send()
            .await?
            .error_for_status()?;

        let json: Value = res.json().await?;
        Self::response_text(&json)
    }
}

/// Construct the provider selected in the config
pub fn provider_from_config(config: &QaConfig) -> Result<Box<dyn LLMProvider>> {
    match config.provider {
        ProviderKind::Gemini => {
            let key = config
                .google_api_key
                .clone()
                .context("GOOGLE_API_KEY is required for the gemini provider")?;
            Ok(Box::new(GeminiProvider::new(key, config.max_output_tokens)))
        }
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(
            ollama_rs::Ollama::default(),
            config.max_output_tokens,
        ))),
        ProviderKind::OpenAi => Ok(Box::new(OpenAICompatibleProvider::new(
            config.openai_base_url.clone(),
            config.openai_api_key.clone(),
            config.max_output_tokens,
        ))),
    }
}
