//! Ollama native chat API backend.
//!
//! Sends the prompt as a single user message to `/api/chat` with streaming
//! disabled and reads the reply from `message.content`. A reply without that
//! field is [`GenerationError::EmptyResponse`].

use tracing::debug;

use super::{GenerationSettings, Generator, Provider, check_status, http_client};
use crate::error::GenerationError;

/// Generator for an Ollama server.
#[derive(Clone)]
pub struct OllamaGenerator {
    http: reqwest::Client,
    settings: GenerationSettings,
    url: String,
}

impl std::fmt::Debug for OllamaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaGenerator")
            .field("url", &self.url)
            .field("model", &self.settings.model)
            .finish()
    }
}

impl OllamaGenerator {
    pub fn new(settings: GenerationSettings) -> Result<Self, GenerationError> {
        let url = Provider::Ollama.build_chat_url(&settings.base_url);
        Ok(Self {
            http: http_client(&settings)?,
            settings,
            url,
        })
    }
}

#[async_trait::async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(url = %self.url, model = %self.settings.model, "Calling Ollama");

        let resp = self.http.post(&self.url).json(&body).send().await?;
        let resp = check_status(resp).await?;
        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        v.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(ToString::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}
