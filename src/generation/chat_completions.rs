//! `OpenAI` Chat Completions API backend.
//!
//! Non-streaming variant: posts the prompt as one user message and reads
//! `choices[0].message.content` from the response.

use tracing::debug;

use super::{GenerationSettings, Generator, Provider, check_status, http_client};
use crate::error::GenerationError;

/// Generator for `/v1/chat/completions` (or the Azure deployment URL).
#[derive(Clone)]
pub struct ChatCompletionsGenerator {
    http: reqwest::Client,
    settings: GenerationSettings,
    provider: Provider,
    url: String,
}

impl std::fmt::Debug for ChatCompletionsGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsGenerator")
            .field("url", &self.url)
            .field("provider", &self.provider)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsGenerator {
    pub fn new(settings: GenerationSettings) -> Result<Self, GenerationError> {
        let provider = match Provider::detect_from_url(&settings.base_url) {
            // Azure routes by deployment; default the deployment to the model name.
            Provider::AzureOpenAI {
                deployment_name,
                api_version,
            } if deployment_name.is_empty() => Provider::AzureOpenAI {
                deployment_name: settings.model.clone(),
                api_version,
            },
            // An Ollama host reached through this backend uses its OpenAI-compatible route.
            Provider::Ollama => Provider::Generic,
            other => other,
        };
        let url = provider.build_chat_url(&settings.base_url);

        Ok(Self {
            http: http_client(&settings)?,
            settings,
            provider,
            url,
        })
    }
}

#[async_trait::async_trait]
impl Generator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(url = %self.url, model = %self.settings.model, "Calling chat completions");

        let mut rb = self.http.post(&self.url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = match self.provider {
                Provider::AzureOpenAI { .. } => rb.header("api-key", k),
                _ => rb.bearer_auth(k),
            };
        }

        let resp = check_status(rb.send().await?).await?;
        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        v["choices"][0]["message"]["content"]
            .as_str()
            .map(ToString::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }
}
