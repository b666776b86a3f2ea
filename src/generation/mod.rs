//! Text generation backends.
//!
//! The [`Generator`] trait is the single seam between the turn pipeline and
//! the language model: one prompt in, one completion out, no streaming.
//!
//! # Backends
//!
//! - [`OllamaGenerator`]: Ollama native chat API (`/api/chat`)
//! - [`ChatCompletionsGenerator`]: `OpenAI`-compatible Chat Completions API
//!
//! # Example
//!
//! ```rust,ignore
//! use story_weaver::generation::{Backend, GenerationSettings, build_generator};
//!
//! let settings = GenerationSettings {
//!     backend: Backend::Ollama,
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//!     api_key: None,
//!     timeout: None,
//! };
//! let generator = build_generator(&settings)?;
//! let text = generator.generate("Once upon a time").await?;
//! ```

pub mod chat_completions;
pub mod ollama;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

pub use chat_completions::ChatCompletionsGenerator;
pub use ollama::OllamaGenerator;
pub use provider::Provider;

use crate::error::GenerationError;

/// Which wire protocol to speak to the generation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Detect from the base URL.
    Auto,
    /// Ollama `/api/chat`.
    #[default]
    Ollama,
    /// `OpenAI` Chat Completions.
    Chat,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "ollama" => Ok(Self::Ollama),
            "chat" | "openai" => Ok(Self::Chat),
            other => Err(format!("unknown generation backend '{other}'")),
        }
    }
}

/// Connection and model settings for the generation service.
#[derive(Clone)]
pub struct GenerationSettings {
    pub backend: Backend,
    /// Base URL without path (e.g. `http://localhost:11434`).
    pub base_url: String,
    pub model: String,
    /// Bearer token; only sent by the Chat Completions backend.
    pub api_key: Option<String>,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Opaque prompt-to-text completion service.
#[async_trait::async_trait]
pub trait Generator: Send + Sync + std::fmt::Debug {
    /// Generate a completion for a single user prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable, answers with a
    /// non-success status, or the body lacks the expected text field.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Build the HTTP client shared by the backends.
pub(crate) fn http_client(settings: &GenerationSettings) -> Result<reqwest::Client, GenerationError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Map a non-success response to [`GenerationError::Status`].
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GenerationError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Construct the generator selected by `settings.backend`.
pub fn build_generator(settings: &GenerationSettings) -> Result<Arc<dyn Generator>, GenerationError> {
    let backend = match settings.backend {
        Backend::Auto => match Provider::detect_from_url(&settings.base_url) {
            Provider::Ollama => Backend::Ollama,
            _ => Backend::Chat,
        },
        other => other,
    };

    let generator: Arc<dyn Generator> = match backend {
        Backend::Chat => Arc::new(ChatCompletionsGenerator::new(settings.clone())?),
        Backend::Ollama | Backend::Auto => Arc::new(OllamaGenerator::new(settings.clone())?),
    };
    Ok(generator)
}
