//! Provider detection and endpoint URLs.
//!
//! The generation service may be a local Ollama daemon or any
//! `OpenAI`-compatible endpoint. The few differences that matter here are
//! the request path and, for Azure, the deployment-based URL.

/// Default Ollama API port.
const OLLAMA_PORT: &str = ":11434";

/// Known generation providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Ollama (native `/api/chat`)
    Ollama,
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name (required for Azure)
        deployment_name: String,
        /// API version (e.g., "2024-08-01-preview")
        api_version: String,
    },
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let provider = Provider::detect_from_url("http://localhost:11434");
    /// assert_eq!(provider, Provider::Ollama);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains(OLLAMA_PORT) || lower.contains("ollama") {
            Self::Ollama
        } else if lower.contains("openai.azure.com") {
            Self::AzureOpenAI {
                deployment_name: String::new(),
                api_version: "2024-08-01-preview".to_string(),
            }
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Build the chat endpoint URL for this provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL (trailing slash tolerated)
    #[must_use]
    pub fn build_chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::Ollama => format!("{base}/api/chat"),
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => {
                format!(
                    "{base}/openai/deployments/{deployment_name}/chat/completions?api-version={api_version}"
                )
            }
            Self::OpenAI | Self::Generic => format!("{base}/v1/chat/completions"),
        }
    }
}
