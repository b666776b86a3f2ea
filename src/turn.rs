//! The per-request turn pipeline.
//!
//! One turn is strictly sequential: history lookup, story lookup, prompt
//! assembly, generation, history append, memory update. Every collaborator
//! failure degrades to its fallback value and the turn always completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::{Fragment, FragmentKind, Turn};
use crate::error::GenerationError;
use crate::generation::Generator;
use crate::prompt;
use crate::session::SessionMemory;
use crate::store::{HistoryLog, SimilarityStore};

/// Shown to the user (and logged as the response) when generation fails.
pub const DEFAULT_FALLBACK_RESPONSE: &str = "There was an error processing your request.";

/// Shown when the generation service answers without any text.
pub const DEFAULT_EMPTY_RESPONSE: &str = "No response received from Ollama.";

/// Orchestrates retrieval, generation and persistence for one query.
pub struct TurnHandler {
    similarity: Arc<dyn SimilarityStore>,
    history: Arc<dyn HistoryLog>,
    generator: Arc<dyn Generator>,
    fallback_response: String,
    empty_response: String,
    generation_timeout: Option<Duration>,
    /// Held across a whole turn when turns are serialized.
    gate: Option<Mutex<()>>,
}

impl std::fmt::Debug for TurnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnHandler")
            .field("similarity", &self.similarity)
            .field("history", &self.history)
            .field("generator", &self.generator)
            .field("fallback_response", &self.fallback_response)
            .field("empty_response", &self.empty_response)
            .field("generation_timeout", &self.generation_timeout)
            .field("serialized", &self.gate.is_some())
            .finish()
    }
}

impl TurnHandler {
    pub fn new(
        similarity: Arc<dyn SimilarityStore>,
        history: Arc<dyn HistoryLog>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            similarity,
            history,
            generator,
            fallback_response: DEFAULT_FALLBACK_RESPONSE.to_string(),
            empty_response: DEFAULT_EMPTY_RESPONSE.to_string(),
            generation_timeout: None,
            gate: Some(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn with_fallback_response(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_response = fallback.into();
        self
    }

    #[must_use]
    pub fn with_empty_response(mut self, text: impl Into<String>) -> Self {
        self.empty_response = text.into();
        self
    }

    /// Bound the generation call. On expiry the turn completes with the
    /// fallback response and is still recorded.
    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Serialize turns (default) or let them run concurrently.
    ///
    /// Concurrent turns may read a stale previous response and overwrite
    /// each other's memory update.
    #[must_use]
    pub fn with_serialized_turns(mut self, serialized: bool) -> Self {
        self.gate = serialized.then(|| Mutex::new(()));
        self
    }

    pub fn fallback_response(&self) -> &str {
        &self.fallback_response
    }

    /// Run one turn and return the query with its response.
    pub async fn handle_turn(&self, user_query: &str, memory: &dyn SessionMemory) -> Turn {
        let _guard = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let history = self.nearest(user_query, FragmentKind::History).await;
        let story = self.nearest(user_query, FragmentKind::Story).await;

        let last_response = memory.get();
        let prompt = prompt::assemble(
            user_query,
            story.as_ref(),
            history.as_ref(),
            last_response.as_deref(),
        );

        let response = match self.generate(&prompt).await {
            Ok(text) => text,
            Err(GenerationError::EmptyResponse) => {
                warn!(name: "generation.empty", "Generation returned no content");
                self.empty_response.clone()
            }
            Err(e) => {
                warn!(name: "generation.failed", error = %e, "Generation failed; using fallback");
                self.fallback_response.clone()
            }
        };

        if let Err(e) = self.history.append(user_query, &response).await {
            warn!(name: "history.append.failed", error = %e, "Could not record turn");
        }

        memory.set(response.clone());

        info!(
            name: "turn.completed",
            story_fragment = ?story.as_ref().map(|f| f.id.as_str()),
            history_fragment = ?history.as_ref().map(|f| f.id.as_str()),
            had_previous = last_response.is_some(),
            prompt_len = prompt.len(),
            "Turn completed"
        );

        Turn::new(user_query, response)
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.generator.generate(prompt))
                .await
                .map_err(|_| GenerationError::Timeout(limit))?,
            None => self.generator.generate(prompt).await,
        }
    }

    /// Nearest fragment, with any store failure treated as "not found".
    async fn nearest(&self, user_query: &str, kind: FragmentKind) -> Option<Fragment> {
        match self.similarity.find_nearest(user_query, kind).await {
            Ok(found) => found,
            Err(e) => {
                warn!(name: "store.lookup.failed", kind = %kind, error = %e, "Fragment lookup failed");
                None
            }
        }
    }
}
