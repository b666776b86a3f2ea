//! Test doubles for the turn pipeline collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use story_weaver::AppState;
use story_weaver::config::{
    AppConfig, GenerationConfig, PersistenceConfig, ResilienceConfig, ServerConfig, SessionConfig,
};
use story_weaver::domain::{Fragment, FragmentKind, Turn};
use story_weaver::error::{GenerationError, StoreError};
use story_weaver::generation::Generator;
use story_weaver::session::LastResponseSlot;
use story_weaver::store::{HistoryLog, SimilarityStore, StoreResult};
use story_weaver::turn::{DEFAULT_EMPTY_RESPONSE, DEFAULT_FALLBACK_RESPONSE, TurnHandler};

/// Similarity store returning a fixed fragment per kind, or failing.
#[derive(Debug, Default)]
pub struct FixedStore {
    fragments: HashMap<FragmentKind, Fragment>,
    fail: bool,
    pub lookups: Mutex<Vec<(String, FragmentKind)>>,
}

impl FixedStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, kind: FragmentKind, fragment: Fragment) -> Self {
        self.fragments.insert(kind, fragment);
        self
    }
}

#[async_trait]
impl SimilarityStore for FixedStore {
    async fn find_nearest(
        &self,
        query_text: &str,
        kind: FragmentKind,
    ) -> StoreResult<Option<Fragment>> {
        self.lookups
            .lock()
            .unwrap()
            .push((query_text.to_string(), kind));
        if self.fail {
            return Err(StoreError::Unavailable);
        }
        Ok(self.fragments.get(&kind).cloned())
    }
}

/// History log that records appends in memory, or rejects them.
#[derive(Debug, Default)]
pub struct RecordingLog {
    pub turns: Mutex<Vec<Turn>>,
    fail: bool,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<Turn> {
        self.turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryLog for RecordingLog {
    async fn append(&self, user_query: &str, response: &str) -> StoreResult<()> {
        if self.fail {
            return Err(StoreError::Decode("history table missing".to_string()));
        }
        self.turns
            .lock()
            .unwrap()
            .push(Turn::new(user_query, response));
        Ok(())
    }
}

/// Generator replaying scripted responses and capturing prompts.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<Vec<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Responses are consumed in order; `Err` simulates a service failure.
    pub fn new(responses: Vec<Result<&str, &str>>) -> Self {
        let mut responses: Vec<Result<String, String>> = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(GenerationError::MalformedResponse(reason)),
            None => Err(GenerationError::MalformedResponse("script exhausted".to_string())),
        }
    }
}

/// Generator that answers only after a delay.
#[derive(Debug)]
pub struct SlowGenerator {
    delay: Duration,
    reply: String,
}

impl SlowGenerator {
    pub fn new(delay: Duration, reply: &str) -> Self {
        Self {
            delay,
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl Generator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

/// Generator whose service replies without any text.
#[derive(Debug, Default)]
pub struct SilentGenerator;

#[async_trait]
impl Generator for SilentGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::EmptyResponse)
    }
}

pub fn story_fragment() -> Fragment {
    Fragment::new("1", "A dragon flew over the village.")
}

pub fn history_fragment() -> Fragment {
    Fragment::new("2", "The village was rebuilt.")
}

pub fn handler(
    store: Arc<FixedStore>,
    log: Arc<RecordingLog>,
    generator: Arc<ScriptedGenerator>,
) -> TurnHandler {
    TurnHandler::new(store, log, generator)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        persistence: PersistenceConfig {
            database_url: "postgres://localhost/story".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        generation: GenerationConfig {
            backend: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            timeout_secs: Some(5),
            fallback_response: DEFAULT_FALLBACK_RESPONSE.to_string(),
            empty_response: DEFAULT_EMPTY_RESPONSE.to_string(),
        },
        session: SessionConfig {
            serialize_turns: true,
        },
        resilience: ResilienceConfig {
            timeout_disabled: false,
            request_timeout_secs: 30,
        },
    }
}

pub fn app_state(turns: TurnHandler) -> AppState {
    AppState {
        turns: Arc::new(turns),
        memory: Arc::new(LastResponseSlot::new()),
        config: Arc::new(test_config()),
    }
}
