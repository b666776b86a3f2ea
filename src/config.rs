use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::generation::{Backend, GenerationSettings};
use crate::turn::{DEFAULT_EMPTY_RESPONSE, DEFAULT_FALLBACK_RESPONSE};

/// Environment prefix for layered settings, e.g. `STORY_SERVER__PORT=8000`.
const ENV_PREFIX: &str = "STORY";

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Postgres connection string for the fragment stores and history log
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Generation model name
    #[arg(long)]
    pub model: Option<String>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub persistence: PersistenceConfig,
    pub generation: GenerationConfig,
    pub session: SessionConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    pub database_url: String,
    /// Model passed to `ai.openai_embed`; must match the one used to fill the tables.
    pub embedding_model: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct GenerationConfig {
    /// `auto`, `ollama` or `chat`.
    pub backend: String,
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    pub fallback_response: String,
    /// Shown when the service replies without any text.
    pub empty_response: String,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("fallback_response", &self.fallback_response)
            .field("empty_response", &self.empty_response)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Run one turn at a time so the previous-response slot is read and
    /// written consistently.
    pub serialize_turns: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
    /// Budget for one request. `/chat` spends it on the generation call and
    /// answers with the fallback on expiry; other routes answer 408.
    pub request_timeout_secs: u64,
}

impl ResilienceConfig {
    /// Per-request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (!self.timeout_disabled).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl GenerationConfig {
    /// Resolve into the settings consumed by the generation backends.
    pub fn to_settings(&self) -> Result<GenerationSettings, ConfigError> {
        let backend = self
            .backend
            .parse::<Backend>()
            .map_err(|reason| ConfigError::Invalid {
                field: "generation.backend",
                reason,
            })?;

        Ok(GenerationSettings {
            backend,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layering, lowest to highest priority: defaults, config file,
    /// `STORY_`-prefixed environment, CLI flags (and their env aliases).
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)
            .map_err(|e| ConfigError::Load(config::ConfigError::Message(e.to_string())))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("persistence.database_url", "")?
            .set_default("persistence.embedding_model", "text-embedding-3-small")?
            .set_default("persistence.max_connections", 5)?
            .set_default("persistence.acquire_timeout_secs", 30)?
            .set_default("generation.backend", "ollama")?
            .set_default("generation.base_url", "http://localhost:11434")?
            .set_default("generation.model", "llama3.2")?
            .set_default("generation.fallback_response", DEFAULT_FALLBACK_RESPONSE)?
            .set_default("generation.empty_response", DEFAULT_EMPTY_RESPONSE)?
            .set_default("session.serialize_turns", true)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_secs", 120)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.database_url {
            builder = builder.set_override("persistence.database_url", url)?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("generation.model", model)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that cannot serve a single turn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("persistence.database_url"));
        }
        if self.persistence.embedding_model.trim().is_empty() {
            return Err(ConfigError::Missing("persistence.embedding_model"));
        }
        if self.generation.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("generation.base_url"));
        }
        if self.generation.model.trim().is_empty() {
            return Err(ConfigError::Missing("generation.model"));
        }
        if self.persistence.max_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "persistence.max_connections",
                reason: "must be at least 1".to_string(),
            });
        }
        self.generation.to_settings()?;
        Ok(())
    }
}
