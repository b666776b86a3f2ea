use std::time::Duration;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use crate::config::PersistenceConfig;
use crate::domain::{Fragment, FragmentKind};
use crate::error::StoreError;
use crate::store::{HistoryLog, SimilarityStore, StoreResult};

/// Postgres + pgvector backed store.
///
/// Query text is embedded inside the database with `ai.openai_embed`, so the
/// application never handles raw query vectors. The pool is created lazily:
/// an unreachable server surfaces as a per-call error, never at startup.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Option<PgPool>,
    embedding_model: String,
}

impl PostgresStore {
    /// Build a store from configuration.
    ///
    /// An empty or unparseable connection string produces a store in the
    /// unavailable state rather than an error.
    pub fn new(config: &PersistenceConfig) -> Self {
        if config.database_url.trim().is_empty() {
            warn!(name: "store.connect.missing", "No database url configured; store disabled");
            return Self::unavailable(&config.embedding_model);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.database_url);

        match pool {
            Ok(pool) => Self {
                pool: Some(pool),
                embedding_model: config.embedding_model.clone(),
            },
            Err(e) => {
                warn!(
                    name: "store.connect.invalid",
                    error = %e,
                    "Invalid database connection string; store disabled"
                );
                Self::unavailable(&config.embedding_model)
            }
        }
    }

    /// A store that fails every call with [`StoreError::Unavailable`].
    pub fn unavailable(embedding_model: &str) -> Self {
        Self {
            pool: None,
            embedding_model: embedding_model.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn pool(&self) -> StoreResult<&PgPool> {
        self.pool.as_ref().ok_or(StoreError::Unavailable)
    }
}

/// Nearest-neighbour SQL for one collection.
///
/// `$1` is the embedding model name, `$2` the raw query text.
fn nearest_query(kind: FragmentKind) -> &'static str {
    match kind {
        FragmentKind::Story => {
            r#"
            SELECT id::text AS id, fragment AS text, embedding
            FROM story_embeddings
            ORDER BY embedding <=> ai.openai_embed($1, $2)
            LIMIT 1
            "#
        }
        FragmentKind::History => {
            r#"
            SELECT id::text AS id, ollama_response AS text, embedding
            FROM history_embeddings
            ORDER BY embedding <=> ai.openai_embed($1, $2)
            LIMIT 1
            "#
        }
    }
}

#[async_trait]
impl SimilarityStore for PostgresStore {
    async fn find_nearest(
        &self,
        query_text: &str,
        kind: FragmentKind,
    ) -> StoreResult<Option<Fragment>> {
        let pool = self.pool()?;

        let row = sqlx::query(nearest_query(kind))
            .bind(&self.embedding_model) // $1
            .bind(query_text) // $2
            .fetch_optional(pool)
            .await?;

        let Some(row) = row else {
            debug!(kind = %kind, "No fragment stored");
            return Ok(None);
        };

        let id: String = row.try_get("id")?;
        let text: Option<String> = row.try_get("text")?;
        let text = text.ok_or_else(|| StoreError::Decode(format!("{kind} fragment {id} has no text")))?;
        let embedding: Option<Vector> = row.try_get("embedding")?;

        debug!(kind = %kind, fragment_id = %id, "Nearest fragment found");

        Ok(Some(
            Fragment::new(id, text).with_embedding(embedding.map(|v| v.to_vec()).unwrap_or_default()),
        ))
    }
}

#[async_trait]
impl HistoryLog for PostgresStore {
    async fn append(&self, user_query: &str, response: &str) -> StoreResult<()> {
        let pool = self.pool()?;

        sqlx::query("INSERT INTO history (user_query, ollama_response) VALUES ($1, $2)")
            .bind(user_query)
            .bind(response)
            .execute(pool)
            .await?;

        Ok(())
    }
}
