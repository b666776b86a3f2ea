use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::generation::build_generator;
use crate::session::LastResponseSlot;
use crate::store::providers::PostgresStore;
use crate::store::{HistoryLog, SimilarityStore};
use crate::turn::TurnHandler;
use crate::ui;

/// Stand-in for "no timeout" that keeps the middleware stack uniform.
const EFFECTIVELY_FOREVER: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Wire collaborators from configuration into the shared state.
pub fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let store = Arc::new(PostgresStore::new(&config.persistence));
    if store.is_available() {
        info!(
            name: "store.configured",
            embedding_model = %store.embedding_model(),
            "Fragment store configured"
        );
    } else {
        warn!(
            name: "store.unavailable",
            "Fragment store unavailable; turns will run without retrieval or history"
        );
    }
    let similarity: Arc<dyn SimilarityStore> = store.clone();
    let history: Arc<dyn HistoryLog> = store;

    let settings = config.generation.to_settings()?;
    info!(
        name: "generation.config.loaded",
        backend = ?settings.backend,
        base_url = %settings.base_url,
        model = %settings.model,
        "Generation configuration loaded"
    );
    let generator = build_generator(&settings)?;

    let turns = TurnHandler::new(similarity, history, generator)
        .with_fallback_response(config.generation.fallback_response.clone())
        .with_empty_response(config.generation.empty_response.clone())
        .with_generation_timeout(config.resilience.request_timeout())
        .with_serialized_turns(config.session.serialize_turns);

    Ok(AppState {
        turns: Arc::new(turns),
        memory: Arc::new(LastResponseSlot::new()),
        config,
    })
}

/// Build the router over an existing state.
///
/// The 408 timeout layer covers every route except `/chat`, whose turn
/// bounds its own generation call and always answers 200.
pub fn router(state: AppState) -> Router {
    let timeout = state
        .config
        .resilience
        .request_timeout()
        .unwrap_or(EFFECTIVELY_FOREVER);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route_layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => {
                        warn!(name: "request.timeout", "Request timed out");
                        (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                    }
                }
            },
        ))
        .route("/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(build_state(config)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body posted by the chat page.
#[derive(Debug, Deserialize)]
struct ChatForm {
    /// User query.
    query: String,
}

/// GET / - Chat page.
async fn index_handler() -> Html<String> {
    Html(ui::chat_page())
}

/// POST /chat - Run one turn and return the rendered message blocks.
async fn chat_handler(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Html<String> {
    info!(
        name: "chat.request",
        query_len = form.query.len(),
        "Received chat request"
    );

    let turn = state
        .turns
        .handle_turn(&form.query, state.memory.as_ref())
        .await;

    Html(ui::render_turn(&turn))
}

/// GET /health - Liveness probe.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
