//! Story Weaver server.
//!
//! Entry point for the story continuation chat application.

use std::sync::Arc;

use mimalloc::MiMalloc;
use tracing::error;

use story_weaver::config::AppConfig;
use story_weaver::{server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before anything reads the environment
    let _ = dotenvy::dotenv();

    telemetry::init();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(name: "config.invalid", error = %e, "Configuration error");
            return Err(e.into());
        }
    };

    server::start_server(config).await
}
