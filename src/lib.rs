//! Story Weaver
//!
//! A small HTMX chat application that continues a story. Each turn retrieves
//! the nearest stored story fragment and the nearest past response, blends
//! them with the previous turn's response into a prompt, and asks a language
//! model to continue.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server rendering HTML fragments for HTMX
//! - **Stores**: Postgres + pgvector nearest-neighbour lookup and history log
//! - **Generation**: Ollama or `OpenAI`-compatible completion backends
//! - **Turn pipeline**: retrieval, prompt assembly, generation, persistence
//!
//! # Modules
//!
//! - [`config`]: Layered application configuration
//! - [`domain`]: Fragments and turns
//! - [`generation`]: Generation backends
//! - [`prompt`]: Prompt assembly
//! - [`session`]: Previous-response memory
//! - [`store`]: Similarity store and history log
//! - [`turn`]: The per-request pipeline

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod domain;
pub mod error;
pub mod generation;
pub mod prompt;
pub mod server;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod turn;
pub mod ui;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::session::SessionMemory;
use crate::turn::TurnHandler;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Turn pipeline.
    pub turns: Arc<TurnHandler>,
    /// Previous-response memory handed to every turn.
    pub memory: Arc<dyn SessionMemory>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
