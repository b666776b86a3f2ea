//! Error types for the external collaborators.
//!
//! None of these ever reach the end user: the turn handler maps each one to
//! its fallback value (absent fragment, dropped write, fallback response).

use std::time::Duration;

use thiserror::Error;

/// Failure talking to the similarity store or the history log.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No usable connection (missing or unparseable connection string).
    #[error("store unavailable")]
    Unavailable,

    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("could not decode row: {0}")]
    Decode(String),
}

/// Failure calling the generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),

    /// Well-formed reply without any generated text.
    #[error("generation service returned no content")]
    EmptyResponse,

    #[error("generation did not finish within {0:?}")]
    Timeout(Duration),
}
