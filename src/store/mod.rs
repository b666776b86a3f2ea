//! Similarity store and history log contracts.
//!
//! Both are external collaborators. Implementations report failures as
//! [`StoreError`]; callers decide how to degrade.

use async_trait::async_trait;

use crate::domain::{Fragment, FragmentKind};
use crate::error::StoreError;

pub mod providers;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Nearest-neighbour lookup over embedded text fragments.
#[async_trait]
pub trait SimilarityStore: Send + Sync + std::fmt::Debug {
    /// Embed `query_text` with the model that populated the store and return
    /// the single closest fragment of `kind`, or `None` if the collection is
    /// empty.
    async fn find_nearest(
        &self,
        query_text: &str,
        kind: FragmentKind,
    ) -> StoreResult<Option<Fragment>>;
}

/// Append-only log of completed turns.
#[async_trait]
pub trait HistoryLog: Send + Sync + std::fmt::Debug {
    async fn append(&self, user_query: &str, response: &str) -> StoreResult<()>;
}
