//! Persistence seams for the feed services.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PostCursor;
use crate::domain::posts::Post;

/// Failure of the backing post store.
///
/// Unavailability is transient: nothing is cached for a failed fetch, so the
/// next read retries cleanly.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("post store unavailable: {0}")]
    Unavailable(String),
    #[error("post store query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn unavailable(detail: impl std::fmt::Display) -> Self {
        Self::Unavailable(detail.to_string())
    }
}

/// Durable, creation-time-ordered list of posts.
///
/// `list_newest` returns up to `limit` rows in feed order (`created_at DESC,
/// id DESC`), restricted to rows strictly past `before` when a cursor is
/// given. Implementations must not return partial results on failure.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn list_newest(
        &self,
        limit: u32,
        before: Option<PostCursor>,
    ) -> Result<Vec<Post>, StoreError>;
}
