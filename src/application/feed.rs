//! Paginated feed queries.

use tracing::debug;

use crate::application::pagination::PostCursor;
use crate::application::repos::{PostStore, StoreError};
use crate::config::EngineConfig;
use crate::domain::posts::PostPage;

/// Server-side pagination resolver for the post feed.
///
/// Defines the cursor contract the client cache honors: bounded pages in feed
/// order, with `has_more` discovered by probing one row past the limit.
pub struct PostFeedService<S> {
    store: S,
    max_page_limit: u32,
}

impl<S: PostStore> PostFeedService<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            max_page_limit: config.max_page_limit,
        }
    }

    /// Fetch one page of the feed.
    ///
    /// `limit` is clamped to the configured maximum regardless of the
    /// requested value. The store is asked for `limit + 1` rows; a full probe
    /// means more data exists past this page, and the extra row is dropped
    /// from the returned page.
    pub async fn list_posts(
        &self,
        limit: u32,
        cursor: Option<PostCursor>,
    ) -> Result<PostPage, StoreError> {
        let real_limit = limit.min(self.max_page_limit);
        // Saturate so a host configuring the cap at u32::MAX cannot panic the
        // probe; at that point the extra row is moot anyway.
        let probe_limit = real_limit.saturating_add(1);

        let mut posts = self.store.list_newest(probe_limit, cursor).await?;
        let has_more = posts.len() == probe_limit as usize;
        posts.truncate(real_limit as usize);

        debug!(
            limit = real_limit,
            cursor = cursor.map(|c| c.as_millis()),
            returned = posts.len(),
            has_more,
            "Listed feed page"
        );

        Ok(PostPage { posts, has_more })
    }
}
