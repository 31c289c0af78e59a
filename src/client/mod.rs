//! Client-side feed pipeline.
//!
//! [`FeedClient`] serves paged reads out of the normalized cache, falls
//! through to the transport on a miss or partial hit, writes responses back
//! under the exact arguments that produced them, and runs write-through
//! updaters on mutation payloads. A cross-cutting observer scans every failed
//! operation for the authentication marker and redirects, without retrying.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::pagination::PostCursor;
use crate::application::repos::StoreError;
use crate::cache::{
    ArgValue, CacheValue, CursorPaginationResolver, EntityKey, EntityTag, FieldArgs,
    MutationResult, NormalizedCache, PageLinks, register_session_updaters,
};
use crate::config::EngineConfig;
use crate::domain::posts::{Post, PostPage};
use crate::domain::users::{User, UserResponse};

/// Failure of a network operation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Operation(String),
}

impl TransportError {
    pub fn operation(detail: impl Into<String>) -> Self {
        Self::Operation(detail.into())
    }
}

/// Failure surfaced to the UI layer.
///
/// Mutation validation errors are data inside payloads, never a
/// `ClientError`; only unrecoverable network and store failures land here.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Network seam of the client.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch_posts(
        &self,
        limit: u32,
        cursor: Option<PostCursor>,
    ) -> Result<PostPage, TransportError>;

    async fn login(&self, username: &str, password: &str) -> Result<UserResponse, TransportError>;

    async fn register(&self, username: &str, password: &str)
    -> Result<UserResponse, TransportError>;

    async fn logout(&self) -> Result<bool, TransportError>;

    async fn me(&self) -> Result<Option<User>, TransportError>;

    async fn create_post(&self, title: &str, text: &str) -> Result<Post, TransportError>;
}

/// Navigation seam for the auth-failure redirect.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: &str);
}

/// Merged, best-effort view of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub posts: Vec<Post>,
    pub has_more: bool,
    /// True when a network fetch is still required to complete this view.
    pub partial: bool,
}

/// Read-through feed client over a [`NormalizedCache`].
pub struct FeedClient<T, N> {
    cache: Arc<NormalizedCache>,
    transport: T,
    navigator: N,
    config: EngineConfig,
}

impl<T: FeedTransport, N: Navigator> FeedClient<T, N> {
    /// Build a client with the stock resolver and session updaters installed.
    pub fn new(transport: T, navigator: N, config: EngineConfig) -> Self {
        let cache = Arc::new(NormalizedCache::new());
        cache.register_read_resolver(
            EntityTag::Query,
            "posts",
            Arc::new(CursorPaginationResolver),
        );
        register_session_updaters(&cache);
        Self {
            cache,
            transport,
            navigator,
            config,
        }
    }

    pub fn cache(&self) -> &NormalizedCache {
        &self.cache
    }

    /// Field arguments identifying one page request. Both cursor components
    /// are always present so canonicalization never depends on the request
    /// shape.
    fn posts_args(limit: u32, cursor: Option<PostCursor>) -> FieldArgs {
        FieldArgs::new([
            ("limit", ArgValue::Int(i64::from(limit))),
            (
                "cursor",
                cursor
                    .map(|c| ArgValue::Int(c.as_millis()))
                    .unwrap_or(ArgValue::Null),
            ),
            (
                "cursorId",
                cursor
                    .and_then(|c| c.id)
                    .map(ArgValue::Int)
                    .unwrap_or(ArgValue::Null),
            ),
        ])
    }

    fn view_from(&self, links: PageLinks, partial: bool) -> FeedView {
        let posts = links
            .posts
            .into_iter()
            .filter_map(|entity| self.cache.read_post(entity))
            .collect();
        FeedView {
            posts,
            has_more: links.has_more,
            partial,
        }
    }

    /// Best-effort cached view, never touching the network. `None` on a full
    /// miss.
    pub fn posts_cached(&self, limit: u32, cursor: Option<PostCursor>) -> Option<FeedView> {
        let args = Self::posts_args(limit, cursor);
        let outcome = self.cache.read_field(EntityKey::Query, "posts", &args);
        match outcome.value {
            Some(CacheValue::Page(links)) => Some(self.view_from(links, outcome.partial)),
            _ => None,
        }
    }

    /// Read one page of the feed, fetching over the transport when the cache
    /// misses or reports a partial hit.
    ///
    /// The response is written under the exact request arguments, then the
    /// merged view is recomputed. A store failure caches nothing, so the next
    /// read retries cleanly.
    pub async fn posts(
        &self,
        limit: u32,
        cursor: Option<PostCursor>,
    ) -> Result<FeedView, ClientError> {
        let args = Self::posts_args(limit, cursor);
        let outcome = self.cache.read_field(EntityKey::Query, "posts", &args);

        if outcome.needs_fetch() {
            debug!(
                limit,
                cursor = cursor.map(|c| c.as_millis()),
                partial = outcome.partial,
                "Cache cannot satisfy page, fetching"
            );
            match self.transport.fetch_posts(limit, cursor).await {
                Ok(page) => self.cache.write_post_page(args.clone(), &page),
                Err(err) => {
                    self.observe(&err);
                    return Err(err.into());
                }
            }
        }

        let outcome = self.cache.read_field(EntityKey::Query, "posts", &args);
        match outcome.value {
            Some(CacheValue::Page(links)) => Ok(self.view_from(links, outcome.partial)),
            // Unreachable after a successful write; an empty page still
            // records a field key.
            _ => Ok(FeedView {
                posts: Vec::new(),
                has_more: false,
                partial: false,
            }),
        }
    }

    /// Derived snippet of a post's body, per the configured length.
    pub fn snippet(&self, post: &Post) -> String {
        post.text_snippet(self.config.snippet_len)
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserResponse, ClientError> {
        let response = self
            .transport
            .login(username, password)
            .await
            .inspect_err(|err| self.observe(err))?;
        self.cache
            .apply_mutation(&MutationResult::Login(response.clone()));
        Ok(response)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserResponse, ClientError> {
        let response = self
            .transport
            .register(username, password)
            .await
            .inspect_err(|err| self.observe(err))?;
        self.cache
            .apply_mutation(&MutationResult::Register(response.clone()));
        Ok(response)
    }

    pub async fn logout(&self) -> Result<bool, ClientError> {
        let done = self
            .transport
            .logout()
            .await
            .inspect_err(|err| self.observe(err))?;
        self.cache.apply_mutation(&MutationResult::Logout(done));
        Ok(done)
    }

    /// Resolve the current user, normalizing the response into the session
    /// entity.
    pub async fn me(&self) -> Result<Option<User>, ClientError> {
        if let Some(cached) = self.cache.session_user() {
            return Ok(cached);
        }
        let user = self
            .transport
            .me()
            .await
            .inspect_err(|err| self.observe(err))?;
        self.cache.write_session_user(user.as_ref());
        Ok(user)
    }

    /// Current session state straight from the cache, no network.
    pub fn session_user(&self) -> Option<Option<User>> {
        self.cache.session_user()
    }

    pub async fn create_post(&self, title: &str, text: &str) -> Result<Post, ClientError> {
        let post = self
            .transport
            .create_post(title, text)
            .await
            .inspect_err(|err| self.observe(err))?;
        // The new post is normalized but deliberately joins no cached page;
        // the feed only grows through pagination fetches.
        self.cache.write_post(&post);
        Ok(post)
    }

    /// Auth-failure observer: pure side effect on every completed operation's
    /// error, never a retry.
    fn observe(&self, err: &TransportError) {
        if err.to_string().contains(&self.config.auth_error_marker) {
            warn!(route = %self.config.login_route, "Operation failed as unauthenticated, redirecting");
            self.navigator.replace(&self.config.login_route);
        }
    }
}
