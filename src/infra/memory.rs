//! In-memory adapters: a post store, a user table, and an in-process
//! transport wiring the server-side resolver to the client pipeline.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::application::feed::PostFeedService;
use crate::application::pagination::{PostCursor, feed_ordering};
use crate::application::repos::{PostStore, StoreError};
use crate::client::{FeedTransport, Navigator, TransportError};
use crate::config::EngineConfig;
use crate::domain::posts::{Post, PostPage};
use crate::domain::users::{User, UserResponse};

/// In-memory [`PostStore`] kept in feed order.
///
/// Cloning shares the underlying rows, so a handle held outside a service can
/// keep inserting while the service reads.
#[derive(Clone, Default)]
pub struct MemoryPostStore {
    rows: Arc<RwLock<Vec<Post>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: Post) {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        rows.push(post);
        rows.sort_by(feed_ordering);
    }

    /// Simulate the store going down; reads fail with `StoreError` until
    /// cleared.
    pub fn set_unavailable(&self, down: bool) {
        *self.unavailable.write().unwrap_or_else(|e| e.into_inner()) = down;
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest id currently stored, 0 when empty.
    pub fn max_id(&self) -> i64 {
        self.rows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|post| post.id)
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list_newest(
        &self,
        limit: u32,
        before: Option<PostCursor>,
    ) -> Result<Vec<Post>, StoreError> {
        if *self.unavailable.read().unwrap_or_else(|e| e.into_inner()) {
            return Err(StoreError::unavailable("memory store marked down"));
        }
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .iter()
            .filter(|post| before.is_none_or(|cursor| cursor.admits(post)))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// In-process [`FeedTransport`]: the pagination resolver plus a user table
/// with field-level validation, no wire in between.
pub struct InProcTransport {
    feed: PostFeedService<MemoryPostStore>,
    store: MemoryPostStore,
    users: RwLock<Vec<(User, String)>>,
    session: RwLock<Option<i64>>,
    next_user_id: RwLock<i64>,
}

impl InProcTransport {
    pub fn new(store: MemoryPostStore, config: &EngineConfig) -> Self {
        Self {
            feed: PostFeedService::new(store.clone(), config),
            store,
            users: RwLock::new(Vec::new()),
            session: RwLock::new(None),
            next_user_id: RwLock::new(1),
        }
    }

    fn next_user_id(&self) -> i64 {
        let mut next = self.next_user_id.write().unwrap_or_else(|e| e.into_inner());
        let id = *next;
        *next += 1;
        id
    }

    fn session_user_id(&self) -> Option<i64> {
        *self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_session(&self, user_id: Option<i64>) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = user_id;
    }
}

#[async_trait]
impl FeedTransport for InProcTransport {
    async fn fetch_posts(
        &self,
        limit: u32,
        cursor: Option<PostCursor>,
    ) -> Result<PostPage, TransportError> {
        Ok(self.feed.list_posts(limit, cursor).await?)
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserResponse, TransportError> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        let Some((user, stored)) = users.iter().find(|(u, _)| u.username == username) else {
            return Ok(UserResponse::error(
                "username",
                "that username doesn't exist",
            ));
        };
        if stored != password {
            return Ok(UserResponse::error("password", "incorrect password"));
        }
        let user = user.clone();
        drop(users);
        self.set_session(Some(user.id));
        Ok(UserResponse::ok(user))
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserResponse, TransportError> {
        if username.chars().count() <= 2 {
            return Ok(UserResponse::error(
                "username",
                "length must be greater than 2",
            ));
        }
        if password.chars().count() <= 2 {
            return Ok(UserResponse::error(
                "password",
                "length must be greater than 2",
            ));
        }
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.iter().any(|(u, _)| u.username == username) {
            return Ok(UserResponse::error("username", "username already taken"));
        }
        let user = User {
            id: self.next_user_id(),
            username: username.to_string(),
        };
        users.push((user.clone(), password.to_string()));
        drop(users);
        self.set_session(Some(user.id));
        Ok(UserResponse::ok(user))
    }

    async fn logout(&self) -> Result<bool, TransportError> {
        self.set_session(None);
        Ok(true)
    }

    async fn me(&self) -> Result<Option<User>, TransportError> {
        let Some(user_id) = self.session_user_id() else {
            return Ok(None);
        };
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone()))
    }

    async fn create_post(&self, title: &str, text: &str) -> Result<Post, TransportError> {
        let Some(creator_id) = self.session_user_id() else {
            return Err(TransportError::operation("not authenticated"));
        };
        let post = Post {
            id: self.store.max_id() + 1,
            title: title.to_string(),
            text: text.to_string(),
            creator_id,
            created_at: time::OffsetDateTime::now_utc(),
        };
        self.store.insert(post.clone());
        Ok(post)
    }
}

/// Test navigator that records every redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(route.to_string());
    }
}

impl Navigator for Arc<RecordingNavigator> {
    fn replace(&self, route: &str) {
        self.as_ref().replace(route);
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn post(id: i64, millis: i64) -> Post {
        Post {
            id,
            title: format!("post {id}"),
            text: format!("body {id}"),
            creator_id: 1,
            created_at: OffsetDateTime::from_unix_timestamp_nanos(
                i128::from(millis) * 1_000_000,
            )
            .expect("valid timestamp"),
        }
    }

    #[tokio::test]
    async fn store_keeps_feed_order_on_insert() {
        let store = MemoryPostStore::new();
        store.insert(post(1, 90));
        store.insert(post(2, 100));
        store.insert(post(3, 90));

        let rows = store.list_newest(10, None).await.expect("rows");
        let ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn register_enforces_field_validation() {
        let transport = InProcTransport::new(MemoryPostStore::new(), &EngineConfig::default());

        let short_name = transport.register("ab", "secret").await.expect("payload");
        assert!(short_name.is_error());

        let short_pass = transport.register("ada", "xy").await.expect("payload");
        assert!(short_pass.is_error());

        let ok = transport.register("ada", "secret").await.expect("payload");
        assert_eq!(ok.user.as_ref().map(|u| u.username.as_str()), Some("ada"));

        let taken = transport.register("ada", "secret").await.expect("payload");
        assert_eq!(
            taken.errors.as_ref().and_then(|e| e.first()).map(|e| e.message.as_str()),
            Some("username already taken")
        );
    }

    #[tokio::test]
    async fn create_post_requires_a_session() {
        let transport = InProcTransport::new(MemoryPostStore::new(), &EngineConfig::default());

        let err = transport
            .create_post("t", "x")
            .await
            .expect_err("no session");
        assert!(err.to_string().contains("not authenticated"));

        transport.register("ada", "secret").await.expect("payload");
        let created = transport.create_post("t", "x").await.expect("post");
        assert_eq!(created.creator_id, 1);
    }
}
