//! Normalized cache storage.
//!
//! Single source of truth for all fetched and locally-mutated entity data,
//! addressed by [`FieldKey`]. Writes are field-level overwrites; no deep merge
//! or array concatenation happens at this layer. Entries persist for the
//! process lifetime (no eviction).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::{debug, trace};

use crate::cache::keys::{EntityKey, EntityTag, FieldArgs, FieldInfo, FieldKey};
use crate::cache::lock::{rw_read, rw_write};
use crate::cache::resolvers::{ReadContext, ReadResolver};
use crate::cache::updaters::{MutationResult, MutationUpdater};
use crate::domain::posts::{Post, PostPage};
use crate::domain::users::User;

const SOURCE: &str = "cache::store";

/// A page's stored shape: links into normalized post entities plus its
/// continuation flag. Pages are reconstructed fresh on every read, never
/// cached as entities themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub posts: Vec<EntityKey>,
    pub has_more: bool,
}

/// One stored field value.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// A plain scalar, including an explicit null.
    Scalar(Value),
    /// A link to one normalized entity.
    Link(EntityKey),
    /// A page value embedded under a pagination field key.
    Page(PageLinks),
}

/// Result of a cache read.
///
/// `partial` is a distinct state from value absence: a partial read carries
/// best-effort data but still requires a network fetch to complete; a miss
/// (`value == None`, `partial == false`) carries nothing.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub value: Option<CacheValue>,
    pub partial: bool,
}

impl ReadOutcome {
    pub fn miss() -> Self {
        Self {
            value: None,
            partial: false,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.value.is_none() && !self.partial
    }

    /// Whether a network fetch is still required for this read.
    pub fn needs_fetch(&self) -> bool {
        self.value.is_none() || self.partial
    }
}

/// Process-wide normalized cache.
///
/// Access is serialized by the caller's scheduler; the locks only defend the
/// invariants if that contract is violated, recovering rather than poisoning.
pub struct NormalizedCache {
    values: RwLock<HashMap<FieldKey, CacheValue>>,
    /// Per-entity record of every field invocation ever written, in insertion
    /// order. The order is load-bearing: the pagination merge walks it.
    field_index: RwLock<HashMap<EntityKey, Vec<(String, FieldArgs)>>>,
    resolvers: RwLock<HashMap<(EntityTag, String), Arc<dyn ReadResolver>>>,
    updaters: RwLock<HashMap<&'static str, Arc<dyn MutationUpdater>>>,
}

impl NormalizedCache {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            field_index: RwLock::new(HashMap::new()),
            resolvers: RwLock::new(HashMap::new()),
            updaters: RwLock::new(HashMap::new()),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Install a custom read strategy for every read of `(tag, field)`.
    pub fn register_read_resolver(
        &self,
        tag: EntityTag,
        field: impl Into<String>,
        resolver: Arc<dyn ReadResolver>,
    ) {
        rw_write(&self.resolvers, SOURCE, "register_read_resolver")
            .insert((tag, field.into()), resolver);
    }

    /// Install a hook invoked on a mutation's payload before any normal field
    /// update.
    pub fn register_mutation_updater(
        &self,
        mutation: &'static str,
        updater: Arc<dyn MutationUpdater>,
    ) {
        rw_write(&self.updaters, SOURCE, "register_mutation_updater").insert(mutation, updater);
    }

    // ========================================================================
    // Raw field storage
    // ========================================================================

    /// Overwrite the value under `key`. A second write to the same field key
    /// fully replaces the prior value.
    pub fn write_field(&self, key: FieldKey, value: CacheValue) {
        let mut values = rw_write(&self.values, SOURCE, "write_field.values");
        let is_new = !values.contains_key(&key);
        trace!(entity = ?key.entity, field = %key.field, args = %key.args, is_new, "Writing field");
        values.insert(key.clone(), value);
        drop(values);

        if is_new {
            rw_write(&self.field_index, SOURCE, "write_field.index")
                .entry(key.entity)
                .or_default()
                .push((key.field, key.args));
        }
    }

    /// Stored value lookup.
    pub fn resolve(&self, key: &FieldKey) -> Option<CacheValue> {
        rw_read(&self.values, SOURCE, "resolve").get(key).cloned()
    }

    /// Presence probe without pulling the value.
    pub fn contains(&self, key: &FieldKey) -> bool {
        rw_read(&self.values, SOURCE, "contains").contains_key(key)
    }

    /// Every field invocation ever recorded against `entity`, in the order it
    /// was first written.
    pub fn inspect_fields(&self, entity: &EntityKey) -> Vec<FieldInfo> {
        rw_read(&self.field_index, SOURCE, "inspect_fields")
            .get(entity)
            .map(|slots| {
                slots
                    .iter()
                    .map(|(field, args)| FieldInfo {
                        field: field.clone(),
                        key: FieldKey::new(*entity, field.clone(), args.clone()),
                        args: args.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read one field, dispatching to a registered resolver when one exists.
    ///
    /// The resolver runs without any cache lock held, so it is free to call
    /// back into `resolve`, `contains`, and `inspect_fields`.
    pub fn read_field(&self, entity: EntityKey, field: &str, args: &FieldArgs) -> ReadOutcome {
        let resolver = rw_read(&self.resolvers, SOURCE, "read_field.lookup")
            .get(&(entity.tag(), field.to_string()))
            .cloned();

        match resolver {
            Some(resolver) => {
                let ctx = ReadContext::new(self, entity, field, args);
                let value = resolver.resolve(&ctx);
                ReadOutcome {
                    value,
                    partial: ctx.partial(),
                }
            }
            None => ReadOutcome {
                value: self.resolve(&FieldKey::new(entity, field, args.clone())),
                partial: false,
            },
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Run the registered write-through updater for `result`, if any.
    pub fn apply_mutation(&self, result: &MutationResult) {
        let updater = rw_read(&self.updaters, SOURCE, "apply_mutation.lookup")
            .get(result.name())
            .cloned();

        match updater {
            Some(updater) => {
                debug!(mutation = result.name(), "Applying write-through updater");
                updater.apply(self, result);
            }
            None => trace!(mutation = result.name(), "No updater registered"),
        }
    }

    // ========================================================================
    // Normalization helpers
    // ========================================================================

    /// Normalize one post into its entity fields (field-level overwrite).
    pub fn write_post(&self, post: &Post) {
        let entity = EntityKey::Post(post.id);
        self.write_field(
            FieldKey::plain(entity, "title"),
            CacheValue::Scalar(json!(post.title)),
        );
        self.write_field(
            FieldKey::plain(entity, "text"),
            CacheValue::Scalar(json!(post.text)),
        );
        self.write_field(
            FieldKey::plain(entity, "creatorId"),
            CacheValue::Scalar(json!(post.creator_id)),
        );
        let millis = (post.created_at.unix_timestamp_nanos() / 1_000_000) as i64;
        self.write_field(
            FieldKey::plain(entity, "createdAt"),
            CacheValue::Scalar(json!(millis)),
        );
    }

    /// Reconstruct a post from its normalized fields, if all are present.
    pub fn read_post(&self, entity: EntityKey) -> Option<Post> {
        let EntityKey::Post(id) = entity else {
            return None;
        };
        let title = self.scalar_str(entity, "title")?;
        let text = self.scalar_str(entity, "text")?;
        let creator_id = self.scalar_i64(entity, "creatorId")?;
        let millis = self.scalar_i64(entity, "createdAt")?;
        let created_at =
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?;
        Some(Post {
            id,
            title,
            text,
            creator_id,
            created_at,
        })
    }

    /// Write one fetched page under the exact arguments that produced it,
    /// normalizing its posts.
    pub fn write_post_page(&self, args: FieldArgs, page: &PostPage) {
        let links: Vec<EntityKey> = page
            .posts
            .iter()
            .map(|post| {
                self.write_post(post);
                EntityKey::Post(post.id)
            })
            .collect();
        self.write_field(
            FieldKey::new(EntityKey::Query, "posts", args),
            CacheValue::Page(PageLinks {
                posts: links,
                has_more: page.has_more,
            }),
        );
    }

    /// Overwrite the singleton session entity. `None` stores an explicit
    /// null, distinct from the entity never having been written.
    pub fn write_session_user(&self, user: Option<&User>) {
        let value = match user {
            Some(user) => {
                let entity = EntityKey::User(user.id);
                self.write_field(
                    FieldKey::plain(entity, "username"),
                    CacheValue::Scalar(json!(user.username)),
                );
                CacheValue::Link(entity)
            }
            None => CacheValue::Scalar(Value::Null),
        };
        self.write_field(FieldKey::plain(EntityKey::Session, "user"), value);
    }

    /// Current session state: `None` when the session entity was never
    /// written, `Some(None)` when it holds an explicit null.
    pub fn session_user(&self) -> Option<Option<User>> {
        match self.resolve(&FieldKey::plain(EntityKey::Session, "user"))? {
            CacheValue::Scalar(Value::Null) => Some(None),
            CacheValue::Link(entity) => Some(self.read_user(entity)),
            _ => None,
        }
    }

    fn read_user(&self, entity: EntityKey) -> Option<User> {
        let EntityKey::User(id) = entity else {
            return None;
        };
        let username = self.scalar_str(entity, "username")?;
        Some(User { id, username })
    }

    fn scalar_str(&self, entity: EntityKey, field: &str) -> Option<String> {
        match self.resolve(&FieldKey::plain(entity, field))? {
            CacheValue::Scalar(Value::String(value)) => Some(value),
            _ => None,
        }
    }

    fn scalar_i64(&self, entity: EntityKey, field: &str) -> Option<i64> {
        match self.resolve(&FieldKey::plain(entity, field))? {
            CacheValue::Scalar(value) => value.as_i64(),
            _ => None,
        }
    }
}

impl Default for NormalizedCache {
    fn default() -> Self {
        Self::new()
    }
}
