//! Custom read strategies.
//!
//! A [`ReadResolver`] is invoked on every read of the field it is registered
//! against, instead of the stored value being returned directly. The one
//! shipped here, [`CursorPaginationResolver`], merges every cached fetch of
//! `Query.posts` into a single logical feed.

use std::cell::Cell;

use tracing::trace;

use crate::cache::keys::{EntityKey, FieldArgs, FieldKey};
use crate::cache::store::{CacheValue, NormalizedCache, PageLinks};

/// Per-read context handed to a resolver.
///
/// `mark_partial` is how a resolver tells the caller that the returned value
/// is incomplete and a network fetch is still required; the flag, not value
/// presence, drives the refetch decision.
pub struct ReadContext<'a> {
    cache: &'a NormalizedCache,
    entity: EntityKey,
    field: &'a str,
    args: &'a FieldArgs,
    partial: Cell<bool>,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(
        cache: &'a NormalizedCache,
        entity: EntityKey,
        field: &'a str,
        args: &'a FieldArgs,
    ) -> Self {
        Self {
            cache,
            entity,
            field,
            args,
            partial: Cell::new(false),
        }
    }

    pub fn cache(&self) -> &NormalizedCache {
        self.cache
    }

    pub fn entity(&self) -> EntityKey {
        self.entity
    }

    pub fn field(&self) -> &str {
        self.field
    }

    pub fn args(&self) -> &FieldArgs {
        self.args
    }

    pub fn mark_partial(&self, flag: bool) {
        self.partial.set(flag);
    }

    pub fn partial(&self) -> bool {
        self.partial.get()
    }
}

/// A read strategy registered against one `(entity type, field)` pair.
pub trait ReadResolver: Send + Sync {
    fn resolve(&self, ctx: &ReadContext<'_>) -> Option<CacheValue>;
}

/// Merges all cached fetches of a pagination field into one feed.
///
/// Precondition: field keys were recorded in append (increasing-cursor)
/// order. Out-of-order fetches would interleave the merge incorrectly; that
/// discipline is the caller's to keep, not defended against here.
pub struct CursorPaginationResolver;

impl ReadResolver for CursorPaginationResolver {
    fn resolve(&self, ctx: &ReadContext<'_>) -> Option<CacheValue> {
        let cache = ctx.cache();
        let recorded: Vec<FieldKey> = cache
            .inspect_fields(&ctx.entity())
            .into_iter()
            .filter(|info| info.field == ctx.field())
            .map(|info| info.key)
            .collect();

        // Nothing recorded at all: full miss, let the caller fetch page one.
        if recorded.is_empty() {
            return None;
        }

        // The exact requested page may not be cached yet; still assemble what
        // exists so already-fetched pages stay renderable while it loads.
        let exact_key = FieldKey::new(ctx.entity(), ctx.field(), ctx.args().clone());
        ctx.mark_partial(!cache.contains(&exact_key));

        let mut merged = Vec::new();
        let mut has_more = true;
        for key in &recorded {
            let Some(CacheValue::Page(page)) = cache.resolve(key) else {
                continue;
            };
            merged.extend(page.posts);
            // Last writer wins: the most recently fetched page knows whether
            // the feed continues.
            has_more = page.has_more;
        }

        trace!(
            pages = recorded.len(),
            merged = merged.len(),
            has_more,
            partial = ctx.partial(),
            "Merged cached feed pages"
        );

        Some(CacheValue::Page(PageLinks {
            posts: merged,
            has_more,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::OffsetDateTime;

    use super::*;
    use crate::cache::keys::{ArgValue, EntityTag};
    use crate::domain::posts::{Post, PostPage};

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

    fn posts_args(limit: i64, cursor: Option<i64>) -> FieldArgs {
        FieldArgs::new([
            ("limit", ArgValue::Int(limit)),
            (
                "cursor",
                cursor.map(ArgValue::Int).unwrap_or(ArgValue::Null),
            ),
        ])
    }

    fn cache_with_resolver() -> NormalizedCache {
        let cache = NormalizedCache::new();
        cache.register_read_resolver(EntityTag::Query, "posts", Arc::new(CursorPaginationResolver));
        cache
    }

    fn page(ids: &[i64], start_millis: i64, has_more: bool) -> PostPage {
        PostPage {
            posts: ids
                .iter()
                .enumerate()
                .map(|(i, id)| post(*id, start_millis - i as i64))
                .collect(),
            has_more,
        }
    }

    #[test]
    fn empty_cache_reports_a_full_miss() {
        let cache = cache_with_resolver();
        let outcome = cache.read_field(EntityKey::Query, "posts", &posts_args(10, None));
        assert!(outcome.is_miss());
    }

    #[test]
    fn merges_pages_in_fetch_order_with_last_has_more() {
        let cache = cache_with_resolver();
        cache.write_post_page(posts_args(10, None), &page(&(1..=10).collect::<Vec<_>>(), 1000, true));
        cache.write_post_page(
            posts_args(10, Some(991)),
            &page(&(11..=20).collect::<Vec<_>>(), 990, true),
        );
        cache.write_post_page(
            posts_args(10, Some(981)),
            &page(&(21..=25).collect::<Vec<_>>(), 980, false),
        );

        let outcome = cache.read_field(EntityKey::Query, "posts", &posts_args(10, Some(981)));
        let Some(CacheValue::Page(links)) = outcome.value else {
            panic!("expected merged page");
        };
        assert_eq!(links.posts.len(), 25);
        assert_eq!(links.posts[0], EntityKey::Post(1));
        assert_eq!(links.posts[24], EntityKey::Post(25));
        assert!(!links.has_more);
        assert!(!outcome.partial);
    }

    #[test]
    fn unseen_arguments_yield_partial_with_earlier_pages() {
        let cache = cache_with_resolver();
        cache.write_post_page(posts_args(10, None), &page(&[1, 2, 3], 1000, true));

        let outcome = cache.read_field(EntityKey::Query, "posts", &posts_args(10, Some(900)));
        assert!(outcome.partial);
        assert!(outcome.needs_fetch());
        let Some(CacheValue::Page(links)) = outcome.value else {
            panic!("expected best-effort page");
        };
        assert_eq!(links.posts.len(), 3);
    }

    #[test]
    fn exact_hit_is_complete() {
        let cache = cache_with_resolver();
        cache.write_post_page(posts_args(10, None), &page(&[1, 2], 1000, false));

        let outcome = cache.read_field(EntityKey::Query, "posts", &posts_args(10, None));
        assert!(!outcome.partial);
        assert!(!outcome.needs_fetch());
    }

    #[test]
    fn refetched_page_replaces_not_appends() {
        let cache = cache_with_resolver();
        cache.write_post_page(posts_args(10, None), &page(&[1, 2], 1000, true));
        cache.write_post_page(posts_args(10, None), &page(&[1, 2], 1000, false));

        let outcome = cache.read_field(EntityKey::Query, "posts", &posts_args(10, None));
        let Some(CacheValue::Page(links)) = outcome.value else {
            panic!("expected merged page");
        };
        assert_eq!(links.posts.len(), 2);
        assert!(!links.has_more);
    }
}
