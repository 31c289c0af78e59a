//! Keyset cursor for the post feed.
//!
//! The feed is ordered `created_at DESC, id DESC`. A cursor names a position
//! in that order; a page fetch returns rows strictly past it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::posts::Post;

/// Exclusive keyset cursor into the feed.
///
/// A cursor built from a fetched row carries the row's id, so two posts that
/// share a `created_at` can never be skipped or duplicated across pages. The
/// plain epoch-millis wire form carries no id and keeps the original strict
/// `created_at <` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCursor {
    #[serde(rename = "createdAt", with = "time::serde::timestamp::milliseconds")]
    pub created_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl PostCursor {
    /// Cursor from a raw epoch-millis timestamp, the original wire shape.
    pub fn from_millis(millis: i64) -> Self {
        Self {
            created_at: OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
            id: None,
        }
    }

    /// Tie-safe cursor pointing just past `post` in feed order.
    pub fn after(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            id: Some(post.id),
        }
    }

    /// Epoch-millis form for wire contracts that only carry the timestamp.
    pub fn as_millis(&self) -> i64 {
        (self.created_at.unix_timestamp_nanos() / 1_000_000) as i64
    }

    /// Whether `post` lies strictly past this cursor in feed order.
    ///
    /// Without an id the predicate is the plain exclusive timestamp filter;
    /// with one, equal timestamps fall back to the id tie-break.
    pub fn admits(&self, post: &Post) -> bool {
        match post.created_at.cmp(&self.created_at) {
            Ordering::Less => true,
            Ordering::Equal => match self.id {
                Some(id) => post.id < id,
                None => false,
            },
            Ordering::Greater => false,
        }
    }
}

/// Total feed order: `created_at DESC, id DESC`.
///
/// The id runs the same direction as the primary key so the cursor predicate
/// and the sort agree.
pub fn feed_ordering(a: &Post, b: &Post) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}
