//! Post entities and page values.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

/// Wire snippet length. The feed view never requests raw `text` beyond this.
const WIRE_SNIPPET_LEN: usize = 50;

/// A stored post, ordered in the feed by `created_at` (newest first).
///
/// On the wire, `created_at` crosses as epoch milliseconds and a derived
/// `textSnippet` is emitted alongside the raw body; the snippet is computed at
/// serialization time and never persisted, so it is ignored on the way back
/// in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub creator_id: i64,
    pub created_at: OffsetDateTime,
}

impl Post {
    /// Derived snippet projection: the first `len` characters of `text`.
    pub fn text_snippet(&self, len: usize) -> String {
        self.text.chars().take(len).collect()
    }

    fn created_at_millis(&self) -> i64 {
        (self.created_at.unix_timestamp_nanos() / 1_000_000) as i64
    }
}

impl Serialize for Post {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Post", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("text", &self.text)?;
        state.serialize_field("textSnippet", &self.text_snippet(WIRE_SNIPPET_LEN))?;
        state.serialize_field("creatorId", &self.creator_id)?;
        state.serialize_field("createdAt", &self.created_at_millis())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Post {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            id: i64,
            title: String,
            text: String,
            #[serde(rename = "creatorId")]
            creator_id: i64,
            #[serde(rename = "createdAt", with = "time::serde::timestamp::milliseconds")]
            created_at: OffsetDateTime,
        }

        let wire = Wire::deserialize(deserializer)?;
        Ok(Self {
            id: wire.id,
            title: wire.title,
            text: wire.text,
            creator_id: wire.creator_id,
            created_at: wire.created_at,
        })
    }
}

/// One bounded fetch of the feed plus its continuation flag.
///
/// A page is a value, not an entity: it carries no identity and is never
/// separately cached, so two pages can never alias each other's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl PostPage {
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            has_more: false,
        }
    }
}
