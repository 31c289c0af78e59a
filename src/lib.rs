//! Driftfeed: normalized query cache and keyset pagination for growing feeds.
//!
//! The crate has two halves that share one cursor contract:
//!
//! - **Server side** (`application`): a keyset pagination resolver over a
//!   pluggable [`application::repos::PostStore`], producing bounded pages with
//!   a `has_more` continuation flag.
//! - **Client side** (`cache`, `client`): a normalized in-memory cache that
//!   stitches pages fetched under distinct cursor arguments into one ordered
//!   feed, distinguishes cache miss from partial hit, and patches the session
//!   entity straight from mutation payloads.
//!
//! `infra` supplies in-memory adapters and telemetry installation so the whole
//! pipeline can run in one process.

pub mod application;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod infra;

pub use cache::{
    ArgValue, CacheValue, CursorPaginationResolver, EntityKey, EntityTag, FieldArgs, FieldInfo,
    FieldKey, MutationResult, MutationUpdater, NormalizedCache, PageLinks, ReadContext,
    ReadOutcome, ReadResolver,
};
pub use client::{ClientError, FeedClient, FeedTransport, FeedView, Navigator, TransportError};
pub use config::EngineConfig;
