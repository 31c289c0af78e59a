//! Normalized client-side cache.
//!
//! Entity data is addressed by typed composite keys:
//!
//! - [`EntityKey`] names one cacheable object, independent of how it was
//!   fetched.
//! - [`FieldKey`] names one invocation of one field with one argument set;
//!   successive pagination fetches of the same field live under distinct
//!   field keys, which is what the cursor merge walks.
//!
//! Custom read strategies ([`ReadResolver`]) and post-mutation hooks
//! ([`MutationUpdater`]) are registered against the cache in explicit tables
//! rather than as ambient closures.

mod keys;
mod lock;
mod resolvers;
mod store;
mod updaters;

pub use keys::{ArgValue, EntityKey, EntityTag, FieldArgs, FieldInfo, FieldKey};
pub use resolvers::{CursorPaginationResolver, ReadContext, ReadResolver};
pub use store::{CacheValue, NormalizedCache, PageLinks, ReadOutcome};
pub use updaters::{
    MutationResult, MutationUpdater, SessionLoginUpdater, SessionLogoutUpdater,
    register_session_updaters,
};
