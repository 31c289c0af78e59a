//! Server-side feed services and the persistence seams they depend on.

pub mod feed;
pub mod pagination;
pub mod repos;

pub use feed::PostFeedService;
pub use pagination::PostCursor;
pub use repos::{PostStore, StoreError};
