//! Domain model shared by the server resolver and the client cache.

pub mod posts;
pub mod users;

pub use posts::{Post, PostPage};
pub use users::{FieldError, User, UserResponse};
