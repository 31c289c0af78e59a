//! Mutation write-through updaters.
//!
//! After an auth mutation's payload arrives, these hooks patch the singleton
//! session entity directly, so the current user never needs a refetch. They
//! never touch pagination field keys: a created post only enters the feed
//! through a later pagination fetch.

use tracing::debug;

use crate::cache::store::NormalizedCache;
use crate::domain::users::UserResponse;

/// One completed mutation's payload, tagged by mutation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult {
    Login(UserResponse),
    Register(UserResponse),
    Logout(bool),
}

impl MutationResult {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
            Self::Logout(_) => "logout",
        }
    }
}

/// A hook invoked after a mutation response is received, before normal field
/// updates.
pub trait MutationUpdater: Send + Sync {
    fn apply(&self, cache: &NormalizedCache, result: &MutationResult);
}

/// Write-through for `login` and `register`.
///
/// A payload carrying field errors leaves the session untouched: a failed
/// attempt must not clobber a possibly-already-logged-in session.
pub struct SessionLoginUpdater;

impl MutationUpdater for SessionLoginUpdater {
    fn apply(&self, cache: &NormalizedCache, result: &MutationResult) {
        let response = match result {
            MutationResult::Login(response) | MutationResult::Register(response) => response,
            MutationResult::Logout(_) => return,
        };
        if response.is_error() {
            debug!(mutation = result.name(), "Payload carries errors, session untouched");
            return;
        }
        cache.write_session_user(response.user.as_ref());
    }
}

/// Write-through for `logout`: unconditionally clears the session.
pub struct SessionLogoutUpdater;

impl MutationUpdater for SessionLogoutUpdater {
    fn apply(&self, cache: &NormalizedCache, _result: &MutationResult) {
        cache.write_session_user(None);
    }
}

/// Register the stock session updaters under their mutation names.
pub fn register_session_updaters(cache: &NormalizedCache) {
    use std::sync::Arc;

    let login = Arc::new(SessionLoginUpdater);
    cache.register_mutation_updater("login", login.clone());
    cache.register_mutation_updater("register", login);
    cache.register_mutation_updater("logout", Arc::new(SessionLogoutUpdater));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::users::User;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{id}"),
        }
    }

    fn cache_with_updaters() -> NormalizedCache {
        let cache = NormalizedCache::new();
        register_session_updaters(&cache);
        cache
    }

    #[test]
    fn successful_login_writes_the_session() {
        let cache = cache_with_updaters();
        cache.apply_mutation(&MutationResult::Login(UserResponse::ok(user(1))));
        assert_eq!(cache.session_user(), Some(Some(user(1))));
    }

    #[test]
    fn successful_register_writes_the_session() {
        let cache = cache_with_updaters();
        cache.apply_mutation(&MutationResult::Register(UserResponse::ok(user(2))));
        assert_eq!(cache.session_user(), Some(Some(user(2))));
    }

    #[test]
    fn failed_login_leaves_an_existing_session_alone() {
        let cache = cache_with_updaters();
        cache.write_session_user(Some(&user(1)));

        cache.apply_mutation(&MutationResult::Login(UserResponse::error(
            "password",
            "incorrect password",
        )));

        assert_eq!(cache.session_user(), Some(Some(user(1))));
    }

    #[test]
    fn logout_is_idempotent() {
        let cache = cache_with_updaters();
        cache.write_session_user(Some(&user(1)));

        cache.apply_mutation(&MutationResult::Logout(true));
        assert_eq!(cache.session_user(), Some(None));

        cache.apply_mutation(&MutationResult::Logout(true));
        assert_eq!(cache.session_user(), Some(None));
    }

    #[test]
    fn updaters_never_touch_pagination_keys() {
        use crate::cache::keys::{ArgValue, EntityKey, FieldArgs};
        use crate::domain::posts::PostPage;

        let cache = cache_with_updaters();
        cache.write_post_page(
            FieldArgs::new([("limit", ArgValue::Int(10))]),
            &PostPage::empty(),
        );

        cache.apply_mutation(&MutationResult::Login(UserResponse::ok(user(1))));
        cache.apply_mutation(&MutationResult::Logout(true));

        assert_eq!(cache.inspect_fields(&EntityKey::Query).len(), 1);
    }
}
