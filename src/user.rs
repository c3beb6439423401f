//! Resolving the application user behind a request.
//!
//! The application registers a [`UserResolver`] for its own user type; a
//! handler then calls [`user`] to get the user for the current store. The
//! resolver lives in the store's extensions, so different pipelines can use
//! different user types side by side.

use crate::store::Store;
use std::fmt;
use std::sync::Arc;

/// Application hook mapping a request to its user.
pub trait UserResolver<U>: Send + Sync {
    fn resolve(&self, store: &Store) -> anyhow::Result<U>;
}

impl<U, F> UserResolver<U> for F
where
    F: Fn(&Store) -> anyhow::Result<U> + Send + Sync,
{
    fn resolve(&self, store: &Store) -> anyhow::Result<U> {
        self(store)
    }
}

/// No resolver for the requested user type is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoUserResolver;

impl fmt::Display for NoUserResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no user resolver registered")
    }
}

impl std::error::Error for NoUserResolver {}

/// Extension slot holding the resolver for `U`.
pub struct UserSlot<U> {
    resolver: Arc<dyn UserResolver<U>>,
}

impl<U> UserSlot<U> {
    pub fn new(resolver: Arc<dyn UserResolver<U>>) -> Self {
        Self { resolver }
    }
}

impl<U> Clone for UserSlot<U> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// Return a store with `resolver` registered for `U`.
#[must_use]
pub fn with_user_resolver<U: 'static>(store: &Store, resolver: Arc<dyn UserResolver<U>>) -> Store {
    store.with_extension(UserSlot::new(resolver))
}

/// The user for this request.
///
/// Fails with [`NoUserResolver`] when nothing is registered for `U`;
/// otherwise returns whatever the resolver returns.
pub fn user<U: 'static>(store: &Store) -> anyhow::Result<U> {
    let slot = store
        .extension::<UserSlot<U>>()
        .ok_or(NoUserResolver)?;
    slot.resolver.resolve(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Status;
    use http::StatusCode;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: u64,
    }

    #[test]
    fn test_missing_resolver() {
        let err = user::<Account>(&Store::new()).unwrap_err();
        assert!(err.is::<NoUserResolver>());
    }

    #[test]
    fn test_registered_resolver() {
        let resolver: Arc<dyn UserResolver<Account>> =
            Arc::new(|_: &Store| -> anyhow::Result<Account> { Ok(Account { id: 42 }) });
        let store = with_user_resolver(&Store::new(), resolver);
        assert_eq!(user::<Account>(&store).unwrap(), Account { id: 42 });
        // Other user types are still unresolved
        assert!(user::<String>(&store).is_err());
    }

    #[test]
    fn test_resolver_error_is_returned() {
        let resolver: Arc<dyn UserResolver<Account>> = Arc::new(
            |_: &Store| -> anyhow::Result<Account> { Err(Status(StatusCode::UNAUTHORIZED).into()) },
        );
        let store = with_user_resolver(&Store::new(), resolver);
        let err = user::<Account>(&store).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Status>(),
            Some(&Status(StatusCode::UNAUTHORIZED))
        );
    }
}
