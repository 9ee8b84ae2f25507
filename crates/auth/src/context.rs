use std::sync::Arc;

use crate::current_user::CurrentUser;
use crate::permission_cache::PermissionCache;
use crate::storage::{InMemoryStorage, KeyValueStorage};
use crate::token_store::TokenStore;
use crate::user::TokenPair;

/// Session context handed to every collaborator that needs the session.
///
/// Bundles the token store, the permission cache derived from it, and the
/// current-user cell. Cloning yields another handle onto the same session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    tokens: TokenStore,
    permissions: PermissionCache,
    current_user: CurrentUser,
}

impl AuthContext {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let tokens = TokenStore::new(storage);
        Self {
            permissions: PermissionCache::new(tokens.clone()),
            tokens,
            current_user: CurrentUser::new(),
        }
    }

    /// Context backed by throwaway in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn permissions(&self) -> &PermissionCache {
        &self.permissions
    }

    pub fn current_user(&self) -> &CurrentUser {
        &self.current_user
    }

    /// Install a freshly issued token pair.
    ///
    /// The permission cache is invalidated so the next query reflects the new
    /// access token.
    pub fn begin_session(&self, pair: &TokenPair) {
        self.tokens.store_pair(pair);
        self.permissions.clear_cache();
    }

    /// Drop every trace of the session: tokens, current user, permissions.
    pub fn end_session(&self) {
        self.tokens.clear_tokens();
        self.current_user.clear();
        self.permissions.clear_cache();
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_valid_token()
    }
}
