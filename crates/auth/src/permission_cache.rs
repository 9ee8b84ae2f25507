//! Memoized permission set derived from the current access token.

use std::sync::{Arc, Mutex};

use crate::claims::decode_claims;
use crate::permissions::PermissionSet;
use crate::token_store::TokenStore;

#[derive(Debug, Clone, Default)]
enum CacheState {
    #[default]
    Uncomputed,
    /// Computed from a token (or from its absence); may be empty.
    Computed(PermissionSet),
}

/// Permission cache over a [`TokenStore`].
///
/// The set is computed on first query and then returned unchanged until
/// [`PermissionCache::clear_cache`] is called, even if the stored token
/// changes in between. Clones share the same cache.
#[derive(Debug, Clone)]
pub struct PermissionCache {
    tokens: TokenStore,
    state: Arc<Mutex<CacheState>>,
}

impl PermissionCache {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            tokens,
            state: Arc::new(Mutex::new(CacheState::Uncomputed)),
        }
    }

    /// Permissions of the current user, computed at most once per invalidation.
    ///
    /// No token or an undecodable token yields (and caches) an empty set.
    pub fn user_permissions(&self) -> PermissionSet {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let CacheState::Computed(set) = &*state {
            return set.clone();
        }

        let set = self.compute();
        *state = CacheState::Computed(set.clone());
        set
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.user_permissions().contains(name)
    }

    /// Forget the cached set; the next query recomputes from the current token.
    pub fn clear_cache(&self) {
        match self.state.lock() {
            Ok(mut guard) => *guard = CacheState::Uncomputed,
            Err(poisoned) => *poisoned.into_inner() = CacheState::Uncomputed,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.state
            .lock()
            .map(|s| matches!(*s, CacheState::Computed(_)))
            .unwrap_or(false)
    }

    fn compute(&self) -> PermissionSet {
        let Some(token) = self.tokens.access_token() else {
            return PermissionSet::empty();
        };

        match decode_claims(&token) {
            Ok(claims) => {
                let set = claims.granted_permissions();
                tracing::debug!(permissions = ?set.as_strs(), "derived user permissions");
                set
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read permissions from access token");
                PermissionSet::empty()
            }
        }
    }
}
