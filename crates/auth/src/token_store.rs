//! Persistence and expiry evaluation of the access/refresh token pair.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::claims::{decode_claims, validate_expiry};
use crate::storage::KeyValueStorage;
use crate::user::TokenPair;

pub const ACCESS_TOKEN_KEY: &str = "tricol_access_token";
pub const REFRESH_TOKEN_KEY: &str = "tricol_refresh_token";

/// Bearer token store over a durable key/value storage.
///
/// Cheap to clone; clones share the same storage. No operation fails from the
/// caller's point of view: storage write errors are logged and dropped, and
/// undecodable tokens count as expired.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl core::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_access_token", &self.access_token().is_some())
            .field("has_refresh_token", &self.refresh_token().is_some())
            .finish()
    }
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn set_access_token(&self, token: &str) {
        self.write(ACCESS_TOKEN_KEY, token);
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.write(REFRESH_TOKEN_KEY, token);
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    /// Persist both halves of a freshly issued pair.
    pub fn store_pair(&self, pair: &TokenPair) {
        self.set_access_token(&pair.access_token);
        self.set_refresh_token(&pair.refresh_token);
    }

    /// Remove both tokens. Idempotent.
    pub fn clear_tokens(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.storage.remove(key) {
                tracing::warn!(key, error = %err, "failed to remove token from storage");
            }
        }
    }

    /// Whether `token` is expired right now.
    pub fn is_token_expired(&self, token: &str) -> bool {
        self.is_token_expired_at(token, Utc::now())
    }

    /// Whether `token` is expired at `now`.
    ///
    /// Undecodable tokens and tokens without a usable `exp` are expired.
    pub fn is_token_expired_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match decode_claims(token) {
            Ok(claims) => validate_expiry(&claims, now).is_err(),
            Err(err) => {
                tracing::debug!(error = %err, "treating undecodable token as expired");
                true
            }
        }
    }

    /// An access token is present and not expired.
    pub fn has_valid_token(&self) -> bool {
        self.has_valid_token_at(Utc::now())
    }

    pub fn has_valid_token_at(&self, now: DateTime<Utc>) -> bool {
        let Some(token) = self.access_token() else {
            tracing::debug!("no access token stored");
            return false;
        };
        let expired = self.is_token_expired_at(&token, now);
        tracing::debug!(expired, "access token present");
        !expired
    }

    /// The stored access token, only if it is still valid at `now`.
    pub fn valid_access_token_at(&self, now: DateTime<Utc>) -> Option<String> {
        self.access_token()
            .filter(|token| !self.is_token_expired_at(token, now))
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            tracing::warn!(key, error = %err, "failed to persist token");
        }
    }
}
