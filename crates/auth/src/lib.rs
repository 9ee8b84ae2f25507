//! `tricol-auth`: client-side session core.
//!
//! Token persistence, claims decoding, permission derivation and the
//! current-user cell. This crate is intentionally decoupled from HTTP; the
//! request pipeline lives in `tricol-client`.

pub mod claims;
pub mod context;
pub mod current_user;
pub mod permission_cache;
pub mod permissions;
pub mod roles;
pub mod storage;
pub mod token_store;
pub mod user;

pub use claims::{
    TokenClaims, TokenDecodeError, TokenValidationError, decode_claims, validate_expiry,
};
pub use context::AuthContext;
pub use current_user::{CurrentUser, UserSubscription};
pub use permission_cache::PermissionCache;
pub use permissions::{Permission, PermissionSet};
pub use roles::{RoleName, UnknownRole};
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage, StorageError};
pub use token_store::TokenStore;
pub use user::{AuthResponse, LoginRequest, PermissionInfo, RegisterRequest, Role, TokenPair, User};
