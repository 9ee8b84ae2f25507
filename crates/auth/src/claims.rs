use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::permissions::{Permission, PermissionSet};

/// Base64url engine that accepts both padded and unpadded segments.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims read from the middle segment of a bearer token.
///
/// Only two things are interpreted client-side: the expiry hint and the
/// granted permission list. Each is read from the raw payload on its own, so
/// an unexpected shape in one claim never hides the other. The signature is
/// never checked here; the server that issued the token is the only
/// authority on its validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenClaims {
    payload: Map<String, Value>,
}

impl TokenClaims {
    /// Raw claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// `exp` in seconds since the Unix epoch, when it is a JSON number.
    pub fn exp(&self) -> Option<f64> {
        self.claim("exp").and_then(Value::as_f64)
    }

    /// Expiration instant, if the token carries a usable `exp`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.exp().filter(|e| e.is_finite())?;
        let millis = exp * 1000.0;
        if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }

    /// Permissions granted by the token, with any `ROLE_` prefix removed.
    ///
    /// `permissions` wins over `authorities` whenever it is present and not
    /// null, even if empty. If the chosen claim is not an array of strings
    /// the result is empty.
    pub fn granted_permissions(&self) -> PermissionSet {
        let (name, raw) = match self.claim("permissions").filter(|v| !v.is_null()) {
            Some(raw) => ("permissions", raw),
            None => match self.claim("authorities").filter(|v| !v.is_null()) {
                Some(raw) => ("authorities", raw),
                None => return PermissionSet::empty(),
            },
        };

        let entries = raw
            .as_array()
            .and_then(|items| items.iter().map(Value::as_str).collect::<Option<Vec<_>>>());

        match entries {
            Some(entries) => entries.into_iter().map(Permission::from_authority).collect(),
            None => {
                tracing::warn!(claim = name, "permission claim is not a list of strings");
                PermissionSet::empty()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token has no claims segment")]
    MalformedToken,

    #[error("claims segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("claims segment is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token carries no usable expiration")]
    MissingExpiry,
}

/// Decode the claims segment of `token` without verifying its signature.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenDecodeError> {
    let segment = token
        .split('.')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or(TokenDecodeError::MalformedToken)?;

    let raw = SEGMENT_ENGINE.decode(segment)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Check the expiry hint of already-decoded claims against `now`.
///
/// A token is expired from the exact instant of `exp` onwards.
pub fn validate_expiry(
    claims: &TokenClaims,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    let expires_at = claims.expires_at().ok_or(TokenValidationError::MissingExpiry)?;
    if now >= expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
