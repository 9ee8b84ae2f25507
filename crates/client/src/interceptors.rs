//! Session-aware pipeline stages: attach-credential and handle-fault.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tricol_auth::{AuthContext, TokenStore};

use crate::navigation::{Navigator, Route};
use crate::pipeline::{Outcome, RequestStage, ResponseStage};
use crate::transport::ApiRequest;

/// Attach the stored access token as a bearer credential, if it is valid.
///
/// Missing or expired tokens leave the request untouched; no refresh is
/// attempted.
pub fn attach_credential(request: ApiRequest, tokens: &TokenStore) -> ApiRequest {
    attach_credential_at(request, tokens, Utc::now())
}

pub fn attach_credential_at(
    mut request: ApiRequest,
    tokens: &TokenStore,
    now: DateTime<Utc>,
) -> ApiRequest {
    let Some(token) = tokens.valid_access_token_at(now) else {
        tracing::debug!(url = %request.url, "no valid access token; sending request anonymously");
        return request;
    };

    match request.set_bearer_token(&token) {
        Ok(()) => tracing::debug!(url = %request.url, "attached bearer credential"),
        Err(err) => {
            tracing::warn!(error = %err, "access token is not a valid header value; not attached")
        }
    }
    request
}

/// React to authentication (401) and authorization (403) failures.
///
/// A 401 ends the session and redirects to the login view; a 403 is only
/// logged. The outcome is always returned as received.
pub fn handle_fault(outcome: Outcome, ctx: &AuthContext, navigator: &dyn Navigator) -> Outcome {
    if let Err(err) = &outcome {
        match err.status() {
            401 => {
                tracing::warn!("authentication rejected by server; ending session");
                ctx.end_session();
                navigator.navigate(&Route::login());
            }
            403 => tracing::error!("access denied"),
            _ => {}
        }
    }
    outcome
}

/// Request stage wrapping [`attach_credential`].
#[derive(Debug, Clone)]
pub struct AttachCredential {
    tokens: TokenStore,
}

impl AttachCredential {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }
}

impl RequestStage for AttachCredential {
    fn on_request(&self, request: ApiRequest) -> ApiRequest {
        attach_credential(request, &self.tokens)
    }
}

/// Response stage wrapping [`handle_fault`].
#[derive(Clone)]
pub struct HandleFault {
    ctx: AuthContext,
    navigator: Arc<dyn Navigator>,
}

impl HandleFault {
    pub fn new(ctx: AuthContext, navigator: Arc<dyn Navigator>) -> Self {
        Self { ctx, navigator }
    }
}

impl ResponseStage for HandleFault {
    fn on_response(&self, request: &ApiRequest, outcome: Outcome) -> Outcome {
        if let Err(err) = &outcome {
            tracing::debug!(url = %request.url, status = err.status(), "request failed");
        }
        handle_fault(outcome, &self.ctx, self.navigator.as_ref())
    }
}
