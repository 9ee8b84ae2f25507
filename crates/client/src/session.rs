//! Login, registration and logout against the auth API.

use std::sync::Arc;

use tricol_auth::{AuthContext, AuthResponse, LoginRequest, RegisterRequest, User, UserSubscription};

use crate::navigation::{Navigator, Route};
use crate::transport::{ApiRequest, Transport, TransportError};

/// Session operations exposed to views.
///
/// Requests go through `transport`, which is normally the authenticated
/// [`Pipeline`](crate::pipeline::Pipeline) built on the same [`AuthContext`].
#[derive(Clone)]
pub struct SessionState {
    ctx: AuthContext,
    transport: Arc<dyn Transport>,
    auth_url: String,
}

impl SessionState {
    /// `api_url` is the API base (e.g. `http://localhost:8080/api`).
    pub fn new(ctx: AuthContext, transport: Arc<dyn Transport>, api_url: &str) -> Self {
        Self {
            ctx,
            transport,
            auth_url: format!("{}/auth", api_url.trim_end_matches('/')),
        }
    }

    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }

    /// Exchange credentials for a token pair and store it.
    ///
    /// The current user is left untouched; callers set it once they have
    /// fetched the profile. Overlapping logins are not serialized: the last
    /// one to complete wins.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, TransportError> {
        let request = ApiRequest::post(format!("{}/login", self.auth_url)).with_json(credentials)?;
        let response = self.transport.send(request).await?;
        let auth: AuthResponse = response.json()?;

        self.ctx.begin_session(&auth.token_pair());
        tracing::info!(email = %credentials.email, "signed in");
        Ok(auth)
    }

    /// Create an account. Returns the server's plain-text answer; the session
    /// is not affected.
    pub async fn register(&self, data: &RegisterRequest) -> Result<String, TransportError> {
        let request = ApiRequest::post(format!("{}/register", self.auth_url)).with_json(data)?;
        let response = self.transport.send(request).await?;
        Ok(response.body)
    }

    /// Clear tokens, current user and cached permissions.
    pub fn logout(&self) {
        self.ctx.end_session();
        tracing::info!("signed out");
    }

    /// [`logout`](Self::logout) followed by a redirect to the login view.
    pub fn logout_and_redirect(&self, navigator: &dyn Navigator) {
        self.logout();
        navigator.navigate(&Route::login());
    }

    pub fn is_authenticated(&self) -> bool {
        self.ctx.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.ctx.current_user().get()
    }

    pub fn set_current_user(&self, user: User) {
        self.ctx.current_user().set(user);
    }

    pub fn subscribe(&self) -> UserSubscription {
        self.ctx.current_user().subscribe()
    }
}
