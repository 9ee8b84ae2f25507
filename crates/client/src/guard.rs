//! Navigation guards for protected views.

use std::sync::Arc;

use tricol_auth::AuthContext;

use crate::navigation::{Navigator, Route};

/// Lets a navigation through only while the session holds a valid token.
#[derive(Clone)]
pub struct AuthGuard {
    ctx: AuthContext,
    navigator: Arc<dyn Navigator>,
}

impl AuthGuard {
    pub fn new(ctx: AuthContext, navigator: Arc<dyn Navigator>) -> Self {
        Self { ctx, navigator }
    }

    /// Whether `url` may be shown.
    ///
    /// On refusal the user is sent to the login view, which will bring them
    /// back to `url` after signing in.
    pub fn can_activate(&self, url: &str) -> bool {
        let authenticated = self.ctx.is_authenticated();
        tracing::debug!(url, authenticated, "auth guard check");
        if authenticated {
            return true;
        }

        self.navigator.navigate(&Route::login_with_return(url));
        false
    }
}

/// Requires a specific permission on top of an authenticated session.
#[derive(Clone)]
pub struct PermissionGuard {
    auth: AuthGuard,
}

impl PermissionGuard {
    pub fn new(ctx: AuthContext, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            auth: AuthGuard::new(ctx, navigator),
        }
    }

    /// Anonymous users go to the login view; signed-in users lacking
    /// `permission` go back to the dashboard.
    pub fn can_activate(&self, url: &str, permission: &str) -> bool {
        if !self.auth.can_activate(url) {
            return false;
        }
        if self.auth.ctx.permissions().has_permission(permission) {
            return true;
        }

        tracing::warn!(url, permission, "missing permission for view");
        self.auth.navigator.navigate(&Route::dashboard());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{RETURN_URL_PARAM, RecordingNavigator};
    use chrono::{Duration, Utc};
    use tricol_auth::TokenPair;

    fn session_with(perms: &[&str]) -> AuthContext {
        let ctx = AuthContext::in_memory();
        let access_token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({
                "sub": "magasin@tricol.ma",
                "exp": (Utc::now() + Duration::minutes(30)).timestamp(),
                "authorities": perms,
            }),
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .expect("failed to encode jwt");
        ctx.begin_session(&TokenPair {
            access_token,
            refresh_token: "refresh".into(),
        });
        ctx
    }

    #[test]
    fn anonymous_user_is_sent_to_login_with_return_url() {
        let nav = Arc::new(RecordingNavigator::new());
        let guard = AuthGuard::new(AuthContext::in_memory(), nav.clone());

        assert!(!guard.can_activate("/dashboard"));
        let route = nav.last().unwrap();
        assert!(route.is_login());
        assert_eq!(route.query_param(RETURN_URL_PARAM), Some("/dashboard"));
    }

    #[test]
    fn authenticated_user_passes() {
        let nav = Arc::new(RecordingNavigator::new());
        let guard = AuthGuard::new(session_with(&[]), nav.clone());

        assert!(guard.can_activate("/dashboard"));
        assert!(nav.history().is_empty());
    }

    #[test]
    fn permission_guard_checks_stripped_authorities() {
        let nav = Arc::new(RecordingNavigator::new());
        let guard = PermissionGuard::new(session_with(&["ROLE_MAGASINIER"]), nav.clone());

        assert!(guard.can_activate("/stock", "MAGASINIER"));
        assert!(!guard.can_activate("/fournisseurs", "ADMIN"));
        assert_eq!(nav.history(), vec![Route::dashboard()]);
    }

    #[test]
    fn permission_guard_sends_anonymous_users_to_login() {
        let nav = Arc::new(RecordingNavigator::new());
        let guard = PermissionGuard::new(AuthContext::in_memory(), nav.clone());

        assert!(!guard.can_activate("/fournisseurs", "ADMIN"));
        assert!(nav.last().unwrap().is_login());
    }
}
