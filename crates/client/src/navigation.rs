//! Navigation capability used to redirect the current view.

use std::sync::Mutex;

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// A view location: path plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    path: String,
    query: Vec<(String, String)>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn login() -> Self {
        Self::new(LOGIN_PATH)
    }

    /// Login view that sends the user back to `url` once signed in.
    pub fn login_with_return(url: &str) -> Self {
        Self::login().with_query(RETURN_URL_PARAM, url)
    }

    pub fn dashboard() -> Self {
        Self::new(DASHBOARD_PATH)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Redirects the current view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Navigator for headless use: redirects are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &Route) {
        tracing::info!(route = %route, "navigation requested");
    }
}

/// Navigator that remembers every redirect, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Route> {
        self.history.lock().ok()?.last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        if let Ok(mut history) = self.history.lock() {
            history.push(route.clone());
        }
    }
}
