use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Value, json};

use tricol_auth::{AuthContext, LoginRequest};
use tricol_client::{
    ApiRequest, Pipeline, RecordingNavigator, ReqwestTransport, Route, SessionState, Transport,
};

const JWT_SECRET: &str = "test-secret";
const PASSWORD: &str = "motdepasse";

struct TestServer {
    api_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/v1/suppliers", get(list_suppliers))
            .route("/api/v1/whoami", get(whoami))
            .route("/api/v1/admin/users", get(forbidden))
            .route("/api/v1/revoked", get(unauthorized));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let api_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { api_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(authorities: &[&str], expires_in: ChronoDuration) -> String {
    let claims = json!({
        "sub": "achat@tricol.ma",
        "exp": (Utc::now() + expires_in).timestamp(),
        "authorities": authorities,
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn verify(headers: &HeaderMap) -> bool {
    let Some(token) = bearer(headers) else {
        return false;
    };
    jsonwebtoken::decode::<Value>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .is_ok()
}

async fn login(Json(body): Json<Value>) -> axum::response::Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Email ou mot de passe incorrect" })),
        )
            .into_response();
    }

    Json(json!({
        "accessToken": mint_jwt(
            &["ROLE_RESPONSABLE_ACHATS", "SUPPLIER_READ"],
            ChronoDuration::minutes(30),
        ),
        "refreshToken": mint_jwt(&[], ChronoDuration::hours(24)),
        "tokenType": "Bearer",
    }))
    .into_response()
}

async fn register(Json(body): Json<Value>) -> axum::response::Response {
    if body["email"] == "taken@tricol.ma" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Cette adresse email est déjà utilisée" })),
        )
            .into_response();
    }
    (StatusCode::CREATED, "User registered successfully").into_response()
}

async fn list_suppliers(headers: HeaderMap) -> axum::response::Response {
    if !verify(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{ "id": 1, "companyName": "Atlas Textiles", "city": "Casablanca" }]))
        .into_response()
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    Json(json!({ "authenticated": bearer(&headers).is_some() }))
}

async fn forbidden() -> StatusCode {
    StatusCode::FORBIDDEN
}

async fn unauthorized() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

struct Client {
    ctx: AuthContext,
    navigator: Arc<RecordingNavigator>,
    pipeline: Arc<Pipeline>,
    session: SessionState,
    api_url: String,
}

fn client(api_url: &str) -> Client {
    let ctx = AuthContext::in_memory();
    let navigator = Arc::new(RecordingNavigator::new());
    let transport = ReqwestTransport::new(std::time::Duration::from_secs(5)).unwrap();
    let pipeline = Arc::new(Pipeline::authenticated(
        Arc::new(transport),
        ctx.clone(),
        navigator.clone(),
    ));
    let session = SessionState::new(ctx.clone(), pipeline.clone(), api_url);

    Client {
        ctx,
        navigator,
        pipeline,
        session,
        api_url: api_url.to_string(),
    }
}

impl Client {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn login(&self, password: &str) -> Result<(), tricol_client::TransportError> {
        self.session
            .login(&LoginRequest {
                email: "achat@tricol.ma".into(),
                password: password.into(),
            })
            .await
            .map(|_| ())
    }
}

#[tokio::test]
async fn login_stores_tokens_and_authenticates_requests() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);

    c.login(PASSWORD).await.unwrap();

    assert!(c.session.is_authenticated());
    assert!(c.ctx.tokens().access_token().is_some());
    assert!(c.ctx.tokens().refresh_token().is_some());
    assert_eq!(
        c.ctx.permissions().user_permissions().as_strs(),
        vec!["RESPONSABLE_ACHATS", "SUPPLIER_READ"]
    );

    let res = c.pipeline.send(ApiRequest::get(c.url("/v1/suppliers"))).await.unwrap();
    let suppliers: Vec<Value> = res.json().unwrap();
    assert_eq!(suppliers[0]["companyName"], "Atlas Textiles");
}

#[tokio::test]
async fn anonymous_requests_carry_no_credential() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);

    let body: Value = c
        .pipeline
        .send(ApiRequest::get(c.url("/v1/whoami")))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(body["authenticated"], false);

    c.login(PASSWORD).await.unwrap();
    let body: Value = c
        .pipeline
        .send(ApiRequest::get(c.url("/v1/whoami")))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn expired_token_is_not_sent() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);
    c.ctx
        .tokens()
        .set_access_token(&mint_jwt(&["ROLE_ADMIN"], ChronoDuration::minutes(-1)));

    let body: Value = c
        .pipeline
        .send(ApiRequest::get(c.url("/v1/whoami")))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(body["authenticated"], false);
    assert!(!c.session.is_authenticated());
}

#[tokio::test]
async fn unauthorized_response_ends_session_and_redirects() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);
    c.login(PASSWORD).await.unwrap();

    let err = c
        .pipeline
        .send(ApiRequest::get(c.url("/v1/revoked")))
        .await
        .unwrap_err();

    assert_eq!(err.status(), 401);
    assert_eq!(c.ctx.tokens().access_token(), None);
    assert_eq!(c.ctx.tokens().refresh_token(), None);
    assert!(c.ctx.permissions().user_permissions().is_empty());
    assert_eq!(c.navigator.last(), Some(Route::login()));
}

#[tokio::test]
async fn wrong_password_is_reported_and_redirects_to_login() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);

    let err = c.login("wrong").await.unwrap_err();

    assert_eq!(err.status(), 401);
    assert_eq!(err.server_message(), Some("Email ou mot de passe incorrect"));
    assert!(!c.session.is_authenticated());
    assert_eq!(c.navigator.last(), Some(Route::login()));
}

#[tokio::test]
async fn forbidden_response_keeps_session() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);
    c.login(PASSWORD).await.unwrap();

    let err = c
        .pipeline
        .send(ApiRequest::get(c.url("/v1/admin/users")))
        .await
        .unwrap_err();

    assert!(err.is_forbidden());
    assert!(c.session.is_authenticated());
    assert!(c.navigator.history().is_empty());
}

#[tokio::test]
async fn register_returns_server_text_and_conflicts() {
    let srv = TestServer::spawn().await;
    let c = client(&srv.api_url);

    let answer = c
        .session
        .register(&tricol_auth::RegisterRequest {
            email: "new@tricol.ma".into(),
            password: "secret1".into(),
            full_name: "Nouvel Utilisateur".into(),
        })
        .await
        .unwrap();
    assert_eq!(answer, "User registered successfully");
    assert!(!c.session.is_authenticated());

    let err = c
        .session
        .register(&tricol_auth::RegisterRequest {
            email: "taken@tricol.ma".into(),
            password: "secret1".into(),
            full_name: "Doublon".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), 409);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let c = client(&format!("http://{}/api", addr));
    let err = c.login(PASSWORD).await.unwrap_err();

    assert_eq!(err.status(), 0);
    assert!(c.navigator.history().is_empty());
}
