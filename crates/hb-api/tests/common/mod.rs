#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use hb_api::{router, AppState, SessionSettings};
use hb_auth_jwt::{hash_password, JwtAuthProvider};
use hb_core::{AdminAuthenticator, AuthProvider, SubmissionPolicy};
use hb_db_sqlite::SqliteConfessionRepo;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN: &str = "admin";
pub const PASSWORD: &str = "correct horse";
/// Socket address every test request arrives from unless it says otherwise.
pub const PEER: &str = "203.0.113.7";

#[derive(Default)]
pub struct Options {
    pub require_external_role: bool,
    pub policy: SubmissionPolicy,
    pub trusted_proxies: Vec<IpAddr>,
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<SqliteConfessionRepo>,
    pub auth: Arc<JwtAuthProvider>,
}

pub async fn app() -> TestApp {
    app_with(Options::default()).await
}

pub async fn app_with(options: Options) -> TestApp {
    let repo = Arc::new(SqliteConfessionRepo::new("sqlite::memory:").await.unwrap());
    let auth = Arc::new(JwtAuthProvider::new(
        &SecretString::from("test-secret".to_string()),
        ADMIN,
        SecretString::from(hash_password(PASSWORD).unwrap()),
        chrono::Duration::hours(1),
    ));
    let provider: Arc<dyn AuthProvider> = auth.clone();
    let state = AppState {
        confessions: repo.clone(),
        bans: repo.clone(),
        auth: provider.clone(),
        authenticator: Arc::new(AdminAuthenticator::standard(
            provider,
            options.require_external_role,
        )),
        policy: Arc::new(options.policy),
        trusted_proxies: Arc::new(options.trusted_proxies),
        session: SessionSettings {
            max_age_secs: 3600,
            secure: false,
        },
    };
    TestApp {
        router: router(state),
        repo,
        auth,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Logs in and returns the `Cookie` header value to send on later requests.
    pub async fn login(&self) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/admin/auth/login",
                None,
                serde_json::json!({ "username": ADMIN, "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie_pair(&response)
    }
}

/// `name=value` part of the response's `Set-Cookie` header.
pub fn session_cookie_pair(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(String::from)
        .expect("response should set a cookie")
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    raw_json_request(method, uri, cookie, body.to_string())
}

/// JSON request with a body that need not be valid JSON.
pub fn raw_json_request(method: &str, uri: &str, cookie: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "hb-tests");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    from_peer(builder.body(Body::from(body)).unwrap(), PEER)
}

/// Sets the socket address the server sees for `request`.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr = SocketAddr::new(peer.parse().unwrap(), 40_000);
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    from_peer(builder.body(Body::empty()).unwrap(), PEER)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
