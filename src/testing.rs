//! Helpers for router-level tests against the memory repository.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{jwt::JwtKeys, password::NewPassword, roles::Role},
    state::AppState,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
};

pub const PASSWORD: &str = "test-password-1";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }
}

/// Sends one request through the router and parses the JSON body (Null when empty).
pub async fn call(
    app: &TestApp,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(path);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Inserts a user with [`PASSWORD`] and returns it with a valid access token.
pub async fn seed_user(app: &TestApp, email: &str, role: Role) -> (User, String) {
    let user = app
        .state
        .repo
        .create_user(NewUser {
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            password_hash: NewPassword::parse(PASSWORD).unwrap().hash().unwrap(),
            role,
        })
        .await
        .unwrap();
    let token = JwtKeys::from(&app.state.config.jwt)
        .sign_access(user.id)
        .unwrap();
    (user, token)
}

pub async fn admin_token(app: &TestApp) -> String {
    seed_user(app, "admin@example.com", Role::Admin).await.1
}
