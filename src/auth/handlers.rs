use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest, SignupRequest},
    jwt::JwtKeys,
    password::verify_password,
    roles::Role,
    services::{issue_tokens, normalize_email, register_user, Registration},
    session::Session,
};
use crate::{
    api::{required, ApiJson, Created, Envelope},
    error::{AppError, AppResult},
    state::AppState,
    users::{repo::UserRepo, repo_types::User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> AppResult<Created<AuthResponse>> {
    let role = payload.role.unwrap_or_default();
    if role == Role::Admin {
        warn!("admin self-registration attempt");
        return Err(AppError::validation("Cannot self-register as admin"));
    }

    let user = register_user(
        &state,
        Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role,
            is_active: true,
        },
    )
    .await?;

    info!(user_id = user.id, email = %user.email, "user signed up");
    let body = issue_tokens(&state, user)?;
    Ok(Created(Envelope::ok(body).with_message("Account created successfully")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Envelope<AuthResponse>> {
    let email = normalize_email(&required("Email", payload.email)?)?;
    let password = required("Password", payload.password)?;

    let user = match state.repo.find_user_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(%email, "login unknown email");
            return Err(invalid_credentials());
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(%email, user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    if !user.is_active {
        warn!(user_id = user.id, "login on deactivated account");
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }

    info!(user_id = user.id, email = %user.email, "user logged in");
    let body = issue_tokens(&state, user)?;
    Ok(Envelope::ok(body).with_message("Login successful"))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> AppResult<Envelope<AuthResponse>> {
    let keys = JwtKeys::from(&state.config.jwt);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = state
        .repo
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }

    let body = issue_tokens(&state, user)?;
    Ok(Envelope::ok(body))
}

#[instrument(skip(session), fields(user_id = session.user_id()))]
pub async fn me(session: Session) -> Envelope<User> {
    Envelope::ok(session.user)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{call, seed_user, TestApp};

    #[tokio::test]
    async fn signup_then_login_returns_tokens() {
        let app = TestApp::new();
        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "name": "Nia", "email": "Nia@Example.com", "password": "pill-counter-9" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"]["email"], "nia@example.com");
        assert_eq!(body["data"]["user"]["role"], "employer");
        assert!(body["data"]["user"].get("password_hash").is_none());

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nia@example.com", "password": "pill-counter-9" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Nia");
    }

    #[tokio::test]
    async fn signup_rejects_admin_and_duplicates() {
        let app = TestApp::new();
        let payload = json!({ "name": "Eve", "email": "eve@example.com", "password": "longpassword", "role": "admin" });
        let (status, body) = call(&app, "POST", "/api/auth/signup", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        seed_user(&app, "eve@example.com", crate::auth::roles::Role::Employer).await;
        let payload = json!({ "name": "Eve", "email": "eve@example.com", "password": "longpassword" });
        let (status, body) = call(&app, "POST", "/api/auth/signup", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], crate::db::EMAIL_TAKEN);
    }

    #[tokio::test]
    async fn login_failures() {
        let app = TestApp::new();
        seed_user(&app, "clerk@example.com", crate::auth::roles::Role::Pharmacist).await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "clerk@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "whatever123" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, "POST", "/api/auth/login", None, Some(json!({ "email": "clerk@example.com" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deactivated_accounts_cannot_log_in() {
        let app = TestApp::new();
        let (user, token) = seed_user(&app, "gone@example.com", crate::auth::roles::Role::Employer).await;
        {
            use crate::users::repo::UserRepo;
            app.state.repo.toggle_user_active(user.id).await.unwrap();
        }

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "gone@example.com", "password": crate::testing::PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Account is deactivated");

        let (status, _) = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn refresh_issues_new_pair_and_rejects_access_tokens() {
        let app = TestApp::new();
        let (user, access) = seed_user(&app, "r@example.com", crate::auth::roles::Role::Employer).await;
        let refresh = crate::auth::jwt::JwtKeys::from(&app.state.config.jwt)
            .sign_refresh(user.id)
            .unwrap();

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["id"], user.id);

        let (status, _) = call(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": access })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let app = TestApp::new();
        let (status, body) = call(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, "GET", "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
