use axum::{
    extract::State,
    routing::{get, patch},
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo::UserRepo,
    repo_types::{User, UserChanges},
};
use crate::{
    api::{non_blank, ApiJson, ApiPath, Created, Envelope},
    auth::{
        password::NewPassword,
        services::{normalize_email, register_user, Registration},
        Permission, Session,
    },
    db::EMAIL_TAKEN,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/toggle-status", patch(toggle_status))
}

fn user_not_found() -> AppError {
    AppError::not_found("User not found")
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Envelope<Vec<User>>> {
    session.require(Permission::ManageUsers)?;
    let users = state.repo.list_users().await?;
    Ok(Envelope::ok(users))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn get_user(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<User>> {
    session.require(Permission::ManageUsers)?;
    let user = state.repo.find_user(id).await?.ok_or_else(user_not_found)?;
    Ok(Envelope::ok(user))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn create_user(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<Created<User>> {
    session.require(Permission::ManageUsers)?;
    let user = register_user(
        &state,
        Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role.unwrap_or_default(),
            is_active: payload.is_active.unwrap_or(true),
        },
    )
    .await?;
    info!(user_id = user.id, role = %user.role, "user created");
    Ok(Created(Envelope::ok(user).with_message("User created successfully")))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> AppResult<Envelope<User>> {
    session.require(Permission::ManageUsers)?;
    let existing = state.repo.find_user(id).await?.ok_or_else(user_not_found)?;

    let mut changes = UserChanges {
        name: non_blank("Name", payload.name)?,
        role: payload.role,
        is_active: payload.is_active,
        ..Default::default()
    };

    if let Some(raw) = payload.email {
        let email = normalize_email(&raw)?;
        if email != existing.email {
            if state.repo.find_user_by_email(&email).await?.is_some() {
                return Err(AppError::validation(EMAIL_TAKEN));
            }
            changes.email = Some(email);
        }
    }

    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        changes.password_hash = Some(NewPassword::parse(&password)?.hash()?);
    }

    let user = state
        .repo
        .update_user(id, changes)
        .await?
        .ok_or_else(user_not_found)?;
    info!(user_id = user.id, "user updated");
    Ok(Envelope::ok(user).with_message("User updated successfully"))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<()>> {
    session.require(Permission::ManageUsers)?;
    if state.repo.find_user(id).await?.is_none() {
        return Err(user_not_found());
    }
    if !state.repo.delete_user(id).await? {
        return Err(user_not_found());
    }
    info!(user_id = id, "user deleted");
    Ok(Envelope::message("User deleted successfully"))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn toggle_status(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<User>> {
    session.require(Permission::ManageUsers)?;
    let user = state
        .repo
        .toggle_user_active(id)
        .await?
        .ok_or_else(user_not_found)?;
    let message = if user.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    info!(user_id = user.id, is_active = user.is_active, "user status toggled");
    Ok(Envelope::ok(user).with_message(message))
}
