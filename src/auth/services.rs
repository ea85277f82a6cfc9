use lazy_static::lazy_static;
use regex::Regex;

use super::{
    dto::AuthResponse,
    jwt::JwtKeys,
    password::NewPassword,
    roles::Role,
};
use crate::{
    api::required,
    db::EMAIL_TAKEN,
    error::{AppError, AppResult},
    state::AppState,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User, UserChanges},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims, lower-cases and validates an email address.
pub(crate) fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

/// Validated registration input shared by signup and admin user creation.
pub(crate) struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

/// Validates, rejects duplicate emails, hashes the password and stores the user.
pub(crate) async fn register_user(state: &AppState, input: Registration) -> AppResult<User> {
    let name = required("Name", input.name)?;
    let email = normalize_email(&required("Email", input.email)?)?;
    let password = NewPassword::parse(input.password.as_deref().unwrap_or_default())?;

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::validation(EMAIL_TAKEN));
    }

    let password_hash = password.hash()?;
    let mut user = state
        .repo
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role: input.role,
        })
        .await?;

    if !input.is_active {
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        if let Some(updated) = state.repo.update_user(user.id, changes).await? {
            user = updated;
        }
    }
    Ok(user)
}

pub(crate) fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from(&state.config.jwt);
    let pair = keys.sign_pair(user.id)?;
    Ok(AuthResponse {
        token: pair.access,
        refresh_token: pair.refresh,
        user,
    })
}
