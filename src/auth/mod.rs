use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod roles;
pub(crate) mod services;
pub mod session;

pub use roles::{Permission, Role};
pub use session::Session;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
