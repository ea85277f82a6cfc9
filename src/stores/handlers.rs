use axum::{extract::State, routing::get, Router};
use tracing::{info, instrument};

use super::{dto::StoreRequest, repo::StoreRepo, repo_types::MedicalStore};
use crate::{
    api::{ApiJson, ApiPath, Created, Envelope},
    auth::{Permission, Session},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(list_stores).post(create_store))
        .route(
            "/stores/:id",
            get(get_store).put(update_store).delete(delete_store),
        )
}

fn store_not_found() -> AppError {
    AppError::not_found("Store not found")
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn list_stores(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Envelope<Vec<MedicalStore>>> {
    session.require(Permission::ViewInventory)?;
    Ok(Envelope::ok(state.repo.list_stores().await?))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn get_store(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<MedicalStore>> {
    session.require(Permission::ViewInventory)?;
    let store = state.repo.find_store(id).await?.ok_or_else(store_not_found)?;
    Ok(Envelope::ok(store))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn create_store(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<StoreRequest>,
) -> AppResult<Created<MedicalStore>> {
    session.require(Permission::ManageStores)?;
    let store = state.repo.create_store(payload.into_new()?).await?;
    info!(store_id = store.id, name = %store.name, "store created");
    Ok(Created(Envelope::ok(store).with_message("Store created successfully")))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn update_store(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<StoreRequest>,
) -> AppResult<Envelope<MedicalStore>> {
    session.require(Permission::ManageStores)?;
    let changes = payload.into_changes()?;
    let store = state
        .repo
        .update_store(id, changes)
        .await?
        .ok_or_else(store_not_found)?;
    info!(store_id = store.id, "store updated");
    Ok(Envelope::ok(store).with_message("Store updated successfully"))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn delete_store(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<()>> {
    session.require(Permission::ManageStores)?;
    if state.repo.find_store(id).await?.is_none() {
        return Err(store_not_found());
    }
    if !state.repo.delete_store(id).await? {
        return Err(store_not_found());
    }
    info!(store_id = id, "store deleted");
    Ok(Envelope::message("Store deleted successfully"))
}
