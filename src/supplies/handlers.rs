use axum::{extract::State, routing::get, Router};
use tracing::{info, instrument};

use super::{
    dto::{SupplyQuery, SupplyRequest},
    repo::SupplyRepo,
    repo_types::SupplyDetails,
};
use crate::{
    api::{ApiJson, ApiPath, ApiQuery, Created, Envelope},
    auth::{Permission, Session},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn supply_routes() -> Router<AppState> {
    Router::new()
        .route("/supplies", get(list_supplies).post(create_supply))
        .route(
            "/supplies/:id",
            get(get_supply).put(update_supply).delete(delete_supply),
        )
}

fn supply_not_found() -> AppError {
    AppError::not_found("Supply not found")
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn list_supplies(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<SupplyQuery>,
) -> AppResult<Envelope<Vec<SupplyDetails>>> {
    session.require(Permission::ViewInventory)?;
    Ok(Envelope::ok(state.repo.list_supplies(query.into()).await?))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn get_supply(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<SupplyDetails>> {
    session.require(Permission::ViewInventory)?;
    let supply = state.repo.find_supply(id).await?.ok_or_else(supply_not_found)?;
    Ok(Envelope::ok(supply))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn create_supply(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<SupplyRequest>,
) -> AppResult<Created<SupplyDetails>> {
    session.require(Permission::ManageSupplies)?;
    let supply = state.repo.create_supply(payload.into_new()?).await?;
    info!(
        supply_id = supply.id,
        medicine_id = supply.medicine_id,
        store_id = supply.store_id,
        quantity = supply.quantity,
        "supply recorded"
    );
    Ok(Created(Envelope::ok(supply).with_message("Supply created successfully")))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn update_supply(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<SupplyRequest>,
) -> AppResult<Envelope<SupplyDetails>> {
    session.require(Permission::ManageSupplies)?;
    let changes = payload.into_changes()?;
    let supply = state
        .repo
        .update_supply(id, changes)
        .await?
        .ok_or_else(supply_not_found)?;
    info!(supply_id = supply.id, "supply updated");
    Ok(Envelope::ok(supply).with_message("Supply updated successfully"))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn delete_supply(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<()>> {
    session.require(Permission::ManageSupplies)?;
    if state.repo.find_supply(id).await?.is_none() {
        return Err(supply_not_found());
    }
    if !state.repo.delete_supply(id).await? {
        return Err(supply_not_found());
    }
    info!(supply_id = id, "supply deleted");
    Ok(Envelope::message("Supply deleted successfully"))
}
