use axum::{
    extract::State,
    routing::{get, patch},
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{check_quantity, OrderQuery, OrderRequest, StatusRequest},
    repo::OrderRepo,
    repo_types::{NewOrder, Order, OrderChanges},
};
use crate::{
    api::{ApiJson, ApiPath, ApiQuery, Created, Envelope},
    auth::{Permission, Session},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/:id/status", patch(set_order_status))
}

fn order_not_found() -> AppError {
    AppError::not_found("Order not found")
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn list_orders(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> AppResult<Envelope<Vec<Order>>> {
    session.require(Permission::ViewOrders)?;
    Ok(Envelope::ok(state.repo.list_orders(query.into()).await?))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn get_order(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<Order>> {
    session.require(Permission::ViewOrders)?;
    let order = state.repo.find_order(id).await?.ok_or_else(order_not_found)?;
    Ok(Envelope::ok(order))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn create_order(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<OrderRequest>,
) -> AppResult<Created<Order>> {
    session.require(Permission::ManageOrders)?;
    let medicine_id = payload
        .medicine_id
        .ok_or_else(|| AppError::validation("medicine_id is required"))?;
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::validation("quantity is required"))?;
    check_quantity(Some(quantity))?;

    let order = state
        .repo
        .create_order(NewOrder {
            user_id: session.user_id(),
            medicine_id,
            quantity,
            status: payload.status.unwrap_or_default(),
        })
        .await?;
    info!(order_id = order.id, medicine_id, quantity, "order placed");
    Ok(Created(Envelope::ok(order).with_message("Order created successfully")))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn update_order(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<OrderRequest>,
) -> AppResult<Envelope<Order>> {
    session.require(Permission::ManageOrders)?;
    let changes = payload.into_changes()?;
    let order = state
        .repo
        .update_order(id, changes)
        .await?
        .ok_or_else(order_not_found)?;
    info!(order_id = order.id, "order updated");
    Ok(Envelope::ok(order).with_message("Order updated successfully"))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn set_order_status(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> AppResult<Envelope<Order>> {
    session.require(Permission::ManageOrders)?;
    let status = payload
        .status
        .ok_or_else(|| AppError::validation("status is required"))?;
    let changes = OrderChanges {
        status: Some(status),
        ..OrderChanges::default()
    };
    let order = state
        .repo
        .update_order(id, changes)
        .await?
        .ok_or_else(order_not_found)?;
    info!(order_id = order.id, status = %order.status, "order status changed");
    Ok(Envelope::ok(order).with_message("Order status updated"))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn delete_order(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<()>> {
    session.require(Permission::ManageOrders)?;
    if !state.repo.delete_order(id).await? {
        return Err(order_not_found());
    }
    info!(order_id = id, "order deleted");
    Ok(Envelope::message("Order deleted successfully"))
}
