use serde::Deserialize;

use super::repo_types::{OrderChanges, OrderFilter, OrderStatus};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub user_id: Option<i32>,
}

impl From<OrderQuery> for OrderFilter {
    fn from(q: OrderQuery) -> Self {
        Self {
            status: q.status,
            user_id: q.user_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    pub medicine_id: Option<i32>,
    pub quantity: Option<i32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<OrderStatus>,
}

pub fn check_quantity(quantity: Option<i32>) -> AppResult<()> {
    match quantity {
        Some(q) if q <= 0 => Err(AppError::validation("Quantity must be greater than zero")),
        _ => Ok(()),
    }
}

impl OrderRequest {
    pub fn into_changes(self) -> AppResult<OrderChanges> {
        check_quantity(self.quantity)?;
        Ok(OrderChanges {
            medicine_id: self.medicine_id,
            quantity: self.quantity,
            status: self.status,
        })
    }
}
