use serde::Deserialize;
use time::Date;

use super::repo_types::{NewSupply, SupplyChanges, SupplyFilter};
use crate::{
    dates::today,
    error::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct SupplyQuery {
    pub medicine_id: Option<i32>,
    pub store_id: Option<i32>,
}

impl From<SupplyQuery> for SupplyFilter {
    fn from(q: SupplyQuery) -> Self {
        Self {
            medicine_id: q.medicine_id,
            store_id: q.store_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplyRequest {
    pub medicine_id: Option<i32>,
    pub store_id: Option<i32>,
    pub quantity: Option<i32>,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub supply_date: Option<Date>,
}

fn check_quantity(quantity: Option<i32>) -> AppResult<()> {
    match quantity {
        Some(q) if q <= 0 => Err(AppError::validation("Quantity must be greater than zero")),
        _ => Ok(()),
    }
}

impl SupplyRequest {
    /// A missing supply date defaults to today.
    pub fn into_new(self) -> AppResult<NewSupply> {
        let medicine_id = self
            .medicine_id
            .ok_or_else(|| AppError::validation("Medicine is required"))?;
        let store_id = self
            .store_id
            .ok_or_else(|| AppError::validation("Store is required"))?;
        let quantity = self
            .quantity
            .ok_or_else(|| AppError::validation("Quantity is required"))?;
        check_quantity(Some(quantity))?;

        Ok(NewSupply {
            medicine_id,
            store_id,
            quantity,
            supply_date: self.supply_date.unwrap_or_else(today),
        })
    }

    pub fn into_changes(self) -> AppResult<SupplyChanges> {
        check_quantity(self.quantity)?;
        Ok(SupplyChanges {
            medicine_id: self.medicine_id,
            store_id: self.store_id,
            quantity: self.quantity,
            supply_date: self.supply_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_supply_date_to_today() {
        let new = SupplyRequest {
            medicine_id: Some(1),
            store_id: Some(2),
            quantity: Some(10),
            supply_date: None,
        }
        .into_new()
        .unwrap();
        assert_eq!(new.supply_date, today());
    }

    #[test]
    fn rejects_non_positive_quantities() {
        let req = SupplyRequest {
            medicine_id: Some(1),
            store_id: Some(2),
            quantity: Some(0),
            supply_date: None,
        };
        assert!(req.into_new().is_err());
        let req = SupplyRequest {
            quantity: Some(-3),
            ..Default::default()
        };
        assert!(req.into_changes().is_err());
    }
}
