use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    api::{non_blank, required, Pagination},
    error::{AppError, AppResult},
};

use super::repo_types::{Medicine, MedicineChanges, MedicineFilter, NewMedicine};

// limit/offset are spelled out: serde(flatten) loses number parsing in query strings
#[derive(Debug, Deserialize)]
pub struct MedicineQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<MedicineQuery> for MedicineFilter {
    fn from(q: MedicineQuery) -> Self {
        let defaults = Pagination::default();
        Self {
            search: q.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            page: Pagination {
                limit: q.limit.unwrap_or(defaults.limit),
                offset: q.offset.unwrap_or(defaults.offset),
            }
            .clamped(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MedicineRequest {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub manufacture_date: Option<Date>,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub expiry_date: Option<Date>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

fn check_dates(manufacture: Date, expiry: Date) -> AppResult<()> {
    if expiry < manufacture {
        return Err(AppError::validation(
            "Expiry date cannot be before manufacture date",
        ));
    }
    Ok(())
}

/// Largest value the `NUMERIC(12, 2)` price column holds.
pub fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn check_price(price: Option<Decimal>) -> AppResult<()> {
    let Some(p) = price else {
        return Ok(());
    };
    if p.is_sign_negative() {
        return Err(AppError::validation("Price cannot be negative"));
    }
    if p > max_price() {
        return Err(AppError::validation("Price cannot exceed 9999999999.99"));
    }
    if p.normalize().scale() > 2 {
        return Err(AppError::validation("Price cannot have more than 2 decimal places"));
    }
    Ok(())
}

fn check_stock(stock: Option<i32>) -> AppResult<()> {
    match stock {
        Some(s) if s < 0 => Err(AppError::validation("Stock quantity cannot be negative")),
        _ => Ok(()),
    }
}

impl MedicineRequest {
    pub fn into_new(self) -> AppResult<NewMedicine> {
        let manufacture_date = self
            .manufacture_date
            .ok_or_else(|| AppError::validation("Manufacture date is required"))?;
        let expiry_date = self
            .expiry_date
            .ok_or_else(|| AppError::validation("Expiry date is required"))?;
        let price = self
            .price
            .ok_or_else(|| AppError::validation("Price is required"))?;
        check_dates(manufacture_date, expiry_date)?;
        check_price(Some(price))?;
        check_stock(self.stock_quantity)?;

        Ok(NewMedicine {
            name: required("Name", self.name)?,
            manufacturer: required("Manufacturer", self.manufacturer)?,
            batch_number: required("Batch number", self.batch_number)?,
            manufacture_date,
            expiry_date,
            price,
            stock_quantity: self.stock_quantity.unwrap_or(0),
        })
    }

    /// Validates a partial update against the stored record.
    pub fn into_changes(self, existing: &Medicine) -> AppResult<MedicineChanges> {
        check_dates(
            self.manufacture_date.unwrap_or(existing.manufacture_date),
            self.expiry_date.unwrap_or(existing.expiry_date),
        )?;
        check_price(self.price)?;
        check_stock(self.stock_quantity)?;

        Ok(MedicineChanges {
            name: non_blank("Name", self.name)?,
            manufacturer: non_blank("Manufacturer", self.manufacturer)?,
            batch_number: non_blank("Batch number", self.batch_number)?,
            manufacture_date: self.manufacture_date,
            expiry_date: self.expiry_date,
            price: self.price,
            stock_quantity: self.stock_quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn request() -> MedicineRequest {
        MedicineRequest {
            name: Some(" Aspirin ".into()),
            manufacturer: Some("Bayer".into()),
            batch_number: Some("ASP-001".into()),
            manufacture_date: Some(date!(2024 - 01 - 01)),
            expiry_date: Some(date!(2026 - 01 - 01)),
            price: Some(Decimal::new(499, 2)),
            stock_quantity: None,
        }
    }

    #[test]
    fn builds_new_medicine() {
        let new = request().into_new().unwrap();
        assert_eq!(new.name, "Aspirin");
        assert_eq!(new.stock_quantity, 0);
    }

    #[test]
    fn rejects_expiry_before_manufacture() {
        let mut req = request();
        req.expiry_date = Some(date!(2023 - 12 - 31));
        assert!(matches!(req.into_new(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_negative_values() {
        let mut req = request();
        req.price = Some(Decimal::new(-1, 0));
        assert!(req.into_new().is_err());

        let mut req = request();
        req.stock_quantity = Some(-5);
        assert!(req.into_new().is_err());
    }

    #[test]
    fn rejects_prices_the_column_cannot_hold() {
        assert_eq!(max_price().to_string(), "9999999999.99");

        let mut req = request();
        req.price = Some(max_price());
        assert!(req.into_new().is_ok());

        let mut req = request();
        req.price = Some(Decimal::MAX);
        assert!(matches!(req.into_new(), Err(AppError::Validation(_))));

        let mut req = request();
        req.price = Some(Decimal::new(1999, 3));
        assert!(matches!(req.into_new(), Err(AppError::Validation(_))));

        // trailing zeros beyond the second place are fine
        let mut req = request();
        req.price = Some(Decimal::new(4990, 3));
        assert!(req.into_new().is_ok());
    }

    #[test]
    fn missing_required_fields() {
        let mut req = request();
        req.batch_number = None;
        assert!(req.into_new().is_err());
        let mut req = request();
        req.expiry_date = None;
        assert!(req.into_new().is_err());
    }

    #[test]
    fn query_blank_search_is_ignored() {
        let filter = MedicineFilter::from(MedicineQuery {
            search: Some("   ".into()),
            limit: Some(5000),
            offset: None,
        });
        assert!(filter.search.is_none());
        assert_eq!(filter.page.limit, crate::api::MAX_PAGE_SIZE);
    }
}
