use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::api::Pagination;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Medicine {
    pub id: i32,
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    #[serde(with = "crate::dates::iso_date")]
    pub manufacture_date: Date,
    #[serde(with = "crate::dates::iso_date")]
    pub expiry_date: Date,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub name: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub manufacture_date: Date,
    pub expiry_date: Date,
    pub price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MedicineChanges {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub batch_number: Option<String>,
    pub manufacture_date: Option<Date>,
    pub expiry_date: Option<Date>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicineFilter {
    /// Case-insensitive substring of name or manufacturer.
    pub search: Option<String>,
    pub page: Pagination,
}

impl MedicineFilter {
    pub fn matches(&self, m: &Medicine) -> bool {
        match &self.search {
            None => true,
            Some(q) => {
                let q = q.to_lowercase();
                m.name.to_lowercase().contains(&q) || m.manufacturer.to_lowercase().contains(&q)
            }
        }
    }
}
