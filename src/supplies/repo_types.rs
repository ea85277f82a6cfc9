use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// Supply link joined with the names of its medicine and store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplyDetails {
    pub id: i32,
    pub medicine_id: i32,
    pub medicine_name: String,
    pub store_id: i32,
    pub store_name: String,
    pub quantity: i32,
    #[serde(with = "crate::dates::iso_date")]
    pub supply_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSupply {
    pub medicine_id: i32,
    pub store_id: i32,
    pub quantity: i32,
    pub supply_date: Date,
}

#[derive(Debug, Clone, Default)]
pub struct SupplyChanges {
    pub medicine_id: Option<i32>,
    pub store_id: Option<i32>,
    pub quantity: Option<i32>,
    pub supply_date: Option<Date>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SupplyFilter {
    pub medicine_id: Option<i32>,
    pub store_id: Option<i32>,
}

impl SupplyFilter {
    pub fn matches(&self, medicine_id: i32, store_id: i32) -> bool {
        self.medicine_id.map_or(true, |m| m == medicine_id)
            && self.store_id.map_or(true, |s| s == store_id)
    }
}
