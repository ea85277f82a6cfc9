use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// A pharmacy outlet that receives supplies.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MedicalStore {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub license_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub address: String,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub license_number: String,
}

/// `None` keeps a column. For the nullable contact fields `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct StoreChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub license_number: Option<String>,
}
