use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::{
    analytics::repo::AnalyticsRepo, medicines::repo::MedicineRepo, orders::repo::OrderRepo,
    seed::FixtureRepo, stores::repo::StoreRepo, supplies::repo::SupplyRepo,
    users::repo::UserRepo,
};

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const UNKNOWN_MEDICINE: &str = "Medicine not found";
pub const UNKNOWN_STORE: &str = "Store not found";
pub const UNKNOWN_USER: &str = "User not found";

/// Errors surfaced by repository implementations.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{0}")]
    UniqueViolation(String),

    #[error("{0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let constraint = db.constraint().unwrap_or_default();
            if db.is_unique_violation() {
                let msg = match constraint {
                    "users_email_key" => EMAIL_TAKEN.to_string(),
                    other => format!("Duplicate value violates {other}"),
                };
                return RepoError::UniqueViolation(msg);
            }
            if db.is_foreign_key_violation() {
                let msg = if constraint.ends_with("medicine_id_fkey") {
                    UNKNOWN_MEDICINE
                } else if constraint.ends_with("store_id_fkey") {
                    UNKNOWN_STORE
                } else {
                    UNKNOWN_USER
                };
                return RepoError::ForeignKeyViolation(msg.to_string());
            }
        }
        RepoError::Other(anyhow::Error::new(e))
    }
}

/// Everything the HTTP layer needs from storage.
pub trait Repository:
    UserRepo + MedicineRepo + StoreRepo + SupplyRepo + OrderRepo + AnalyticsRepo + FixtureRepo
{
}

impl<T> Repository for T where
    T: UserRepo + MedicineRepo + StoreRepo + SupplyRepo + OrderRepo + AnalyticsRepo + FixtureRepo
{
}

/// PostgreSQL-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pub(crate) pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
