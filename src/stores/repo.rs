use async_trait::async_trait;

use super::repo_types::{MedicalStore, NewStore, StoreChanges};
use crate::db::{PgRepository, RepoResult};

const STORE_COLUMNS: &str =
    "id, name, address, city, phone, email, license_number, created_at, updated_at";

fn clears(field: &Option<Option<String>>) -> bool {
    matches!(field, Some(None))
}

#[async_trait]
pub trait StoreRepo: Send + Sync {
    async fn list_stores(&self) -> RepoResult<Vec<MedicalStore>>;
    async fn find_store(&self, id: i32) -> RepoResult<Option<MedicalStore>>;
    async fn create_store(&self, new: NewStore) -> RepoResult<MedicalStore>;
    async fn update_store(&self, id: i32, changes: StoreChanges)
        -> RepoResult<Option<MedicalStore>>;
    /// Cascades to the store's supplies.
    async fn delete_store(&self, id: i32) -> RepoResult<bool>;
}

#[async_trait]
impl StoreRepo for PgRepository {
    async fn list_stores(&self) -> RepoResult<Vec<MedicalStore>> {
        let rows = sqlx::query_as::<_, MedicalStore>(&format!(
            "SELECT {STORE_COLUMNS} FROM medical_stores ORDER BY name ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_store(&self, id: i32) -> RepoResult<Option<MedicalStore>> {
        let row = sqlx::query_as::<_, MedicalStore>(&format!(
            "SELECT {STORE_COLUMNS} FROM medical_stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_store(&self, new: NewStore) -> RepoResult<MedicalStore> {
        let row = sqlx::query_as::<_, MedicalStore>(&format!(
            r#"
            INSERT INTO medical_stores (name, address, city, phone, email, license_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.license_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_store(
        &self,
        id: i32,
        changes: StoreChanges,
    ) -> RepoResult<Option<MedicalStore>> {
        let row = sqlx::query_as::<_, MedicalStore>(&format!(
            r#"
            UPDATE medical_stores SET
                name           = COALESCE($2, name),
                address        = COALESCE($3, address),
                city           = CASE WHEN $8 THEN NULL ELSE COALESCE($4, city) END,
                phone          = CASE WHEN $9 THEN NULL ELSE COALESCE($5, phone) END,
                email          = CASE WHEN $10 THEN NULL ELSE COALESCE($6, email) END,
                license_number = COALESCE($7, license_number),
                updated_at     = now()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.address)
        .bind(changes.city.clone().flatten())
        .bind(changes.phone.clone().flatten())
        .bind(changes.email.clone().flatten())
        .bind(&changes.license_number)
        .bind(clears(&changes.city))
        .bind(clears(&changes.phone))
        .bind(clears(&changes.email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_store(&self, id: i32) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM medical_stores WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
