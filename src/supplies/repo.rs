use async_trait::async_trait;

use super::repo_types::{NewSupply, SupplyChanges, SupplyDetails, SupplyFilter};
use crate::db::{PgRepository, RepoResult};

const SUPPLY_SELECT: &str = r#"
    SELECT s.id, s.medicine_id, m.name AS medicine_name, s.store_id,
           st.name AS store_name, s.quantity, s.supply_date, s.created_at
    FROM supplies s
    JOIN medicines m ON m.id = s.medicine_id
    JOIN medical_stores st ON st.id = s.store_id
"#;

#[async_trait]
pub trait SupplyRepo: Send + Sync {
    /// Newest supply date first.
    async fn list_supplies(&self, filter: SupplyFilter) -> RepoResult<Vec<SupplyDetails>>;
    async fn find_supply(&self, id: i32) -> RepoResult<Option<SupplyDetails>>;
    /// Fails with a foreign-key violation when the medicine or store is unknown.
    async fn create_supply(&self, new: NewSupply) -> RepoResult<SupplyDetails>;
    async fn update_supply(&self, id: i32, changes: SupplyChanges)
        -> RepoResult<Option<SupplyDetails>>;
    async fn delete_supply(&self, id: i32) -> RepoResult<bool>;
}

#[async_trait]
impl SupplyRepo for PgRepository {
    async fn list_supplies(&self, filter: SupplyFilter) -> RepoResult<Vec<SupplyDetails>> {
        let rows = sqlx::query_as::<_, SupplyDetails>(&format!(
            r#"{SUPPLY_SELECT}
            WHERE ($1::INT IS NULL OR s.medicine_id = $1)
              AND ($2::INT IS NULL OR s.store_id = $2)
            ORDER BY s.supply_date DESC, s.id DESC
            "#
        ))
        .bind(filter.medicine_id)
        .bind(filter.store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_supply(&self, id: i32) -> RepoResult<Option<SupplyDetails>> {
        let row = sqlx::query_as::<_, SupplyDetails>(&format!("{SUPPLY_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_supply(&self, new: NewSupply) -> RepoResult<SupplyDetails> {
        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO supplies (medicine_id, store_id, quantity, supply_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new.medicine_id)
        .bind(new.store_id)
        .bind(new.quantity)
        .bind(new.supply_date)
        .fetch_one(&self.pool)
        .await?;

        self.find_supply(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("supply {id} vanished after insert").into())
    }

    async fn update_supply(
        &self,
        id: i32,
        changes: SupplyChanges,
    ) -> RepoResult<Option<SupplyDetails>> {
        let updated: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE supplies SET
                medicine_id = COALESCE($2, medicine_id),
                store_id    = COALESCE($3, store_id),
                quantity    = COALESCE($4, quantity),
                supply_date = COALESCE($5, supply_date)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(changes.medicine_id)
        .bind(changes.store_id)
        .bind(changes.quantity)
        .bind(changes.supply_date)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(_) => self.find_supply(id).await,
            None => Ok(None),
        }
    }

    async fn delete_supply(&self, id: i32) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM supplies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
