use async_trait::async_trait;

use super::repo_types::{NewOrder, Order, OrderChanges, OrderFilter, OrderRow};
use crate::db::{PgRepository, RepoResult};

const ORDER_COLUMNS: &str = "id, user_id, medicine_id, quantity, status, created_at, updated_at";

#[async_trait]
pub trait OrderRepo: Send + Sync {
    /// Newest first.
    async fn list_orders(&self, filter: OrderFilter) -> RepoResult<Vec<Order>>;
    async fn find_order(&self, id: i32) -> RepoResult<Option<Order>>;
    async fn create_order(&self, new: NewOrder) -> RepoResult<Order>;
    async fn update_order(&self, id: i32, changes: OrderChanges) -> RepoResult<Option<Order>>;
    async fn delete_order(&self, id: i32) -> RepoResult<bool>;
}

fn into_order(row: OrderRow) -> RepoResult<Order> {
    Ok(Order::try_from(row)?)
}

#[async_trait]
impl OrderRepo for PgRepository {
    async fn list_orders(&self, filter: OrderFilter) -> RepoResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::INT IS NULL OR user_id = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(into_order).collect()
    }

    async fn find_order(&self, id: i32) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_order).transpose()
    }

    async fn create_order(&self, new: NewOrder) -> RepoResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (user_id, medicine_id, quantity, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.medicine_id)
        .bind(new.quantity)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        into_order(row)
    }

    async fn update_order(&self, id: i32, changes: OrderChanges) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders SET
                medicine_id = COALESCE($2, medicine_id),
                quantity    = COALESCE($3, quantity),
                status      = COALESCE($4, status),
                updated_at  = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.medicine_id)
        .bind(changes.quantity)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_order).transpose()
    }

    async fn delete_order(&self, id: i32) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
