use async_trait::async_trait;
use rust_decimal::Decimal;
use time::Date;

use super::repo_types::{EntityCounts, ExpiryAlert, InventorySummary, StockAlert, SummaryParams};
use crate::db::{PgRepository, RepoResult};

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn inventory_summary(&self, params: SummaryParams) -> RepoResult<InventorySummary>;
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    medicines: i64,
    stores: i64,
    supplies: i64,
    users: i64,
    orders: i64,
    total_stock_units: i64,
    inventory_value: Decimal,
    expired_count: i64,
}

#[async_trait]
impl AnalyticsRepo for PgRepository {
    async fn inventory_summary(&self, params: SummaryParams) -> RepoResult<InventorySummary> {
        let totals = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM medicines)      AS medicines,
                (SELECT COUNT(*) FROM medical_stores) AS stores,
                (SELECT COUNT(*) FROM supplies)       AS supplies,
                (SELECT COUNT(*) FROM users)          AS users,
                (SELECT COUNT(*) FROM orders)         AS orders,
                (SELECT COALESCE(SUM(stock_quantity), 0)::BIGINT FROM medicines) AS total_stock_units,
                (SELECT COALESCE(SUM(price * stock_quantity), 0)::NUMERIC FROM medicines) AS inventory_value,
                (SELECT COUNT(*) FROM medicines WHERE expiry_date < $1) AS expired_count
            "#,
        )
        .bind(params.today)
        .fetch_one(&self.pool)
        .await?;

        let low_stock: Vec<(i32, String, i32)> = sqlx::query_as(
            r#"
            SELECT id, name, stock_quantity FROM medicines
            WHERE stock_quantity <= $1
            ORDER BY stock_quantity ASC, name ASC
            "#,
        )
        .bind(params.low_stock_threshold)
        .fetch_all(&self.pool)
        .await?;

        let expiring: Vec<(i32, String, String, Date)> = sqlx::query_as(
            r#"
            SELECT id, name, batch_number, expiry_date FROM medicines
            WHERE expiry_date >= $1 AND expiry_date <= $2
            ORDER BY expiry_date ASC, id ASC
            "#,
        )
        .bind(params.today)
        .bind(params.expiry_cutoff())
        .fetch_all(&self.pool)
        .await?;

        Ok(InventorySummary {
            counts: EntityCounts {
                medicines: totals.medicines,
                stores: totals.stores,
                supplies: totals.supplies,
                users: totals.users,
                orders: totals.orders,
            },
            total_stock_units: totals.total_stock_units,
            inventory_value: totals.inventory_value,
            expired_count: totals.expired_count,
            low_stock_threshold: params.low_stock_threshold,
            expiry_warning_days: params.expiry_warning_days,
            low_stock: low_stock
                .into_iter()
                .map(|(id, name, stock_quantity)| StockAlert {
                    id,
                    name,
                    stock_quantity,
                })
                .collect(),
            expiring_soon: expiring
                .into_iter()
                .map(|(id, name, batch, expiry)| ExpiryAlert::new(id, name, batch, expiry, params.today))
                .collect(),
        })
    }
}
