use async_trait::async_trait;

use super::repo_types::{Medicine, MedicineChanges, MedicineFilter, NewMedicine};
use crate::db::{PgRepository, RepoResult};

const MEDICINE_COLUMNS: &str = "id, name, manufacturer, batch_number, manufacture_date, \
     expiry_date, price, stock_quantity, created_at, updated_at";

/// `ILIKE` pattern matching `q` as a plain substring.
fn contains_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
pub trait MedicineRepo: Send + Sync {
    /// Medicines ordered by name, then id.
    async fn list_medicines(&self, filter: MedicineFilter) -> RepoResult<Vec<Medicine>>;
    async fn find_medicine(&self, id: i32) -> RepoResult<Option<Medicine>>;
    async fn create_medicine(&self, new: NewMedicine) -> RepoResult<Medicine>;
    async fn update_medicine(&self, id: i32, changes: MedicineChanges)
        -> RepoResult<Option<Medicine>>;
    /// Cascades to supplies and orders of the medicine.
    async fn delete_medicine(&self, id: i32) -> RepoResult<bool>;
}

#[async_trait]
impl MedicineRepo for PgRepository {
    async fn list_medicines(&self, filter: MedicineFilter) -> RepoResult<Vec<Medicine>> {
        let page = filter.page.clamped();
        let pattern = filter.search.as_deref().map(contains_pattern);
        let rows = sqlx::query_as::<_, Medicine>(&format!(
            r#"
            SELECT {MEDICINE_COLUMNS}
            FROM medicines
            WHERE $1::TEXT IS NULL
               OR name ILIKE $1 ESCAPE '\'
               OR manufacturer ILIKE $1 ESCAPE '\'
            ORDER BY name ASC, id ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_medicine(&self, id: i32) -> RepoResult<Option<Medicine>> {
        let row = sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_medicine(&self, new: NewMedicine) -> RepoResult<Medicine> {
        let row = sqlx::query_as::<_, Medicine>(&format!(
            r#"
            INSERT INTO medicines
                (name, manufacturer, batch_number, manufacture_date, expiry_date, price, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.manufacturer)
        .bind(&new.batch_number)
        .bind(new.manufacture_date)
        .bind(new.expiry_date)
        .bind(new.price)
        .bind(new.stock_quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_medicine(
        &self,
        id: i32,
        changes: MedicineChanges,
    ) -> RepoResult<Option<Medicine>> {
        let row = sqlx::query_as::<_, Medicine>(&format!(
            r#"
            UPDATE medicines SET
                name             = COALESCE($2, name),
                manufacturer     = COALESCE($3, manufacturer),
                batch_number     = COALESCE($4, batch_number),
                manufacture_date = COALESCE($5, manufacture_date),
                expiry_date      = COALESCE($6, expiry_date),
                price            = COALESCE($7, price),
                stock_quantity   = COALESCE($8, stock_quantity),
                updated_at       = now()
            WHERE id = $1
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.manufacturer)
        .bind(changes.batch_number)
        .bind(changes.manufacture_date)
        .bind(changes.expiry_date)
        .bind(changes.price)
        .bind(changes.stock_quantity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_medicine(&self, id: i32) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_pattern_escapes_like_metacharacters() {
        assert_eq!(contains_pattern(" asp "), "%asp%");
        assert_eq!(contains_pattern("_"), r"%\_%");
        assert_eq!(contains_pattern("50%"), r"%50\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
