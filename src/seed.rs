//! Fixture loading for the `seed` binary.
//!
//! Loading always clears the affected tables first (children before parents)
//! and restarts their id sequences, so fixture rows get predictable ids
//! starting at 1.

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{macros::date, Date};
use tracing::info;

use crate::{
    auth::{password::NewPassword, Role},
    db::{PgRepository, RepoError, RepoResult},
    medicines::repo_types::NewMedicine,
    stores::repo_types::NewStore,
    users::repo_types::NewUser,
};

/// Which tables a fixture load wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Supplies, orders, medicines and stores.
    Inventory,
    /// Every table, users included.
    All,
}

/// A supply link referencing fixture medicines and stores by position.
#[derive(Debug, Clone)]
pub struct SupplyFixture {
    pub medicine: usize,
    pub store: usize,
    pub quantity: i32,
    pub supply_date: Date,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    pub users: Vec<NewUser>,
    pub medicines: Vec<NewMedicine>,
    pub stores: Vec<NewStore>,
    pub supplies: Vec<SupplyFixture>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub medicines: usize,
    pub stores: usize,
    pub supplies: usize,
}

#[async_trait]
pub trait FixtureRepo: Send + Sync {
    /// Clears `scope`, restarts its sequences and inserts `set` atomically.
    async fn load_fixtures(&self, scope: ResetScope, set: FixtureSet) -> RepoResult<SeedReport>;
}

pub(crate) fn resolve(ids: &[i32], index: usize, what: &str) -> RepoResult<i32> {
    ids.get(index)
        .copied()
        .ok_or_else(|| RepoError::Other(anyhow::anyhow!("supply fixture references missing {what} #{index}")))
}

#[async_trait]
impl FixtureRepo for PgRepository {
    async fn load_fixtures(&self, scope: ResetScope, set: FixtureSet) -> RepoResult<SeedReport> {
        let mut tx = self.pool.begin().await?;

        let mut tables = vec!["supplies", "orders", "medicines", "medical_stores"];
        if scope == ResetScope::All {
            tables.push("users");
        }
        for table in &tables {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
            sqlx::query(&format!("ALTER SEQUENCE {table}_id_seq RESTART WITH 1"))
                .execute(&mut *tx)
                .await?;
        }

        for user in &set.users {
            sqlx::query(
                "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4)",
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .execute(&mut *tx)
            .await?;
        }

        let mut medicine_ids = Vec::with_capacity(set.medicines.len());
        for m in &set.medicines {
            let (id,): (i32,) = sqlx::query_as(
                r#"
                INSERT INTO medicines
                    (name, manufacturer, batch_number, manufacture_date, expiry_date, price, stock_quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(&m.name)
            .bind(&m.manufacturer)
            .bind(&m.batch_number)
            .bind(m.manufacture_date)
            .bind(m.expiry_date)
            .bind(m.price)
            .bind(m.stock_quantity)
            .fetch_one(&mut *tx)
            .await?;
            medicine_ids.push(id);
        }

        let mut store_ids = Vec::with_capacity(set.stores.len());
        for s in &set.stores {
            let (id,): (i32,) = sqlx::query_as(
                r#"
                INSERT INTO medical_stores (name, address, city, phone, email, license_number)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(&s.name)
            .bind(&s.address)
            .bind(&s.city)
            .bind(&s.phone)
            .bind(&s.email)
            .bind(&s.license_number)
            .fetch_one(&mut *tx)
            .await?;
            store_ids.push(id);
        }

        for link in &set.supplies {
            sqlx::query(
                "INSERT INTO supplies (medicine_id, store_id, quantity, supply_date) VALUES ($1, $2, $3, $4)",
            )
            .bind(resolve(&medicine_ids, link.medicine, "medicine")?)
            .bind(resolve(&store_ids, link.store, "store")?)
            .bind(link.quantity)
            .bind(link.supply_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(?scope, cleared = ?tables, "fixtures loaded");
        Ok(set.report())
    }
}

impl FixtureSet {
    pub fn report(&self) -> SeedReport {
        SeedReport {
            users: self.users.len(),
            medicines: self.medicines.len(),
            stores: self.stores.len(),
            supplies: self.supplies.len(),
        }
    }
}

fn medicine(
    name: &str,
    manufacturer: &str,
    batch: &str,
    made: Date,
    expires: Date,
    cents: i64,
    stock: i32,
) -> NewMedicine {
    NewMedicine {
        name: name.into(),
        manufacturer: manufacturer.into(),
        batch_number: batch.into(),
        manufacture_date: made,
        expiry_date: expires,
        price: Decimal::new(cents, 2),
        stock_quantity: stock,
    }
}

fn store(name: &str, address: &str, city: &str, phone: &str, license: &str) -> NewStore {
    NewStore {
        name: name.into(),
        address: address.into(),
        city: Some(city.into()),
        phone: Some(phone.into()),
        email: None,
        license_number: license.into(),
    }
}

/// Sample inventory for `seed sample`.
pub fn sample_fixtures() -> FixtureSet {
    let medicines = vec![
        medicine("Aspirin", "Bayer", "ASP-2401", date!(2024 - 01 - 10), date!(2026 - 06 - 30), 499, 500),
        medicine("Amoxicillin", "GSK", "AMX-2402", date!(2024 - 02 - 01), date!(2025 - 12 - 31), 1250, 300),
        medicine("Lisinopril", "Merck", "LIS-2403", date!(2024 - 03 - 15), date!(2026 - 03 - 15), 875, 400),
        medicine("Levothyroxine", "AbbVie", "LEV-2404", date!(2024 - 01 - 31), date!(2027 - 01 - 31), 1599, 250),
        medicine("Metformin", "Teva", "MET-2405", date!(2024 - 09 - 30), date!(2026 - 09 - 30), 650, 350),
        medicine("Amlodipine", "Pfizer", "AML-2406", date!(2024 - 05 - 30), date!(2026 - 11 - 30), 720, 8),
        medicine("Omeprazole", "AstraZeneca", "OME-2407", date!(2024 - 07 - 01), date!(2026 - 07 - 01), 1100, 180),
        medicine("Simvastatin", "Sandoz", "SIM-2408", date!(2024 - 04 - 20), date!(2026 - 04 - 20), 930, 5),
    ];
    let stores = vec![
        store("Central Pharmacy", "12 Market Street", "Springfield", "+1-555-0100", "LIC-1001"),
        store("Riverside Chemist", "48 River Road", "Springfield", "+1-555-0142", "LIC-1002"),
        store("Hilltop Drugstore", "7 Summit Avenue", "Shelbyville", "+1-555-0177", "LIC-1003"),
    ];
    let supplies = [
        (0, 0, 120, date!(2025 - 01 - 05)),
        (1, 0, 60, date!(2025 - 01 - 12)),
        (2, 1, 80, date!(2025 - 02 - 02)),
        (3, 1, 40, date!(2025 - 02 - 18)),
        (4, 2, 90, date!(2025 - 03 - 01)),
        (6, 2, 35, date!(2025 - 03 - 09)),
        (0, 2, 50, date!(2025 - 03 - 21)),
    ]
    .into_iter()
    .map(|(medicine, store, quantity, supply_date)| SupplyFixture {
        medicine,
        store,
        quantity,
        supply_date,
    })
    .collect();

    FixtureSet {
        users: Vec::new(),
        medicines,
        stores,
        supplies,
    }
}

/// Minimal dataset for `seed reset`: one admin and one store.
pub fn reset_fixtures(admin_email: &str, admin_password: &NewPassword) -> anyhow::Result<FixtureSet> {
    Ok(FixtureSet {
        users: vec![NewUser {
            name: "Administrator".into(),
            email: admin_email.trim().to_lowercase(),
            password_hash: admin_password.hash()?,
            role: Role::Admin,
        }],
        stores: vec![store("Main Store", "1 Main Street", "Springfield", "+1-555-0001", "LIC-0001")],
        ..FixtureSet::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        medicines::repo::MedicineRepo, memory::MemoryRepository, stores::repo::StoreRepo,
        supplies::repo::SupplyRepo, supplies::repo_types::SupplyFilter, users::repo::UserRepo,
    };

    #[tokio::test]
    async fn sample_load_restarts_inventory_ids() {
        let repo = MemoryRepository::new();
        for _ in 0..3 {
            repo.create_store(sample_fixtures().stores.remove(0)).await.unwrap();
        }

        let report = repo
            .load_fixtures(ResetScope::Inventory, sample_fixtures())
            .await
            .unwrap();
        assert_eq!(report.medicines, 8);
        assert_eq!(report.supplies, 7);

        let stores = repo.list_stores().await.unwrap();
        let mut ids: Vec<i32> = stores.iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);

        let supplies = repo.list_supplies(SupplyFilter::default()).await.unwrap();
        assert!(supplies.iter().any(|s| s.medicine_name == "Aspirin" && s.store_name == "Hilltop Drugstore"));
    }

    #[tokio::test]
    async fn empty_inventory_load_makes_next_insert_id_one() {
        let repo = MemoryRepository::new();
        for m in sample_fixtures().medicines.into_iter().take(2) {
            repo.create_medicine(m).await.unwrap();
        }
        repo.load_fixtures(ResetScope::Inventory, FixtureSet::default())
            .await
            .unwrap();

        let next = repo
            .create_medicine(sample_fixtures().medicines.remove(0))
            .await
            .unwrap();
        assert_eq!(next.id, 1);
    }

    #[tokio::test]
    async fn reset_leaves_admin_and_store_with_id_one() {
        let repo = MemoryRepository::new();
        repo.load_fixtures(ResetScope::Inventory, sample_fixtures())
            .await
            .unwrap();

        let set = reset_fixtures("Admin@Example.com", &NewPassword::parse("admin-password").unwrap()).unwrap();
        repo.load_fixtures(ResetScope::All, set).await.unwrap();

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[0].email, "admin@example.com");
        assert_eq!(users[0].role, Role::Admin);

        let stores = repo.list_stores().await.unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].id, 1);
        assert!(repo.list_supplies(SupplyFilter::default()).await.unwrap().is_empty());
    }

    #[test]
    fn resolve_rejects_dangling_indexes() {
        assert_eq!(resolve(&[4, 9], 1, "store").unwrap(), 9);
        assert!(resolve(&[4, 9], 2, "store").is_err());
    }
}
