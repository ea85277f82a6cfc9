//! In-process repository used by tests and `REPOSITORY=memory`.
//!
//! Mirrors the Postgres schema rules: serial ids, unique user emails,
//! foreign keys with cascading deletes and the same list orderings.

use std::cmp::Reverse;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;

use crate::{
    analytics::{
        repo::AnalyticsRepo,
        repo_types::{summarize, EntityCounts, InventorySummary, SummaryParams},
    },
    db::{RepoError, RepoResult, EMAIL_TAKEN, UNKNOWN_MEDICINE, UNKNOWN_STORE, UNKNOWN_USER},
    medicines::{
        repo::MedicineRepo,
        repo_types::{Medicine, MedicineChanges, MedicineFilter, NewMedicine},
    },
    orders::{
        repo::OrderRepo,
        repo_types::{NewOrder, Order, OrderChanges, OrderFilter},
    },
    seed::{resolve, FixtureRepo, FixtureSet, ResetScope, SeedReport},
    stores::{
        repo::StoreRepo,
        repo_types::{MedicalStore, NewStore, StoreChanges},
    },
    supplies::{
        repo::SupplyRepo,
        repo_types::{NewSupply, SupplyChanges, SupplyDetails, SupplyFilter},
    },
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User, UserChanges},
    },
};

#[derive(Debug, Clone)]
struct SupplyRecord {
    id: i32,
    medicine_id: i32,
    store_id: i32,
    quantity: i32,
    supply_date: Date,
    created_at: OffsetDateTime,
}

/// Last id handed out per table.
#[derive(Debug, Default)]
struct Sequences {
    users: i32,
    medicines: i32,
    stores: i32,
    supplies: i32,
    orders: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    medicines: Vec<Medicine>,
    stores: Vec<MedicalStore>,
    supplies: Vec<SupplyRecord>,
    orders: Vec<Order>,
    seq: Sequences,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_medicine(&self, id: i32) -> RepoResult<()> {
        if self.medicines.iter().any(|m| m.id == id) {
            Ok(())
        } else {
            Err(RepoError::ForeignKeyViolation(UNKNOWN_MEDICINE.into()))
        }
    }

    fn check_store(&self, id: i32) -> RepoResult<()> {
        if self.stores.iter().any(|s| s.id == id) {
            Ok(())
        } else {
            Err(RepoError::ForeignKeyViolation(UNKNOWN_STORE.into()))
        }
    }

    fn check_user(&self, id: i32) -> RepoResult<()> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(RepoError::ForeignKeyViolation(UNKNOWN_USER.into()))
        }
    }

    fn details(&self, s: &SupplyRecord) -> Option<SupplyDetails> {
        let medicine = self.medicines.iter().find(|m| m.id == s.medicine_id)?;
        let store = self.stores.iter().find(|st| st.id == s.store_id)?;
        Some(SupplyDetails {
            id: s.id,
            medicine_id: s.medicine_id,
            medicine_name: medicine.name.clone(),
            store_id: s.store_id,
            store_name: store.name.clone(),
            quantity: s.quantity,
            supply_date: s.supply_date,
            created_at: s.created_at,
        })
    }

    fn insert_user(&mut self, new: NewUser) -> RepoResult<User> {
        if self.email_taken(&new.email, None) {
            return Err(RepoError::UniqueViolation(EMAIL_TAKEN.into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: next(&mut self.seq.users),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn insert_medicine(&mut self, new: NewMedicine) -> Medicine {
        let now = OffsetDateTime::now_utc();
        let medicine = Medicine {
            id: next(&mut self.seq.medicines),
            name: new.name,
            manufacturer: new.manufacturer,
            batch_number: new.batch_number,
            manufacture_date: new.manufacture_date,
            expiry_date: new.expiry_date,
            price: new.price,
            stock_quantity: new.stock_quantity,
            created_at: now,
            updated_at: now,
        };
        self.medicines.push(medicine.clone());
        medicine
    }

    fn insert_store(&mut self, new: NewStore) -> MedicalStore {
        let now = OffsetDateTime::now_utc();
        let store = MedicalStore {
            id: next(&mut self.seq.stores),
            name: new.name,
            address: new.address,
            city: new.city,
            phone: new.phone,
            email: new.email,
            license_number: new.license_number,
            created_at: now,
            updated_at: now,
        };
        self.stores.push(store.clone());
        store
    }

    fn insert_supply(&mut self, new: NewSupply) -> RepoResult<SupplyRecord> {
        self.check_medicine(new.medicine_id)?;
        self.check_store(new.store_id)?;
        let record = SupplyRecord {
            id: next(&mut self.seq.supplies),
            medicine_id: new.medicine_id,
            store_id: new.store_id,
            quantity: new.quantity,
            supply_date: new.supply_date,
            created_at: OffsetDateTime::now_utc(),
        };
        self.supplies.push(record.clone());
        Ok(record)
    }

    fn clear_inventory(&mut self) {
        self.supplies.clear();
        self.orders.clear();
        self.medicines.clear();
        self.stores.clear();
        self.seq.supplies = 0;
        self.seq.orders = 0;
        self.seq.medicines = 0;
        self.seq.stores = 0;
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryRepository {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let t = self.tables.lock().await;
        let mut users = t.users.clone();
        users.sort_by_key(|u| Reverse((u.created_at, u.id)));
        Ok(users)
    }

    async fn find_user(&self, id: i32) -> RepoResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        self.tables.lock().await.insert_user(new)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut t = self.tables.lock().await;
        if let Some(email) = &changes.email {
            if t.email_taken(email, Some(id)) {
                return Err(RepoError::UniqueViolation(EMAIL_TAKEN.into()));
            }
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(active) = changes.is_active {
            user.is_active = active;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> RepoResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        t.orders.retain(|o| o.user_id != id);
        Ok(true)
    }

    async fn toggle_user_active(&self, id: i32) -> RepoResult<Option<User>> {
        let mut t = self.tables.lock().await;
        Ok(t.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.is_active = !user.is_active;
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        }))
    }
}

#[async_trait]
impl MedicineRepo for MemoryRepository {
    async fn list_medicines(&self, filter: MedicineFilter) -> RepoResult<Vec<Medicine>> {
        let t = self.tables.lock().await;
        let page = filter.page.clamped();
        let mut rows: Vec<Medicine> = t
            .medicines
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn find_medicine(&self, id: i32) -> RepoResult<Option<Medicine>> {
        let t = self.tables.lock().await;
        Ok(t.medicines.iter().find(|m| m.id == id).cloned())
    }

    async fn create_medicine(&self, new: NewMedicine) -> RepoResult<Medicine> {
        Ok(self.tables.lock().await.insert_medicine(new))
    }

    async fn update_medicine(
        &self,
        id: i32,
        changes: MedicineChanges,
    ) -> RepoResult<Option<Medicine>> {
        let mut t = self.tables.lock().await;
        let Some(m) = t.medicines.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            m.name = v;
        }
        if let Some(v) = changes.manufacturer {
            m.manufacturer = v;
        }
        if let Some(v) = changes.batch_number {
            m.batch_number = v;
        }
        if let Some(v) = changes.manufacture_date {
            m.manufacture_date = v;
        }
        if let Some(v) = changes.expiry_date {
            m.expiry_date = v;
        }
        if let Some(v) = changes.price {
            m.price = v;
        }
        if let Some(v) = changes.stock_quantity {
            m.stock_quantity = v;
        }
        m.updated_at = OffsetDateTime::now_utc();
        Ok(Some(m.clone()))
    }

    async fn delete_medicine(&self, id: i32) -> RepoResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.medicines.len();
        t.medicines.retain(|m| m.id != id);
        if t.medicines.len() == before {
            return Ok(false);
        }
        t.supplies.retain(|s| s.medicine_id != id);
        t.orders.retain(|o| o.medicine_id != id);
        Ok(true)
    }
}

#[async_trait]
impl StoreRepo for MemoryRepository {
    async fn list_stores(&self) -> RepoResult<Vec<MedicalStore>> {
        let t = self.tables.lock().await;
        let mut rows = t.stores.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_store(&self, id: i32) -> RepoResult<Option<MedicalStore>> {
        let t = self.tables.lock().await;
        Ok(t.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn create_store(&self, new: NewStore) -> RepoResult<MedicalStore> {
        Ok(self.tables.lock().await.insert_store(new))
    }

    async fn update_store(
        &self,
        id: i32,
        changes: StoreChanges,
    ) -> RepoResult<Option<MedicalStore>> {
        let mut t = self.tables.lock().await;
        let Some(s) = t.stores.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.name {
            s.name = v;
        }
        if let Some(v) = changes.address {
            s.address = v;
        }
        if let Some(v) = changes.city {
            s.city = v;
        }
        if let Some(v) = changes.phone {
            s.phone = v;
        }
        if let Some(v) = changes.email {
            s.email = v;
        }
        if let Some(v) = changes.license_number {
            s.license_number = v;
        }
        s.updated_at = OffsetDateTime::now_utc();
        Ok(Some(s.clone()))
    }

    async fn delete_store(&self, id: i32) -> RepoResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.stores.len();
        t.stores.retain(|s| s.id != id);
        if t.stores.len() == before {
            return Ok(false);
        }
        t.supplies.retain(|s| s.store_id != id);
        Ok(true)
    }
}

#[async_trait]
impl SupplyRepo for MemoryRepository {
    async fn list_supplies(&self, filter: SupplyFilter) -> RepoResult<Vec<SupplyDetails>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<SupplyDetails> = t
            .supplies
            .iter()
            .filter(|s| filter.matches(s.medicine_id, s.store_id))
            .filter_map(|s| t.details(s))
            .collect();
        rows.sort_by_key(|s| Reverse((s.supply_date, s.id)));
        Ok(rows)
    }

    async fn find_supply(&self, id: i32) -> RepoResult<Option<SupplyDetails>> {
        let t = self.tables.lock().await;
        Ok(t.supplies
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| t.details(s)))
    }

    async fn create_supply(&self, new: NewSupply) -> RepoResult<SupplyDetails> {
        let mut t = self.tables.lock().await;
        let record = t.insert_supply(new)?;
        t.details(&record)
            .ok_or_else(|| anyhow::anyhow!("supply {} lost its parents", record.id).into())
    }

    async fn update_supply(
        &self,
        id: i32,
        changes: SupplyChanges,
    ) -> RepoResult<Option<SupplyDetails>> {
        let mut t = self.tables.lock().await;
        if let Some(m) = changes.medicine_id {
            t.check_medicine(m)?;
        }
        if let Some(s) = changes.store_id {
            t.check_store(s)?;
        }
        let Some(record) = t.supplies.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.medicine_id {
            record.medicine_id = v;
        }
        if let Some(v) = changes.store_id {
            record.store_id = v;
        }
        if let Some(v) = changes.quantity {
            record.quantity = v;
        }
        if let Some(v) = changes.supply_date {
            record.supply_date = v;
        }
        let record = record.clone();
        Ok(t.details(&record))
    }

    async fn delete_supply(&self, id: i32) -> RepoResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.supplies.len();
        t.supplies.retain(|s| s.id != id);
        Ok(t.supplies.len() < before)
    }
}

#[async_trait]
impl OrderRepo for MemoryRepository {
    async fn list_orders(&self, filter: OrderFilter) -> RepoResult<Vec<Order>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<Order> = t.orders.iter().filter(|o| filter.matches(o)).cloned().collect();
        rows.sort_by_key(|o| Reverse((o.created_at, o.id)));
        Ok(rows)
    }

    async fn find_order(&self, id: i32) -> RepoResult<Option<Order>> {
        let t = self.tables.lock().await;
        Ok(t.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn create_order(&self, new: NewOrder) -> RepoResult<Order> {
        let mut t = self.tables.lock().await;
        t.check_user(new.user_id)?;
        t.check_medicine(new.medicine_id)?;
        let now = OffsetDateTime::now_utc();
        let order = Order {
            id: next(&mut t.seq.orders),
            user_id: new.user_id,
            medicine_id: new.medicine_id,
            quantity: new.quantity,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        t.orders.push(order.clone());
        Ok(order)
    }

    async fn update_order(&self, id: i32, changes: OrderChanges) -> RepoResult<Option<Order>> {
        let mut t = self.tables.lock().await;
        if let Some(m) = changes.medicine_id {
            t.check_medicine(m)?;
        }
        let Some(order) = t.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.medicine_id {
            order.medicine_id = v;
        }
        if let Some(v) = changes.quantity {
            order.quantity = v;
        }
        if let Some(v) = changes.status {
            order.status = v;
        }
        order.updated_at = OffsetDateTime::now_utc();
        Ok(Some(order.clone()))
    }

    async fn delete_order(&self, id: i32) -> RepoResult<bool> {
        let mut t = self.tables.lock().await;
        let before = t.orders.len();
        t.orders.retain(|o| o.id != id);
        Ok(t.orders.len() < before)
    }
}

#[async_trait]
impl AnalyticsRepo for MemoryRepository {
    async fn inventory_summary(&self, params: SummaryParams) -> RepoResult<InventorySummary> {
        let t = self.tables.lock().await;
        let counts = EntityCounts {
            medicines: t.medicines.len() as i64,
            stores: t.stores.len() as i64,
            supplies: t.supplies.len() as i64,
            users: t.users.len() as i64,
            orders: t.orders.len() as i64,
        };
        Ok(summarize(&t.medicines, counts, params)?)
    }
}

#[async_trait]
impl FixtureRepo for MemoryRepository {
    async fn load_fixtures(&self, scope: ResetScope, set: FixtureSet) -> RepoResult<SeedReport> {
        let mut guard = self.tables.lock().await;
        // Build on a copy so a failed load leaves the tables untouched.
        let mut t = Tables {
            users: guard.users.clone(),
            seq: Sequences {
                users: guard.seq.users,
                ..Sequences::default()
            },
            ..Tables::default()
        };
        t.clear_inventory();
        if scope == ResetScope::All {
            t.users.clear();
            t.seq.users = 0;
        }

        let report = set.report();
        for user in set.users {
            t.insert_user(user)?;
        }
        let medicine_ids: Vec<i32> = set
            .medicines
            .into_iter()
            .map(|m| t.insert_medicine(m).id)
            .collect();
        let store_ids: Vec<i32> = set.stores.into_iter().map(|s| t.insert_store(s).id).collect();
        for link in set.supplies {
            t.insert_supply(NewSupply {
                medicine_id: resolve(&medicine_ids, link.medicine, "medicine")?,
                store_id: resolve(&store_ids, link.store, "store")?,
                quantity: link.quantity,
                supply_date: link.supply_date,
            })?;
        }

        *guard = t;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use super::*;
    use crate::auth::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::Employer,
        }
    }

    fn new_medicine(name: &str) -> NewMedicine {
        NewMedicine {
            name: name.into(),
            manufacturer: "Acme".into(),
            batch_number: "B1".into(),
            manufacture_date: date!(2024 - 01 - 01),
            expiry_date: date!(2026 - 01 - 01),
            price: Decimal::new(100, 2),
            stock_quantity: 10,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let repo = MemoryRepository::new();
        let first = repo.create_user(new_user("a@x.io")).await.unwrap();
        let err = repo.create_user(new_user("a@x.io")).await.unwrap_err();
        assert!(matches!(err, RepoError::UniqueViolation(ref m) if m == EMAIL_TAKEN));

        let second = repo.create_user(new_user("b@x.io")).await.unwrap();
        let err = repo
            .update_user(
                second.id,
                UserChanges {
                    email: Some(first.email.clone()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::UniqueViolation(_)));
        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_orders() {
        let repo = MemoryRepository::new();
        let user = repo.create_user(new_user("a@x.io")).await.unwrap();
        let med = repo.create_medicine(new_medicine("Aspirin")).await.unwrap();
        repo.create_order(NewOrder {
            user_id: user.id,
            medicine_id: med.id,
            quantity: 1,
            status: Default::default(),
        })
        .await
        .unwrap();

        assert!(repo.delete_user(user.id).await.unwrap());
        assert!(repo.list_orders(OrderFilter::default()).await.unwrap().is_empty());
        assert!(!repo.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_fixture_load_keeps_existing_rows() {
        let repo = MemoryRepository::new();
        repo.create_medicine(new_medicine("Kept")).await.unwrap();

        let bad = FixtureSet {
            supplies: vec![crate::seed::SupplyFixture {
                medicine: 3,
                store: 0,
                quantity: 1,
                supply_date: date!(2025 - 01 - 01),
            }],
            ..FixtureSet::default()
        };
        assert!(repo.load_fixtures(ResetScope::Inventory, bad).await.is_err());

        let meds = repo.list_medicines(MedicineFilter::default()).await.unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Kept");
    }
}
