use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Duration};

use crate::medicines::repo_types::Medicine;

/// Inputs of a dashboard summary, resolved from configuration by the caller.
#[derive(Debug, Clone, Copy)]
pub struct SummaryParams {
    pub today: Date,
    pub low_stock_threshold: i32,
    pub expiry_warning_days: i64,
}

impl SummaryParams {
    /// Last date (inclusive) that counts as "expiring soon".
    pub fn expiry_cutoff(&self) -> Date {
        self.today
            .checked_add(Duration::days(self.expiry_warning_days))
            .unwrap_or(Date::MAX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub medicines: i64,
    pub stores: i64,
    pub supplies: i64,
    pub users: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAlert {
    pub id: i32,
    pub name: String,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryAlert {
    pub id: i32,
    pub name: String,
    pub batch_number: String,
    #[serde(with = "crate::dates::iso_date")]
    pub expiry_date: Date,
    pub days_left: i64,
}

impl ExpiryAlert {
    pub fn new(id: i32, name: String, batch_number: String, expiry_date: Date, today: Date) -> Self {
        Self {
            id,
            name,
            batch_number,
            expiry_date,
            days_left: (expiry_date - today).whole_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub counts: EntityCounts,
    pub total_stock_units: i64,
    pub inventory_value: Decimal,
    pub expired_count: i64,
    pub low_stock_threshold: i32,
    pub expiry_warning_days: i64,
    /// Lowest stock first.
    pub low_stock: Vec<StockAlert>,
    /// Soonest expiry first; already expired medicines are excluded.
    pub expiring_soon: Vec<ExpiryAlert>,
}

/// Σ price × stock; `None` when the total does not fit a `Decimal`.
pub fn inventory_value(medicines: &[Medicine]) -> Option<Decimal> {
    medicines.iter().try_fold(Decimal::ZERO, |acc, m| {
        m.price
            .checked_mul(Decimal::from(m.stock_quantity))
            .and_then(|line| acc.checked_add(line))
    })
}

/// Builds the summary from a full medicine listing.
pub fn summarize(
    medicines: &[Medicine],
    counts: EntityCounts,
    params: SummaryParams,
) -> anyhow::Result<InventorySummary> {
    let inventory_value = inventory_value(medicines)
        .ok_or_else(|| anyhow::anyhow!("inventory value overflowed"))?;
    let cutoff = params.expiry_cutoff();

    let mut low_stock: Vec<StockAlert> = medicines
        .iter()
        .filter(|m| m.stock_quantity <= params.low_stock_threshold)
        .map(|m| StockAlert {
            id: m.id,
            name: m.name.clone(),
            stock_quantity: m.stock_quantity,
        })
        .collect();
    low_stock.sort_by(|a, b| {
        a.stock_quantity
            .cmp(&b.stock_quantity)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut expiring_soon: Vec<ExpiryAlert> = medicines
        .iter()
        .filter(|m| m.expiry_date >= params.today && m.expiry_date <= cutoff)
        .map(|m| {
            ExpiryAlert::new(
                m.id,
                m.name.clone(),
                m.batch_number.clone(),
                m.expiry_date,
                params.today,
            )
        })
        .collect();
    expiring_soon.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.id.cmp(&b.id)));

    Ok(InventorySummary {
        counts,
        total_stock_units: medicines.iter().map(|m| i64::from(m.stock_quantity)).sum(),
        inventory_value,
        expired_count: medicines.iter().filter(|m| m.expiry_date < params.today).count() as i64,
        low_stock_threshold: params.low_stock_threshold,
        expiry_warning_days: params.expiry_warning_days,
        low_stock,
        expiring_soon,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::{macros::date, OffsetDateTime};

    use super::*;

    fn medicine(id: i32, name: &str, stock: i32, price: i64, expiry: Date) -> Medicine {
        Medicine {
            id,
            name: name.into(),
            manufacturer: "Acme".into(),
            batch_number: format!("B-{id}"),
            manufacture_date: date!(2024 - 01 - 01),
            expiry_date: expiry,
            price: Decimal::new(price, 2),
            stock_quantity: stock,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn summary_totals_and_alerts() {
        let params = SummaryParams {
            today: date!(2025 - 06 - 01),
            low_stock_threshold: 10,
            expiry_warning_days: 30,
        };
        let meds = vec![
            medicine(1, "Amoxicillin", 5, 250, date!(2025 - 06 - 20)),
            medicine(2, "Cetirizine", 100, 100, date!(2027 - 01 - 01)),
            medicine(3, "Aspirin", 10, 50, date!(2025 - 05 - 01)),
            medicine(4, "Zinc", 40, 10, date!(2025 - 07 - 01)),
        ];

        let s = summarize(&meds, EntityCounts::default(), params).unwrap();
        assert_eq!(s.total_stock_units, 155);
        // 5*2.50 + 100*1.00 + 10*0.50 + 40*0.10
        assert_eq!(s.inventory_value, Decimal::new(12150, 2));
        assert_eq!(s.expired_count, 1);

        let low: Vec<i32> = s.low_stock.iter().map(|a| a.id).collect();
        assert_eq!(low, vec![1, 3]);

        let soon: Vec<(i32, i64)> = s.expiring_soon.iter().map(|a| (a.id, a.days_left)).collect();
        assert_eq!(soon, vec![(1, 19), (4, 30)]);
    }

    #[test]
    fn overflowing_inventory_value_is_an_error() {
        let params = SummaryParams {
            today: date!(2025 - 06 - 01),
            low_stock_threshold: 10,
            expiry_warning_days: 30,
        };
        let mut huge = medicine(1, "Gold", 2, 0, date!(2027 - 01 - 01));
        huge.price = Decimal::MAX;

        assert_eq!(inventory_value(&[huge.clone()]), None);
        assert!(summarize(&[huge], EntityCounts::default(), params).is_err());
    }
}
