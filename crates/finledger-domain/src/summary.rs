//! Immutable month-end snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, period::Period};

/// Grouped breakdown stored alongside a summary's totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotData {
    pub income_by_branch: BTreeMap<String, Decimal>,
    pub expense_by_category: BTreeMap<String, Decimal>,
}

/// Closing record for one `(owner, period)`. Its existence marks the period closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySummary {
    pub id: Uuid,
    pub owner: OwnerId,
    pub period: Period,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_savings: Decimal,
    pub balance: Decimal,
    pub snapshot_data: SnapshotData,
    pub created_at: DateTime<Utc>,
}

impl MonthlySummary {
    /// Builds a summary; `balance` is always `income - expenses - savings`.
    pub fn new(
        owner: OwnerId,
        period: Period,
        total_income: Decimal,
        total_expenses: Decimal,
        total_savings: Decimal,
        snapshot_data: SnapshotData,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            period,
            total_income,
            total_expenses,
            total_savings,
            balance: total_income - total_expenses - total_savings,
            snapshot_data,
            created_at,
        }
    }
}

impl Identifiable for MonthlySummary {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for MonthlySummary {
    fn owner(&self) -> OwnerId {
        self.owner
    }
}
