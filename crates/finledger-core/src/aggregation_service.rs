//! Period aggregation: totals and grouped breakdowns over one month of ledger rows.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finledger_domain::{
    accumulate, checked_balance, checked_sum, total_amount, AmountOverflow, Identifiable,
    LedgerEntry, NamedEntity, OwnerId, Period, SnapshotData,
};

use crate::{storage::LedgerStore, CoreError, CoreResult};

/// Labels used when a row's category or branch cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabels {
    pub uncategorized: String,
}

impl Default for GroupLabels {
    fn default() -> Self {
        Self {
            uncategorized: "Uncategorized".into(),
        }
    }
}

/// Totals and grouped sums for one `(owner, period)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    pub period: Period,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_savings: Decimal,
    /// `total_income - total_expenses - total_savings`.
    pub balance: Decimal,
    pub income_by_group: BTreeMap<String, Decimal>,
    pub expense_by_group: BTreeMap<String, Decimal>,
}

impl PeriodAggregate {

    pub fn snapshot(&self) -> SnapshotData {
        SnapshotData {
            income_by_branch: self.income_by_group.clone(),
            expense_by_category: self.expense_by_group.clone(),
        }
    }
}

pub struct AggregationService;

impl AggregationService {
    /// Reads every income, expense and goal contribution of `owner` dated inside `period`.
    ///
    /// Contributions have no owner column, so the owner's goal ids are resolved first.
    /// Any read failure aborts with [`CoreError::AggregationReadFailure`].
    pub fn aggregate(
        store: &dyn LedgerStore,
        owner: OwnerId,
        period: Period,
        labels: &GroupLabels,
    ) -> CoreResult<PeriodAggregate> {
        let read_failure = |source| CoreError::AggregationReadFailure { period, source };
        let window = period.bounds();

        let incomes = store.incomes_between(owner, window).map_err(read_failure)?;
        let expenses = store.expenses_between(owner, window).map_err(read_failure)?;
        let branches = store.income_branches(owner).map_err(read_failure)?;
        let categories = store.categories(owner).map_err(read_failure)?;

        let goal_ids: Vec<Uuid> = store
            .saving_goals(owner)
            .map_err(read_failure)?
            .iter()
            .map(Identifiable::id)
            .collect();
        let total_savings = if goal_ids.is_empty() {
            Decimal::ZERO
        } else {
            checked_sum(
                store
                    .contributions_between(&goal_ids, window)
                    .map_err(read_failure)?
                    .iter()
                    .map(|contribution| contribution.amount),
            )?
        };

        let branch_names = name_index(&branches);
        let category_names = name_index(&categories);

        let total_income = total_amount(&incomes)?;
        let total_expenses = total_amount(&expenses)?;
        Ok(PeriodAggregate {
            period,
            total_income,
            total_expenses,
            total_savings,
            balance: checked_balance(total_income, total_expenses, total_savings)?,
            income_by_group: group_by_name(&incomes, &branch_names, &labels.uncategorized)?,
            expense_by_group: group_by_name(&expenses, &category_names, &labels.uncategorized)?,
        })
    }
}

/// Maps entity ids to their display names.
pub fn name_index<T: Identifiable + NamedEntity>(items: &[T]) -> HashMap<Uuid, String> {
    items
        .iter()
        .map(|item| (item.id(), item.name().to_string()))
        .collect()
}

/// Sums entries per resolved group name. Groups sharing a display name merge.
pub fn group_by_name<E: LedgerEntry>(
    entries: &[E],
    names: &HashMap<Uuid, String>,
    fallback: &str,
) -> Result<BTreeMap<String, Decimal>, AmountOverflow> {
    let mut groups = BTreeMap::new();
    for entry in entries {
        let name = entry
            .group_id()
            .and_then(|id| names.get(&id))
            .map(String::as_str)
            .unwrap_or(fallback);
        accumulate(groups.entry(name.to_string()).or_insert(Decimal::ZERO), entry.amount())?;
    }
    Ok(groups)
}
