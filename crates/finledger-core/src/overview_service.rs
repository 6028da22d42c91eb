//! Dashboard overview of the current month.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use finledger_domain::{
    accumulate, checked_balance, checked_sum, rules, total_amount, DateWindow, Expense, OwnerId,
    Period, SavingGoal,
};

use crate::{
    aggregation_service::{group_by_name, name_index, GroupLabels},
    storage::LedgerStore,
    CoreResult,
};

pub const TOP_EXPENSES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverviewTotals {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// Sum of every goal's running total, not only this month's contributions.
    pub total_savings: Decimal,
    pub balance: Decimal,
    /// Savings as a percentage of income; zero without income.
    pub savings_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub period: Period,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub period: Period,
    pub totals: OverviewTotals,
    pub expense_by_category: BTreeMap<String, Decimal>,
    pub top_expenses: Vec<Expense>,
    /// Oldest first, ending with the current period.
    pub history: Vec<PeriodTotals>,
    pub goals: Vec<SavingGoal>,
}

pub struct OverviewService;

impl OverviewService {
    pub fn current_month(
        store: &dyn LedgerStore,
        owner: OwnerId,
        today: NaiveDate,
        labels: &GroupLabels,
        history_months: u32,
    ) -> CoreResult<Overview> {
        let period = Period::containing(today);
        let window = period.bounds();

        let incomes = store.incomes_between(owner, window)?;
        let expenses = store.expenses_between(owner, window)?;
        let goals = store.saving_goals(owner)?;
        let names = name_index(&store.categories(owner)?);

        let total_income = total_amount(&incomes)?;
        let total_expenses = total_amount(&expenses)?;
        let total_savings = checked_sum(goals.iter().map(|goal| goal.current_amount))?;
        let balance = checked_balance(total_income, total_expenses, total_savings)?;
        let savings_rate = if total_income > Decimal::ZERO {
            total_savings / total_income * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let mut top_expenses = expenses.clone();
        top_expenses.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.date.cmp(&b.date)));
        top_expenses.truncate(TOP_EXPENSES);

        Ok(Overview {
            period,
            totals: OverviewTotals {
                total_income,
                total_expenses,
                total_savings,
                balance,
                savings_rate,
            },
            expense_by_category: group_by_name(&expenses, &names, &labels.uncategorized)?,
            top_expenses,
            history: Self::history(store, owner, period, history_months)?,
            goals,
        })
    }

    fn history(
        store: &dyn LedgerStore,
        owner: OwnerId,
        current: Period,
        months: u32,
    ) -> CoreResult<Vec<PeriodTotals>> {
        let months = rules::clamp_history_months(months) as i32;
        let first = current.offset(1 - months)?;
        let window = DateWindow {
            start: first.first_day(),
            end: current.last_day(),
        };
        let mut totals = BTreeMap::new();
        for step in 0..months {
            let period = first.offset(step)?;
            totals.insert(
                period,
                PeriodTotals {
                    period,
                    income: Decimal::ZERO,
                    expenses: Decimal::ZERO,
                },
            );
        }

        for income in store.incomes_between(owner, window)? {
            if let Some(slot) = totals.get_mut(&Period::containing(income.date)) {
                accumulate(&mut slot.income, income.amount)?;
            }
        }
        for expense in store.expenses_between(owner, window)? {
            if let Some(slot) = totals.get_mut(&Period::containing(expense.date)) {
                accumulate(&mut slot.expenses, expense.amount)?;
            }
        }
        Ok(totals.into_values().collect())
    }
}
