//! Financial health heuristics: 50/30/20 split and emergency fund coverage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finledger_domain::{
    rules::{
        clamp_history_months, keywords, DEFAULT_EMERGENCY_FUND_MONTHS,
        DEFAULT_EXPENSE_HISTORY_MONTHS, EMERGENCY_FUND_KEYWORDS, NEEDS_KEYWORDS,
        SAVINGS_KEYWORDS,
    },
    accumulate, total_amount, AmountOverflow, DateWindow, LedgerEntry, OwnerId, Period,
};

use crate::{aggregation_service::name_index, storage::LedgerStore, CoreResult};

/// Keyword lists and horizons driving the health heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRules {
    pub needs_keywords: Vec<String>,
    pub savings_keywords: Vec<String>,
    pub emergency_fund_keywords: Vec<String>,
    pub emergency_fund_months: u32,
    pub expense_history_months: u32,
}

impl Default for HealthRules {
    fn default() -> Self {
        Self {
            needs_keywords: default_needs_keywords(),
            savings_keywords: default_savings_keywords(),
            emergency_fund_keywords: default_emergency_fund_keywords(),
            emergency_fund_months: DEFAULT_EMERGENCY_FUND_MONTHS,
            expense_history_months: DEFAULT_EXPENSE_HISTORY_MONTHS,
        }
    }
}

pub fn default_needs_keywords() -> Vec<String> {
    keywords(NEEDS_KEYWORDS)
}

pub fn default_savings_keywords() -> Vec<String> {
    keywords(SAVINGS_KEYWORDS)
}

pub fn default_emergency_fund_keywords() -> Vec<String> {
    keywords(EMERGENCY_FUND_KEYWORDS)
}

/// Current-month expenses bucketed by category keywords, next to income.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetSplit {
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
    pub total_income: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmergencyFund {
    pub current: Decimal,
    pub target: Decimal,
    pub average_monthly_expenses: Decimal,
    pub months_covered: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialHealth {
    pub split: BudgetSplit,
    pub emergency_fund: EmergencyFund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Needs,
    Wants,
    Savings,
}

fn classify(category: &str, rules: &HealthRules) -> Bucket {
    let name = category.to_lowercase();
    let hit = |keywords: &[String]| {
        keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && name.contains(&keyword.to_lowercase()))
    };
    if hit(&rules.needs_keywords) {
        Bucket::Needs
    } else if hit(&rules.savings_keywords) {
        Bucket::Savings
    } else {
        Bucket::Wants
    }
}

pub struct HealthService;

impl HealthService {
    pub fn assess(
        store: &dyn LedgerStore,
        owner: OwnerId,
        today: NaiveDate,
        rules: &HealthRules,
    ) -> CoreResult<FinancialHealth> {
        let period = Period::containing(today);
        let month_to_date = period.bounds().through(today);

        let expenses = store.expenses_between(owner, month_to_date)?;
        let incomes = store.incomes_between(owner, month_to_date)?;
        let names = name_index(&store.categories(owner)?);

        let mut split = BudgetSplit {
            total_income: total_amount(&incomes)?,
            ..BudgetSplit::default()
        };
        for expense in &expenses {
            let category = expense
                .group_id()
                .and_then(|id| names.get(&id))
                .map(String::as_str)
                .unwrap_or_default();
            let slot = match classify(category, rules) {
                Bucket::Needs => &mut split.needs,
                Bucket::Wants => &mut split.wants,
                Bucket::Savings => &mut split.savings,
            };
            accumulate(slot, expense.amount)?;
        }

        let months = clamp_history_months(rules.expense_history_months);
        let history_start = period.offset(-(months as i32))?.first_day();
        let history = store.expenses_between(
            owner,
            DateWindow {
                start: history_start,
                end: today.max(history_start),
            },
        )?;
        let mut average = total_amount(&history)? / Decimal::from(months);
        if average.is_zero() {
            average = split.needs.checked_add(split.wants).ok_or(AmountOverflow)?;
        }

        let mut current = Decimal::ZERO;
        for keyword in rules.emergency_fund_keywords.iter().filter(|k| !k.trim().is_empty()) {
            if let Some(goal) = store.goals_matching(owner, keyword)?.into_iter().next() {
                current = goal.current_amount;
                break;
            }
        }

        let target = average
            .checked_mul(Decimal::from(rules.emergency_fund_months))
            .ok_or(AmountOverflow)?;
        let months_covered = if average.is_zero() {
            Decimal::ZERO
        } else {
            current.checked_div(average).ok_or(AmountOverflow)?
        };

        Ok(FinancialHealth {
            split,
            emergency_fund: EmergencyFund {
                current,
                target,
                average_monthly_expenses: average,
                months_covered,
            },
        })
    }
}
