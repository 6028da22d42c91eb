//! Rule-based hints derived from current and previous month activity.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use finledger_domain::{accumulate, total_amount, AmountOverflow, Expense, OwnerId, Period};

use crate::{
    aggregation_service::name_index, health_service::default_emergency_fund_keywords,
    storage::LedgerStore, CoreResult,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRules {
    /// Percentage growth over last month that flags a category.
    pub high_spend_increase_pct: Decimal,
    pub low_savings_rate_pct: Decimal,
    pub high_savings_rate_pct: Decimal,
    pub emergency_fund_keywords: Vec<String>,
}

impl Default for InsightRules {
    fn default() -> Self {
        Self {
            high_spend_increase_pct: Decimal::from(20),
            low_savings_rate_pct: Decimal::from(10),
            high_savings_rate_pct: Decimal::from(30),
            emergency_fund_keywords: default_emergency_fund_keywords(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Success,
    Info,
}

/// Suggested follow-up: a label and the screen it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightAction {
    pub label: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<InsightAction>,
}

impl Insight {
    fn new(id: impl Into<String>, kind: InsightKind, title: String, description: String) -> Self {
        Self {
            id: id.into(),
            kind,
            title,
            description,
            action: None,
        }
    }

    fn with_action(mut self, label: &str, target: &str) -> Self {
        self.action = Some(InsightAction {
            label: label.into(),
            target: target.into(),
        });
        self
    }
}

fn by_category(expenses: &[Expense]) -> Result<HashMap<Uuid, Decimal>, AmountOverflow> {
    let mut totals = HashMap::new();
    for expense in expenses {
        if let Some(category) = expense.category_id {
            accumulate(totals.entry(category).or_insert(Decimal::ZERO), expense.amount)?;
        }
    }
    Ok(totals)
}

pub struct InsightService;

impl InsightService {
    pub fn insights(
        store: &dyn LedgerStore,
        owner: OwnerId,
        today: NaiveDate,
        rules: &InsightRules,
    ) -> CoreResult<Vec<Insight>> {
        let period = Period::containing(today);
        let month_to_date = period.bounds().through(today);
        let current = store.expenses_between(owner, month_to_date)?;
        let previous = store.expenses_between(owner, period.previous()?.bounds())?;
        let names = name_index(&store.categories(owner)?);

        let mut insights = Vec::new();

        let hundred = Decimal::ONE_HUNDRED;
        let growth = Decimal::ONE + rules.high_spend_increase_pct / hundred;
        let previous_totals = by_category(&previous)?;
        // Sorted so the output order is stable across runs.
        let current_totals: BTreeMap<Uuid, Decimal> = by_category(&current)?.into_iter().collect();
        for (category, amount) in current_totals {
            let before = previous_totals.get(&category).copied().unwrap_or_default();
            let over_limit = before
                .checked_mul(growth)
                .map_or(false, |limit| amount > limit);
            if before > Decimal::ZERO && over_limit {
                let name = names
                    .get(&category)
                    .map(String::as_str)
                    .unwrap_or("Unknown");
                insights.push(
                    Insight::new(
                        format!("high-spend-{category}"),
                        InsightKind::Warning,
                        format!("High spending on {name}"),
                        format!(
                            "You have spent over {}% more on {name} than last month.",
                            rules.high_spend_increase_pct.normalize()
                        ),
                    )
                    .with_action("Review budget", "/budget"),
                );
            }
        }

        let income = total_amount(&store.incomes_between(owner, month_to_date)?)?;
        let expenses = total_amount(&current)?;
        if income > Decimal::ZERO {
            let rate = (income - expenses)
                .checked_div(income)
                .and_then(|share| share.checked_mul(hundred))
                .ok_or(AmountOverflow)?;
            if rate < rules.low_savings_rate_pct && expenses > Decimal::ZERO {
                insights.push(
                    Insight::new(
                        "low-savings",
                        InsightKind::Info,
                        "Savings opportunity".into(),
                        format!(
                            "Your savings rate is below {}%. Try trimming small recurring expenses.",
                            rules.low_savings_rate_pct.normalize()
                        ),
                    )
                    .with_action("View expenses", "/expenses"),
                );
            } else if rate > rules.high_savings_rate_pct {
                insights.push(Insight::new(
                    "high-savings",
                    InsightKind::Success,
                    "Excellent savings".into(),
                    format!(
                        "You are saving more than {}% of your income. Keep it up!",
                        rules.high_savings_rate_pct.normalize()
                    ),
                ));
            }
        }

        let mut has_fund = false;
        for keyword in rules.emergency_fund_keywords.iter().filter(|k| !k.trim().is_empty()) {
            if !store.goals_matching(owner, keyword)?.is_empty() {
                has_fund = true;
                break;
            }
        }
        if !has_fund {
            insights.push(
                Insight::new(
                    "no-emergency-fund",
                    InsightKind::Info,
                    "Emergency fund".into(),
                    "You have no emergency fund goal. Three to six months of expenses is recommended."
                        .into(),
                )
                .with_action("Create goal", "/"),
            );
        }

        Ok(insights)
    }
}
