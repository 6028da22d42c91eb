//! Run-rate projection of current-month spend and remaining amounts per goal.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use finledger_domain::{total_amount, AmountOverflow, OwnerId, Period, SavingGoal};

use crate::{storage::LedgerStore, CoreResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProjection {
    #[serde(flatten)]
    pub goal: SavingGoal,
    pub remaining: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub period: Period,
    pub current_spent: Decimal,
    pub projected_spent: Decimal,
    pub avg_daily: Decimal,
    pub days_passed: u32,
    pub days_remaining: u32,
    pub goals_projections: Vec<GoalProjection>,
}

impl Projection {
    /// Linear extrapolation: spend so far plus the daily average over the rest of the month.
    pub fn from_run_rate(
        period: Period,
        current_spent: Decimal,
        days_passed: u32,
        goals: &[SavingGoal],
    ) -> Result<Self, AmountOverflow> {
        let days_passed = days_passed.clamp(1, period.days());
        let days_remaining = period.days() - days_passed;
        let avg_daily = current_spent / Decimal::from(days_passed);
        let projected_spent = avg_daily
            .checked_mul(Decimal::from(days_remaining))
            .and_then(|rest| rest.checked_add(current_spent))
            .ok_or(AmountOverflow)?;
        Ok(Self {
            period,
            current_spent,
            projected_spent,
            avg_daily,
            days_passed,
            days_remaining,
            goals_projections: goals
                .iter()
                .filter(|goal| goal.current_amount < goal.goal_amount)
                .map(|goal| GoalProjection {
                    goal: goal.clone(),
                    remaining: goal.goal_amount - goal.current_amount,
                })
                .collect(),
        })
    }
}

pub struct ProjectionService;

impl ProjectionService {
    pub fn project(store: &dyn LedgerStore, owner: OwnerId, today: NaiveDate) -> CoreResult<Projection> {
        let period = Period::containing(today);
        let window = period.bounds().through(today);
        let expenses = store.expenses_between(owner, window)?;
        let goals = store.saving_goals(owner)?;
        Ok(Projection::from_run_rate(
            period,
            total_amount(&expenses)?,
            today.day(),
            &goals,
        )?)
    }
}
