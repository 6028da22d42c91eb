//! Manual deposits towards saving goals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use finledger_domain::{AmountOverflow, OwnerId, SavingGoal, SavingGoalTransaction};

use crate::{storage::LedgerStore, CoreError, CoreResult};

pub const MANUAL_CONTRIBUTION: &str = "Manual contribution";

/// Records manual deposits towards saving goals.
pub struct ContributionService;

impl ContributionService {
    /// Appends a contribution and bumps the goal's running total.
    ///
    /// The two writes are not atomic. When the total update fails the contribution row
    /// stays and the error is returned, leaving `current_amount` behind its history.
    pub fn add_funds(
        store: &dyn LedgerStore,
        owner: OwnerId,
        goal_id: Uuid,
        amount: Decimal,
        date: NaiveDate,
    ) -> CoreResult<SavingGoal> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "contribution must be positive, got {amount}"
            )));
        }
        let mut goal = store
            .saving_goals(owner)?
            .into_iter()
            .find(|goal| goal.id == goal_id)
            .ok_or(CoreError::GoalNotFound(goal_id))?;
        let updated = goal
            .current_amount
            .checked_add(amount)
            .ok_or(AmountOverflow)?;

        store.insert_contribution(
            SavingGoalTransaction::new(goal_id, amount, date).with_description(MANUAL_CONTRIBUTION),
        )?;

        if let Err(err) = store.set_goal_amount(goal_id, updated) {
            warn!(goal = %goal_id, error = %err, "contribution stored but goal total not updated");
            return Err(err.into());
        }
        goal.current_amount = updated;
        info!(goal = %goal_id, %amount, total = %updated, "contribution recorded");
        Ok(goal)
    }
}
